//! Traversal state threaded through recursive decoding.

use std::fmt;

use super::observer::Observer;
use super::{Outcome, ParseSummary};
use crate::config::{MAX_NESTING_DEPTH, PARAM_MAX_DEPTH};
use crate::error::Result;
use crate::event::NodeEvent;
use crate::manager::ParserManager;
use crate::params::Parameters;

/// Whether a traversal may continue after an emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Cancelled,
}

impl Flow {
    #[must_use]
    pub fn is_cancelled(self) -> bool {
        self == Flow::Cancelled
    }
}

/// Context passed to every decoder of one parse, including nested ones.
///
/// Owns the dispatch rules: observers run in registration order, the cancel
/// flag is checked after each of them, and a skipped container restricts
/// its descendants to the observers up to the one that skipped it.
pub struct TraversalContext<'a, 'o> {
    manager: &'a ParserManager,
    parameters: &'a Parameters,
    observers: &'a mut [Box<dyn Observer + 'o>],
    /// Observers (by prefix length) that receive events at this level.
    eligible: usize,
    depth: usize,
    nesting: usize,
    max_nesting: usize,
    emitted: usize,
    skipped: usize,
    cancelled: bool,
}

impl<'a, 'o> TraversalContext<'a, 'o> {
    pub(crate) fn new(
        manager: &'a ParserManager,
        parameters: &'a Parameters,
        observers: &'a mut [Box<dyn Observer + 'o>],
    ) -> Self {
        let max_nesting = parameters
            .get_uint(PARAM_MAX_DEPTH)
            .and_then(|d| usize::try_from(d).ok())
            .unwrap_or(MAX_NESTING_DEPTH);
        let eligible = observers.len();

        Self {
            manager,
            parameters,
            observers,
            eligible,
            depth: 0,
            nesting: 0,
            max_nesting,
            emitted: 0,
            skipped: 0,
            cancelled: false,
        }
    }

    /// Parameters attached to the parser, identical at every nesting level.
    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        self.parameters
    }

    /// Depth that the next emitted node will get.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn flow(&self) -> Flow {
        if self.cancelled {
            Flow::Cancelled
        } else {
            Flow::Continue
        }
    }

    /// Emit a leaf node.
    pub fn emit(&mut self, mut event: NodeEvent) -> Flow {
        if self.cancelled {
            return Flow::Cancelled;
        }
        self.dispatch(&mut event);
        self.flow()
    }

    /// Emit a container node, then run `body` for its children.
    ///
    /// Children are emitted one level deeper. `body` is not run when the
    /// container itself cancelled the traversal. Errors from `body` are
    /// returned unchanged.
    pub fn container<F>(&mut self, mut event: NodeEvent, body: F) -> Result<Flow>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        if self.cancelled {
            return Ok(Flow::Cancelled);
        }

        let child_eligible = self.dispatch(&mut event);
        if self.cancelled {
            return Ok(Flow::Cancelled);
        }

        let (eligible, depth) = (self.eligible, self.depth);
        self.eligible = child_eligible;
        self.depth += 1;
        let result = body(self);
        self.eligible = eligible;
        self.depth = depth;

        result?;
        Ok(self.flow())
    }

    /// Decode an embedded document with the decoder registered for `name`.
    ///
    /// Failures stay local: an unknown format, a decode error or exceeding
    /// the nesting limit is logged and the sub-document yields no further
    /// nodes. Cancellation raised inside is returned to the caller.
    pub fn parse_nested(&mut self, name: &str, document: &[u8]) -> Flow {
        if self.cancelled {
            return Flow::Cancelled;
        }

        if self.nesting >= self.max_nesting {
            tracing::warn!(
                document = %name,
                limit = self.max_nesting,
                "Nested document exceeds nesting limit, skipping"
            );
            return self.flow();
        }

        let manager = self.manager;
        let Some(decoder) = manager.decoder_for(name) else {
            tracing::debug!(document = %name, "No decoder for nested document, skipping");
            return self.flow();
        };

        tracing::debug!(
            document = %name,
            format = decoder.format(),
            nesting = self.nesting + 1,
            "Parsing nested document"
        );

        self.nesting += 1;
        let result = decoder.decode(document, self);
        self.nesting -= 1;

        if let Err(err) = result {
            tracing::warn!(
                error = %err,
                document = %name,
                format = decoder.format(),
                "Error decoding nested document, skipping"
            );
        }

        self.flow()
    }

    /// Deliver one event to the eligible observers.
    ///
    /// Returns how many observers the event's descendants go to.
    fn dispatch(&mut self, event: &mut NodeEvent) -> usize {
        event.place(self.depth, self.emitted);
        self.emitted += 1;

        let eligible = self.eligible.min(self.observers.len());
        let mut child_eligible = eligible;
        let mut skipped_at: Option<usize> = None;

        for (index, observer) in self.observers[..eligible].iter_mut().enumerate() {
            if skipped_at.is_some() && !observer.sees_skipped() {
                continue;
            }

            observer.on_node(event);

            if event.is_cancelled() {
                self.cancelled = true;
                break;
            }
            if skipped_at.is_none() && event.is_skipped() {
                skipped_at = Some(index);
                child_eligible = index + 1;
            }
        }

        if skipped_at.is_some() {
            self.skipped += 1;
        }
        child_eligible
    }

    pub(crate) fn summary(&self) -> ParseSummary {
        ParseSummary {
            outcome: if self.cancelled {
                Outcome::Cancelled
            } else {
                Outcome::Completed
            },
            events: self.emitted,
            skipped: self.skipped,
        }
    }
}

impl fmt::Debug for TraversalContext<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraversalContext")
            .field("observers", &self.observers.len())
            .field("eligible", &self.eligible)
            .field("depth", &self.depth)
            .field("nesting", &self.nesting)
            .field("emitted", &self.emitted)
            .field("cancelled", &self.cancelled)
            .finish()
    }
}
