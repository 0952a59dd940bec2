//! Document traversal.
//!
//! A [`Parser`] couples one [`Decoder`] with the observers and parameters of
//! a single traversal. Parsing is synchronous: [`Parser::parse`] walks the
//! whole document depth-first, pre-order, and returns once it is done or an
//! observer cancelled it.

mod context;
mod decoder;
mod observer;

pub use context::{Flow, TraversalContext};
pub use decoder::Decoder;
pub use observer::Observer;

use std::fmt;
use std::sync::Arc;

use crate::error::{DocwalkError, Result};
use crate::event::{NodeEvent, Tag};
use crate::manager::ParserManager;
use crate::params::Parameters;

/// How a traversal ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every node was visited.
    Completed,
    /// An observer cancelled the traversal.
    Cancelled,
}

/// Result of one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseSummary {
    pub outcome: Outcome,
    /// Number of node events emitted, including skipped ones.
    pub events: usize,
    /// Number of node events skipped by an observer.
    pub skipped: usize,
}

impl ParseSummary {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.outcome == Outcome::Cancelled
    }
}

/// Parser for one document format, created by
/// [`ParserManager::get_parser_by_extension`].
pub struct Parser<'a> {
    manager: &'a ParserManager,
    decoder: Arc<dyn Decoder>,
    name: String,
    observers: Vec<Box<dyn Observer + 'a>>,
    parameters: Parameters,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        manager: &'a ParserManager,
        decoder: Arc<dyn Decoder>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            manager,
            decoder,
            name: name.into(),
            observers: Vec::new(),
            parameters: Parameters::new(),
        }
    }

    /// Document name the parser was resolved for.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Format identifier of the underlying decoder.
    #[must_use]
    pub fn format(&self) -> &str {
        self.decoder.format()
    }

    /// Register an observer, invoked once per node after those registered earlier.
    pub fn add_callback_on_new_node(&mut self, observer: impl Observer + 'a) {
        self.observers.push(Box::new(observer));
    }

    /// Register an already boxed observer.
    pub fn add_boxed_observer(&mut self, observer: Box<dyn Observer + 'a>) {
        self.observers.push(observer);
    }

    /// Attach parameters, replacing any attached before.
    ///
    /// The same parameters are visible to every nested sub-parse.
    pub fn add_parameters(&mut self, parameters: Parameters) {
        self.parameters = parameters;
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Traverse a document.
    ///
    /// The root node is a [`Tag::Document`] container with `name`, `format`
    /// and `size` attributes; everything the decoder emits is nested under
    /// it. Cancellation is reported in the summary, not as an error.
    ///
    /// # Errors
    /// Returns `DecodeFailure` if the document cannot be decoded. Events
    /// emitted before the failure have already been delivered.
    pub fn parse(&mut self, document: &[u8]) -> Result<ParseSummary> {
        let decoder = Arc::clone(&self.decoder);
        let root = NodeEvent::new(Tag::Document)
            .with_attribute("name", self.name.as_str())
            .with_attribute("format", decoder.format())
            .with_attribute("size", document.len() as u64);

        let mut ctx = TraversalContext::new(self.manager, &self.parameters, &mut self.observers);
        let result = ctx.container(root, |ctx| decoder.decode(document, ctx));
        let summary = ctx.summary();

        match result {
            Ok(_) => {
                tracing::debug!(
                    document = %self.name,
                    format = decoder.format(),
                    events = summary.events,
                    skipped = summary.skipped,
                    cancelled = summary.is_cancelled(),
                    "Parse finished"
                );
                Ok(summary)
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    document = %self.name,
                    format = decoder.format(),
                    events = summary.events,
                    "Parse failed"
                );
                Err(match err {
                    failure @ DocwalkError::DecodeFailure { .. } => failure,
                    other => DocwalkError::decode(decoder.format(), other.to_string()),
                })
            }
        }
    }
}

impl fmt::Debug for Parser<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("name", &self.name)
            .field("format", &self.decoder.format())
            .field("observers", &self.observers.len())
            .field("parameters", &self.parameters)
            .finish()
    }
}

#[cfg(test)]
mod tests;
