//! Decoder trait definition.

use super::context::TraversalContext;
use crate::error::Result;

/// Per-format decoder.
///
/// Decoders turn the bytes of one document into node events through the
/// [`TraversalContext`]. They emit leaf nodes with
/// [`TraversalContext::emit`], wrap subtrees with
/// [`TraversalContext::container`], and hand embedded documents back to the
/// registry with [`TraversalContext::parse_nested`].
///
/// A decoder must return as soon as the context reports cancellation and
/// must return `Ok(())` in that case. `Err` is reserved for documents it
/// cannot read.
pub trait Decoder: Send + Sync {
    /// Format identifier (e.g. "mail", "zip").
    fn format(&self) -> &str;

    /// Lowercase file extensions handled by this decoder, without dot.
    fn extensions(&self) -> Vec<String>;

    /// Decode one document.
    ///
    /// # Arguments
    /// * `document` - Raw document bytes
    /// * `ctx` - Traversal state shared with every nested sub-parse
    fn decode(&self, document: &[u8], ctx: &mut TraversalContext<'_, '_>) -> Result<()>;
}
