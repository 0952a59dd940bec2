//! XML decoder built on roxmltree.

use roxmltree::{Document, Node, ParsingOptions};

use super::extension_list;
use crate::config::MAX_ELEMENT_DEPTH;
use crate::error::{DocwalkError, Result};
use crate::event::{NodeEvent, Tag};
use crate::parser::{Decoder, Flow, TraversalContext};

/// Decoder emitting one `Element` container per XML element.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlDecoder;

impl Decoder for XmlDecoder {
    fn format(&self) -> &str {
        "xml"
    }

    fn extensions(&self) -> Vec<String> {
        extension_list(&["xml", "xhtml", "svg"])
    }

    fn decode(&self, document: &[u8], ctx: &mut TraversalContext<'_, '_>) -> Result<()> {
        let text = std::str::from_utf8(document)
            .map_err(|e| DocwalkError::decode("xml", format!("not UTF-8: {e}")))?;

        let mut options = ParsingOptions::default();
        options.allow_dtd = true;
        let doc = Document::parse_with_options(text, options)?;

        walk_element(doc.root_element(), 1, ctx)?;
        Ok(())
    }
}

impl XmlDecoder {
    /// Get the tag name without namespace prefix.
    ///
    /// # Examples
    /// ```
    /// use roxmltree::Document;
    /// use docwalk::decoders::XmlDecoder;
    ///
    /// let doc = Document::parse(r#"<a:root xmlns:a="urn:x"/>"#).unwrap();
    /// assert_eq!(XmlDecoder::element_name(doc.root_element()), "root");
    /// ```
    #[must_use]
    pub fn element_name<'a>(node: Node<'a, '_>) -> &'a str {
        node.tag_name().name()
    }
}

/// Text directly inside `node`, trimmed, with text runs joined by a space.
fn own_text(node: Node<'_, '_>) -> String {
    node.children()
        .filter(Node::is_text)
        .filter_map(|child| child.text())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Emit `node` and its element children; `level` is 1 for the root element.
fn walk_element(
    node: Node<'_, '_>,
    level: usize,
    ctx: &mut TraversalContext<'_, '_>,
) -> Result<Flow> {
    if level > MAX_ELEMENT_DEPTH {
        tracing::warn!(
            element = XmlDecoder::element_name(node),
            limit = MAX_ELEMENT_DEPTH,
            "XML element exceeds depth limit, skipping subtree"
        );
        return Ok(Flow::Continue);
    }

    let mut event = NodeEvent::new(Tag::Element)
        .with_attribute("element", XmlDecoder::element_name(node))
        .with_text(own_text(node));
    for attribute in node.attributes() {
        event = event.with_attribute(&format!("@{}", attribute.name()), attribute.value());
    }

    ctx.container(event, |ctx| {
        for child in node.children().filter(Node::is_element) {
            if walk_element(child, level + 1, ctx)?.is_cancelled() {
                break;
            }
        }
        Ok(())
    })
}
