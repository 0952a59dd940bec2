//! Plain text decoder.

use unicode_normalization::UnicodeNormalization;

use super::extension_list;
use crate::error::Result;
use crate::event::{NodeEvent, Tag};
use crate::parser::{Decoder, TraversalContext};

/// Decoder emitting the whole document as one content node.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDecoder;

impl Decoder for TextDecoder {
    fn format(&self) -> &str {
        "text"
    }

    fn extensions(&self) -> Vec<String> {
        extension_list(&["txt", "text", "log", "md", "csv"])
    }

    fn decode(&self, document: &[u8], ctx: &mut TraversalContext<'_, '_>) -> Result<()> {
        let text = decode_text(document);
        if text.is_empty() {
            return Ok(());
        }

        let lines = text.lines().count() as u64;
        ctx.emit(
            NodeEvent::new(Tag::Content)
                .with_text(text)
                .with_attribute("lines", lines),
        );
        Ok(())
    }
}

/// Decode bytes as UTF-8 text.
///
/// Invalid sequences are replaced, a byte order mark is dropped, line
/// endings become `\n`, the result is NFC-normalized and trailing
/// whitespace is trimmed.
///
/// # Examples
/// ```
/// use docwalk::decoders::decode_text;
///
/// assert_eq!(decode_text(b"\xEF\xBB\xBFline one\r\nline two\r\n"), "line one\nline two");
/// assert_eq!(decode_text("Cafe\u{301}".as_bytes()), "Caf\u{e9}");
/// ```
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let raw = String::from_utf8_lossy(bytes);
    let unified = raw.replace("\r\n", "\n");
    let normalized: String = unified.nfc().collect();
    normalized.trim_end().to_string()
}
