//! Mbox mailbox decoder.

use super::extension_list;
use crate::error::Result;
use crate::parser::{Decoder, TraversalContext};

/// Decoder splitting a mailbox into messages parsed as nested mail documents.
///
/// Messages start at lines beginning with `From `. Lines quoted as
/// `>From ` (mboxrd) lose one `>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MboxDecoder;

impl Decoder for MboxDecoder {
    fn format(&self) -> &str {
        "mbox"
    }

    fn extensions(&self) -> Vec<String> {
        extension_list(&["mbox", "mbx"])
    }

    fn decode(&self, document: &[u8], ctx: &mut TraversalContext<'_, '_>) -> Result<()> {
        let messages = split_messages(document);
        tracing::debug!(messages = messages.len(), "Split mailbox");

        for (index, message) in messages.iter().enumerate() {
            let name = format!("message-{}.eml", index + 1);
            if ctx.parse_nested(&name, message).is_cancelled() {
                break;
            }
        }
        Ok(())
    }
}

/// Split a mailbox into message bytes without their separator lines.
///
/// Content before the first separator is treated as a message of its own
/// when it is not blank, so a lone message without envelope still parses.
fn split_messages(document: &[u8]) -> Vec<Vec<u8>> {
    let mut messages: Vec<Vec<u8>> = Vec::new();
    let mut current: Vec<u8> = Vec::new();
    let mut started = false;

    for line in document.split_inclusive(|&b| b == b'\n') {
        if line.starts_with(b"From ") {
            if started || !current.trim_ascii().is_empty() {
                messages.push(finish(std::mem::take(&mut current)));
            }
            started = true;
            continue;
        }

        let unquoted_from = line.starts_with(b">")
            && line.iter().skip_while(|&&b| b == b'>').take(5).eq(b"From ".iter());
        if unquoted_from {
            current.extend_from_slice(&line[1..]);
        } else {
            current.extend_from_slice(line);
        }
    }

    if started || !current.trim_ascii().is_empty() {
        messages.push(finish(current));
    }
    messages
}

/// Drop the blank line that separates a message from the next envelope.
fn finish(mut message: Vec<u8>) -> Vec<u8> {
    if message.ends_with(b"\n\n") {
        message.pop();
    } else if message.ends_with(b"\r\n\r\n") {
        message.truncate(message.len() - 2);
    }
    message
}
