//! Mail message decoder.
//!
//! Handles single RFC 822 messages with MIME bodies. Each message becomes a
//! `MailHeader` container; text parts become `Content` nodes and attachments
//! are handed back to the registry as nested documents.

use std::sync::LazyLock;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use chrono::DateTime;
use regex::Regex;

use super::extension_list;
use super::text::decode_text;
use crate::config::{MAX_MIME_DEPTH, PARAM_DATE_FROM, PARAM_DATE_TO};
use crate::error::{DocwalkError, Result};
use crate::event::{NodeEvent, Tag};
use crate::params::Parameters;
use crate::parser::{Decoder, Flow, TraversalContext};

/// Matches a `boundary` parameter, quoted or bare.
#[allow(clippy::expect_used)]
static BOUNDARY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)boundary\s*=\s*(?:"([^"]+)"|([^\s;]+))"#).expect("valid regex")
});

/// Matches a `filename` or `name` parameter, quoted or bare.
#[allow(clippy::expect_used)]
static FILENAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*(?:file)?name\s*=\s*(?:"([^"]*)"|([^\s;]+))"#)
        .expect("valid regex")
});

#[allow(clippy::expect_used)]
static HTML_TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b.*?</(script|style)\s*>|<[^>]*>").expect("valid regex")
});

/// Decoder for `message/rfc822` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct MailDecoder;

impl Decoder for MailDecoder {
    fn format(&self) -> &str {
        "mail"
    }

    fn extensions(&self) -> Vec<String> {
        extension_list(&["eml", "msg822"])
    }

    fn decode(&self, document: &[u8], ctx: &mut TraversalContext<'_, '_>) -> Result<()> {
        let message = MimePart::parse(document);
        let date = message.header("date").map_or(0, parse_mail_date);

        if !within_window(date, ctx.parameters()) {
            tracing::debug!(
                subject = message.header("subject").unwrap_or_default(),
                date,
                "Message outside date window, skipping"
            );
            return Ok(());
        }

        let header = NodeEvent::new(Tag::MailHeader)
            .with_attribute("subject", message.header("subject").unwrap_or_default())
            .with_attribute("from", message.header("from").unwrap_or_default())
            .with_attribute("to", message.header("to").unwrap_or_default())
            .with_attribute("date", date);

        ctx.container(header, |ctx| decode_part(&message, 0, ctx).map(|_| ()))?;
        Ok(())
    }
}

impl MailDecoder {
    /// Parse an RFC 2822 date into a Unix timestamp, 0 when unparseable.
    ///
    /// Trailing comments such as `(UTC)` are ignored.
    ///
    /// # Examples
    /// ```
    /// use docwalk::decoders::MailDecoder;
    ///
    /// assert_eq!(MailDecoder::parse_date("Mon, 1 Jan 2024 00:00:00 +0000 (UTC)"), 1704067200);
    /// assert_eq!(MailDecoder::parse_date("yesterday"), 0);
    /// ```
    #[must_use]
    pub fn parse_date(value: &str) -> u64 {
        parse_mail_date(value)
    }
}

fn parse_mail_date(value: &str) -> u64 {
    let value = value.split('(').next().unwrap_or(value).trim();
    DateTime::parse_from_rfc2822(value)
        .ok()
        .and_then(|date| u64::try_from(date.timestamp()).ok())
        .unwrap_or(0)
}

/// Check a message date against the inclusive `date_from`/`date_to` bounds.
fn within_window(date: u64, parameters: &Parameters) -> bool {
    let after_start = parameters
        .get_uint(PARAM_DATE_FROM)
        .map_or(true, |from| date >= from);
    let before_end = parameters
        .get_uint(PARAM_DATE_TO)
        .map_or(true, |to| date <= to);
    after_start && before_end
}

/// One MIME entity: unfolded headers plus the raw body.
struct MimePart<'d> {
    /// Header names lowercased, in order of appearance.
    headers: Vec<(String, String)>,
    body: &'d [u8],
}

impl<'d> MimePart<'d> {
    fn parse(bytes: &'d [u8]) -> Self {
        let (head, body) = split_head(bytes);
        let head = String::from_utf8_lossy(head);

        let mut headers: Vec<(String, String)> = Vec::new();
        for line in head.lines() {
            if line.starts_with([' ', '\t']) {
                if let Some((_, value)) = headers.last_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
            }
        }

        Self { headers, body }
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Lowercased media type, `text/plain` when absent.
    fn media_type(&self) -> String {
        self.header("content-type")
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "text/plain".to_string())
    }

    fn boundary(&self) -> Option<String> {
        let content_type = self.header("content-type")?;
        let captures = BOUNDARY_PATTERN.captures(content_type)?;
        captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str().to_string())
    }

    /// Attachment file name from `Content-Disposition` or `Content-Type`.
    fn filename(&self) -> Option<String> {
        ["content-disposition", "content-type"]
            .iter()
            .filter_map(|name| self.header(name))
            .filter_map(|value| FILENAME_PATTERN.captures(value))
            .filter_map(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().trim().to_string())
            .find(|name| !name.is_empty())
    }

    /// Body bytes with the transfer encoding removed.
    fn decoded_body(&self) -> Result<Vec<u8>> {
        let encoding = self
            .header("content-transfer-encoding")
            .map(|v| v.trim().to_ascii_lowercase())
            .unwrap_or_default();

        match encoding.as_str() {
            "base64" => {
                let compact: Vec<u8> = self
                    .body
                    .iter()
                    .copied()
                    .filter(|b| !b.is_ascii_whitespace())
                    .collect();
                BASE64_STANDARD
                    .decode(compact)
                    .map_err(|e| DocwalkError::decode("mail", format!("invalid base64 body: {e}")))
            }
            "quoted-printable" => Ok(decode_quoted_printable(self.body)),
            _ => Ok(self.body.to_vec()),
        }
    }
}

/// Split a message into header block and body at the first empty line.
fn split_head(bytes: &[u8]) -> (&[u8], &[u8]) {
    let mut start = 0;
    while start < bytes.len() {
        let end = bytes[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map(|p| start + p);
        let line = &bytes[start..end.unwrap_or(bytes.len())];
        if line.is_empty() || line == b"\r" {
            let body_start = end.map_or(bytes.len(), |e| e + 1);
            return (&bytes[..start], &bytes[body_start..]);
        }
        match end {
            Some(e) => start = e + 1,
            None => break,
        }
    }
    (bytes, &[])
}

/// Split a multipart body into its parts, dropping preamble and epilogue.
fn split_multipart<'d>(body: &'d [u8], boundary: &str) -> Vec<&'d [u8]> {
    let delimiter = format!("--{boundary}");
    let close = format!("--{boundary}--");

    let mut parts = Vec::new();
    let mut current: Option<usize> = None;
    let mut start = 0;
    while start < body.len() {
        let end = body[start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |p| start + p);
        let line = body[start..end].trim_ascii_end();
        let next = (end + 1).min(body.len());

        let is_close = line == close.as_bytes();
        if is_close || line == delimiter.as_bytes() {
            if let Some(part_start) = current.take() {
                parts.push(strip_line_break(&body[part_start..start]));
            }
            if is_close {
                return parts;
            }
            current = Some(next);
        }
        start = next;
    }

    if let Some(part_start) = current {
        parts.push(&body[part_start..]);
    }
    parts
}

/// Drop the line break that belongs to the following boundary line.
fn strip_line_break(part: &[u8]) -> &[u8] {
    let part = part.strip_suffix(b"\n").unwrap_or(part);
    part.strip_suffix(b"\r").unwrap_or(part)
}

fn decode_quoted_printable(input: &[u8]) -> Vec<u8> {
    fn hex(b: &u8) -> Option<u8> {
        char::from(*b).to_digit(16).and_then(|d| u8::try_from(d).ok())
    }

    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'=' {
            match (input.get(i + 1), input.get(i + 2)) {
                // soft line break
                (Some(b'\n'), _) => {
                    i += 2;
                    continue;
                }
                (Some(b'\r'), Some(b'\n')) => {
                    i += 3;
                    continue;
                }
                (Some(high), Some(low)) => {
                    if let (Some(high), Some(low)) = (hex(high), hex(low)) {
                        out.push((high << 4) | low);
                        i += 3;
                        continue;
                    }
                }
                _ => {}
            }
        }
        out.push(input[i]);
        i += 1;
    }
    out
}

/// Strip markup from an HTML body, keeping its text.
fn html_to_text(html: &str) -> String {
    let stripped = HTML_TAG_PATTERN.replace_all(html, " ");
    let decoded = html_escape::decode_html_entities(&stripped);
    decoded
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Body bytes of a part, or `None` after logging when they cannot be decoded.
fn part_body(part: &MimePart<'_>, media_type: &str) -> Option<Vec<u8>> {
    match part.decoded_body() {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            tracing::warn!(error = %err, media_type = %media_type, "Undecodable mail part, skipping");
            None
        }
    }
}

/// Emit one MIME entity; `level` counts the enclosing `multipart/*` bodies.
fn decode_part(
    part: &MimePart<'_>,
    level: usize,
    ctx: &mut TraversalContext<'_, '_>,
) -> Result<Flow> {
    let media_type = part.media_type();

    if media_type.starts_with("multipart/") {
        if level >= MAX_MIME_DEPTH {
            tracing::warn!(
                media_type = %media_type,
                limit = MAX_MIME_DEPTH,
                "Multipart body exceeds nesting limit, skipping"
            );
            return Ok(Flow::Continue);
        }
        let Some(boundary) = part.boundary() else {
            tracing::debug!(media_type = %media_type, "Multipart body without boundary, skipping");
            return Ok(Flow::Continue);
        };
        let parts: Vec<MimePart<'_>> = split_multipart(part.body, &boundary)
            .into_iter()
            .map(MimePart::parse)
            .collect();

        if media_type == "multipart/alternative" {
            let preferred = parts
                .iter()
                .find(|p| p.media_type() == "text/plain")
                .or_else(|| parts.last());
            return match preferred {
                Some(p) => decode_part(p, level + 1, ctx),
                None => Ok(Flow::Continue),
            };
        }

        for sub in &parts {
            if decode_part(sub, level + 1, ctx)?.is_cancelled() {
                return Ok(Flow::Cancelled);
            }
        }
        return Ok(Flow::Continue);
    }

    if let Some(name) = part.filename() {
        let bytes = part_body(part, &media_type);
        let size = bytes.as_ref().map_or(0, Vec::len);
        let event = NodeEvent::new(Tag::Attachment)
            .with_attribute("name", name.as_str())
            .with_attribute("content_type", media_type.as_str())
            .with_attribute("size", size as u64);
        return ctx.container(event, |ctx| {
            if let Some(bytes) = bytes {
                ctx.parse_nested(&name, &bytes);
            }
            Ok(())
        });
    }

    if media_type == "message/rfc822" {
        return Ok(match part_body(part, &media_type) {
            Some(bytes) => ctx.parse_nested("message.eml", &bytes),
            None => Flow::Continue,
        });
    }

    if media_type.starts_with("text/") {
        let Some(bytes) = part_body(part, &media_type) else {
            return Ok(Flow::Continue);
        };
        let raw = decode_text(&bytes);
        let text = if media_type == "text/html" {
            html_to_text(&raw)
        } else {
            raw
        };
        if text.is_empty() {
            return Ok(Flow::Continue);
        }
        return Ok(ctx.emit(
            NodeEvent::new(Tag::Content)
                .with_text(text)
                .with_attribute("content_type", media_type.as_str()),
        ));
    }

    tracing::debug!(media_type = %media_type, "Inline part without file name, skipping");
    Ok(Flow::Continue)
}
