//! Plain text writer.

use std::io::{self, Write};

use textwrap::{fill, Options};

use super::Writer;
use crate::config::DEFAULT_WRAP_WIDTH;
use crate::event::NodeEvent;

/// Writes the text of each event followed by a newline.
///
/// Events without text produce no output.
#[derive(Debug, Clone)]
pub struct TextWriter {
    /// Wrap width in columns; 0 disables wrapping.
    width: usize,
}

impl TextWriter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            width: DEFAULT_WRAP_WIDTH,
        }
    }

    /// Wrap each line of text at `width` columns (0 disables wrapping).
    #[must_use]
    pub fn with_wrap(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    fn render(&self, text: &str) -> String {
        if self.width == 0 {
            return text.to_string();
        }
        text.lines()
            .map(|line| fill(line, Options::new(self.width)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for TextWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer for TextWriter {
    fn name(&self) -> &str {
        "text"
    }

    fn write(&mut self, event: &NodeEvent, sink: &mut dyn Write) -> io::Result<()> {
        if event.text().is_empty() {
            return Ok(());
        }
        writeln!(sink, "{}", self.render(event.text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Tag;

    fn render(writer: &mut TextWriter, events: &[NodeEvent]) -> String {
        let mut out = Vec::new();
        writer.write_header(&mut out).unwrap();
        for event in events {
            writer.write(event, &mut out).unwrap();
        }
        writer.write_footer(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_text_lines() {
        let events = [
            NodeEvent::new(Tag::Document),
            NodeEvent::new(Tag::Content).with_text("Hello A"),
            NodeEvent::new(Tag::MailHeader).with_attribute("subject", "ignored"),
            NodeEvent::new(Tag::Content).with_text("Hello B"),
        ];
        assert_eq!(render(&mut TextWriter::new(), &events), "Hello A\nHello B\n");
    }

    #[test]
    fn test_wrapping() {
        let events = [NodeEvent::new(Tag::Content).with_text("one two three four\nfive")];
        assert_eq!(
            render(&mut TextWriter::new().with_wrap(9), &events),
            "one two\nthree\nfour\nfive\n"
        );
    }
}
