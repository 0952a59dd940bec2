//! HTML writer.

use std::io::{self, Write};

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::Writer;
use crate::event::NodeEvent;

/// Writes events as nested `<section>` elements.
///
/// A section stays open until an event at the same or a lower depth
/// arrives, so sections nest the way the document does.
#[derive(Debug, Clone)]
pub struct HtmlWriter {
    title: String,
    /// Depths of the currently open sections, innermost last.
    open: Vec<usize>,
}

impl HtmlWriter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            title: "docwalk".to_string(),
            open: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    fn close_to(&mut self, depth: usize, sink: &mut dyn Write) -> io::Result<()> {
        while self.open.last().is_some_and(|&open| open >= depth) {
            self.open.pop();
            writeln!(sink, "</section>")?;
        }
        Ok(())
    }
}

impl Default for HtmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer for HtmlWriter {
    fn name(&self) -> &str {
        "html"
    }

    fn write_header(&mut self, sink: &mut dyn Write) -> io::Result<()> {
        self.open.clear();
        writeln!(sink, "<!DOCTYPE html>")?;
        writeln!(sink, "<html>")?;
        writeln!(sink, "<head>")?;
        writeln!(sink, "<meta charset=\"utf-8\"/>")?;
        writeln!(sink, "<title>{}</title>", encode_text(&self.title))?;
        writeln!(sink, "</head>")?;
        writeln!(sink, "<body>")
    }

    fn write(&mut self, event: &NodeEvent, sink: &mut dyn Write) -> io::Result<()> {
        self.close_to(event.depth(), sink)?;

        writeln!(
            sink,
            "<section class=\"{}\">",
            encode_double_quoted_attribute(event.tag().as_str())
        )?;
        self.open.push(event.depth());

        let heading = [event.string_attribute("subject"), event.string_attribute("name")]
            .into_iter()
            .find(|h| !h.is_empty());
        if let Some(heading) = heading {
            let level = (event.depth() + 1).min(6);
            writeln!(sink, "<h{level}>{}</h{level}>", encode_text(heading))?;
        }

        let text = event.text();
        if !text.is_empty() {
            if text.contains('\n') {
                writeln!(sink, "<pre>{}</pre>", encode_text(text))?;
            } else {
                writeln!(sink, "<p>{}</p>", encode_text(text))?;
            }
        }
        Ok(())
    }

    fn write_footer(&mut self, sink: &mut dyn Write) -> io::Result<()> {
        self.close_to(0, sink)?;
        writeln!(sink, "</body>")?;
        writeln!(sink, "</html>")
    }
}
