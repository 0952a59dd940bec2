//! Serialization of node event streams.
//!
//! A [`Writer`] turns the events that survive a traversal into an output
//! format. Each run is framed by [`Writer::write_header`] and
//! [`Writer::write_footer`]; the footer closes whatever the body opened, so
//! output stays well-formed when a run is cancelled or fails half-way.

mod html;
mod text;

pub use html::HtmlWriter;
pub use text::TextWriter;

use std::io::{self, Write};

use crate::event::NodeEvent;

/// Output format serializer.
///
/// Writers are terminal observers: the exporter driving them only passes
/// events no observer skipped.
pub trait Writer {
    /// Short identifier used in error messages.
    fn name(&self) -> &str;

    /// Write the document preamble and reset per-run state.
    fn write_header(&mut self, _sink: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }

    /// Write one event.
    fn write(&mut self, event: &NodeEvent, sink: &mut dyn Write) -> io::Result<()>;

    /// Close everything still open.
    fn write_footer(&mut self, _sink: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }
}

impl<W: Writer + ?Sized> Writer for Box<W> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn write_header(&mut self, sink: &mut dyn Write) -> io::Result<()> {
        (**self).write_header(sink)
    }

    fn write(&mut self, event: &NodeEvent, sink: &mut dyn Write) -> io::Result<()> {
        (**self).write(event, sink)
    }

    fn write_footer(&mut self, sink: &mut dyn Write) -> io::Result<()> {
        (**self).write_footer(sink)
    }
}
