//! Terminal stages writing events through a [`Writer`].

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use crate::error::{DocwalkError, Result};
use crate::event::NodeEvent;
use crate::parser::Observer;
use crate::writer::Writer;

/// When an exporter writes its header and footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// Header and footer around every run.
    #[default]
    PerRun,
    /// Header before the first run, footer on [`Exporter::close`].
    ///
    /// Lets several runs (one per input) share one output document.
    Session,
}

struct ExporterState {
    writer: Box<dyn Writer>,
    sink: Box<dyn Write>,
    framing: Framing,
    header_written: bool,
    /// First I/O error of the current run.
    error: Option<io::Error>,
    written: usize,
}

impl ExporterState {
    fn record(&mut self, result: io::Result<()>) {
        if let Err(err) = result {
            if self.error.is_none() {
                tracing::warn!(error = %err, writer = self.writer.name(), "Export write failed");
                self.error = Some(err);
            }
        }
    }

    fn write_header(&mut self) {
        let result = self.writer.write_header(&mut self.sink);
        self.record(result);
        self.header_written = true;
    }

    fn write_footer(&mut self) {
        let result = self
            .writer
            .write_footer(&mut self.sink)
            .and_then(|()| self.sink.flush());
        self.record(result);
        self.header_written = false;
    }

    fn take_error(&mut self) -> Result<()> {
        match self.error.take() {
            Some(source) => Err(DocwalkError::Export {
                writer: self.writer.name().to_string(),
                source,
            }),
            None => Ok(()),
        }
    }
}

/// Shared handle to a writer and its output sink.
///
/// Skipped events never reach the writer. The first write error is kept,
/// cancels the run and is reported when the run finishes.
#[derive(Clone)]
pub struct Exporter {
    state: Rc<RefCell<ExporterState>>,
}

impl Exporter {
    pub fn new(writer: impl Writer + 'static, sink: impl Write + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(ExporterState {
                writer: Box::new(writer),
                sink: Box::new(sink),
                framing: Framing::PerRun,
                header_written: false,
                error: None,
                written: 0,
            })),
        }
    }

    /// Exporter writing into a fresh in-memory buffer.
    pub fn to_buffer(writer: impl Writer + 'static) -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::new();
        (Self::new(writer, buffer.clone()), buffer)
    }

    #[must_use]
    pub fn with_framing(self, framing: Framing) -> Self {
        self.state.borrow_mut().framing = framing;
        self
    }

    /// Number of events written so far, over all runs.
    #[must_use]
    pub fn events_written(&self) -> usize {
        self.state.borrow().written
    }

    /// Write the footer of a [`Framing::Session`] exporter and flush.
    ///
    /// Does nothing when no header is pending.
    ///
    /// # Errors
    /// Returns `Export` if writing fails.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.header_written {
            state.write_footer();
        }
        state.take_error()
    }

    pub(crate) fn begin_run(&self) {
        let mut state = self.state.borrow_mut();
        state.error = None;
        if state.framing == Framing::PerRun || !state.header_written {
            state.write_header();
        }
    }

    pub(crate) fn finish_run(&self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.framing == Framing::PerRun {
            state.write_footer();
        } else {
            let result = state.sink.flush();
            state.record(result);
        }
        state.take_error()
    }

    /// Observer feeding this exporter, for one run.
    pub(crate) fn observer(&self) -> Box<dyn Observer> {
        Box::new(ExportObserver(self.clone()))
    }
}

impl fmt::Debug for Exporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_borrow() {
            Ok(state) => f
                .debug_struct("Exporter")
                .field("writer", &state.writer.name())
                .field("framing", &state.framing)
                .field("written", &state.written)
                .finish(),
            Err(_) => f.debug_struct("Exporter").finish_non_exhaustive(),
        }
    }
}

struct ExportObserver(Exporter);

impl Observer for ExportObserver {
    fn on_node(&mut self, event: &mut NodeEvent) {
        if event.is_skipped() {
            return;
        }
        let Ok(mut guard) = self.0.state.try_borrow_mut() else {
            tracing::warn!("Exporter re-entered while writing, ignoring event");
            return;
        };
        let state = &mut *guard;
        if state.error.is_some() {
            return;
        }

        let result = state.writer.write(event, &mut state.sink);
        match result {
            Ok(()) => state.written += 1,
            Err(err) => {
                state.record(Err(err));
                event.set_cancel();
            }
        }
    }
}

/// In-memory sink whose contents stay readable after the exporter used it.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl SharedBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contents(&self) -> Vec<u8> {
        self.bytes.borrow().clone()
    }

    /// Contents as UTF-8, invalid sequences replaced.
    #[must_use]
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.bytes.borrow_mut().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.borrow().is_empty()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
