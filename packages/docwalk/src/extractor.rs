//! One-call plain text extraction.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::DEFAULT_WRAP_WIDTH;
use crate::error::Result;
use crate::event::NodeEvent;
use crate::manager::ParserManager;
use crate::params::Parameters;
use crate::pipeline::{Exporter, Fragment, Importer, Input, Transformer};
use crate::writer::TextWriter;

enum Source {
    File(PathBuf),
    Bytes { name: String, bytes: Vec<u8> },
}

/// Extracts the text of one document through a one-shot chain.
///
/// # Examples
/// ```
/// use docwalk::SimpleExtractor;
///
/// let text = SimpleExtractor::from_bytes("note.txt", "Hello\nworld\n")
///     .extract()
///     .unwrap();
/// assert_eq!(text, "Hello\nworld\n");
/// ```
pub struct SimpleExtractor {
    source: Source,
    manager: Option<Arc<ParserManager>>,
    parameters: Parameters,
    filter: Option<Box<dyn Fn(&NodeEvent) -> bool>>,
    wrap_width: usize,
}

impl SimpleExtractor {
    /// Extractor for a file; its name selects the format.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_source(Source::File(path.into()))
    }

    /// Extractor for in-memory data.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::with_source(Source::Bytes {
            name: name.into(),
            bytes: bytes.into(),
        })
    }

    fn with_source(source: Source) -> Self {
        Self {
            source,
            manager: None,
            parameters: Parameters::new(),
            filter: None,
            wrap_width: DEFAULT_WRAP_WIDTH,
        }
    }

    /// Use this registry instead of the built-in one.
    #[must_use]
    pub fn with_manager(mut self, manager: Arc<ParserManager>) -> Self {
        self.manager = Some(manager);
        self
    }

    /// Skip events (and their subtrees) for which `predicate` returns true.
    #[must_use]
    pub fn with_filter(mut self, predicate: impl Fn(&NodeEvent) -> bool + 'static) -> Self {
        self.filter = Some(Box::new(predicate));
        self
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    #[must_use]
    pub fn with_wrap_width(mut self, width: usize) -> Self {
        self.wrap_width = width;
        self
    }

    /// Run the extraction and return the text, one line per text node.
    ///
    /// # Errors
    /// Returns an IO error if the file cannot be read, `FormatNotSupported`
    /// for unknown formats and `DecodeFailure` for malformed documents.
    pub fn extract(self) -> Result<String> {
        let input = match self.source {
            Source::File(path) => Input::from_file(path)?,
            Source::Bytes { name, bytes } => Input::from_bytes(name, bytes),
        };
        let manager = self
            .manager
            .unwrap_or_else(|| Arc::new(ParserManager::with_builtin()));
        let transformer = match self.filter {
            Some(predicate) => Transformer::filter(predicate),
            None => Transformer::pass_through(),
        };
        let (exporter, buffer) = Exporter::to_buffer(TextWriter::new().with_wrap(self.wrap_width));

        Fragment::new(Importer::new(manager).with_parameters(self.parameters))
            .with_input(input)
            .then(transformer)
            .connect(exporter)?;

        Ok(buffer.to_string_lossy())
    }
}
