//! Byte sources bound to a chain.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// A named document ready to be parsed.
///
/// The name selects the decoder. Contents are loaded once and shared
/// between clones, so one input can feed several chains.
#[derive(Clone)]
pub struct Input {
    name: String,
    format: Option<String>,
    bytes: Arc<[u8]>,
}

impl Input {
    /// Read a file; its file name selects the format.
    ///
    /// # Errors
    /// Returns an IO error if the file cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        tracing::debug!(path = %path.display(), size = bytes.len(), "Loaded input file");
        Ok(Self::from_bytes(name, bytes))
    }

    /// Drain an open reader into memory.
    ///
    /// # Errors
    /// Returns an IO error if reading fails.
    pub fn from_reader(name: impl Into<String>, mut reader: impl Read) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(Self::from_bytes(name, bytes))
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let bytes: Vec<u8> = bytes.into();
        Self {
            name: name.into(),
            format: None,
            bytes: Arc::from(bytes),
        }
    }

    /// Resolve the decoder by `extension` instead of the name.
    #[must_use]
    pub fn with_format(mut self, extension: impl Into<String>) -> Self {
        self.format = Some(extension.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name used for decoder lookup.
    #[must_use]
    pub fn lookup_name(&self) -> &str {
        self.format.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Input")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}
