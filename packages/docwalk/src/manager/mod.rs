//! Decoder registry keyed by file extension.
//!
//! The manager maps lowercase file extensions to decoders and hands out
//! [`Parser`]s for document names. It is read-only once built and can be
//! shared between threads behind an `Arc`.

mod plugin;

pub use plugin::{ExternalDecoder, PluginManifest};

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::config::normalize_extension;
use crate::decoders::{MailDecoder, MboxDecoder, TextDecoder, XmlDecoder, ZipDecoder};
use crate::error::Result;
use crate::parser::{Decoder, Parser};

/// Registry mapping file extensions to decoders.
pub struct ParserManager {
    decoders: HashMap<String, Arc<dyn Decoder>>,
    /// Format identifiers in registration order.
    formats: Vec<String>,
}

impl ParserManager {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            decoders: HashMap::new(),
            formats: Vec::new(),
        }
    }

    /// Create a registry with the built-in decoders.
    #[must_use]
    pub fn with_builtin() -> Self {
        let mut manager = Self::new();
        manager.register(TextDecoder);
        manager.register(XmlDecoder);
        manager.register(MailDecoder);
        manager.register(MboxDecoder);
        manager.register(ZipDecoder);
        manager
    }

    /// Create a registry with the built-in decoders plus every plugin
    /// manifest found in `dir`.
    ///
    /// # Errors
    /// Returns an IO error if the directory cannot be read. Individual
    /// invalid manifests are logged and skipped.
    pub fn with_plugin_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let mut manager = Self::with_builtin();
        manager.load_plugins(dir)?;
        Ok(manager)
    }

    /// Register plugin decoders from a directory; returns how many loaded.
    ///
    /// # Errors
    /// Returns an IO error if the directory cannot be read.
    pub fn load_plugins(&mut self, dir: impl AsRef<Path>) -> Result<usize> {
        let decoders = plugin::load_plugin_dir(dir.as_ref())?;
        let count = decoders.len();
        for decoder in decoders {
            self.register(decoder);
        }
        tracing::debug!(dir = %dir.as_ref().display(), count, "Loaded plugin decoders");
        Ok(count)
    }

    /// Register a decoder for each of its extensions.
    ///
    /// An extension already claimed by another decoder is taken over.
    pub fn register(&mut self, decoder: impl Decoder + 'static) {
        self.register_shared(Arc::new(decoder));
    }

    /// Register a shared decoder.
    pub fn register_shared(&mut self, decoder: Arc<dyn Decoder>) {
        let format = decoder.format().to_string();
        for extension in decoder.extensions() {
            let key = normalize_extension(&extension);
            if let Some(previous) = self.decoders.insert(key.clone(), Arc::clone(&decoder)) {
                if previous.format() != format {
                    tracing::debug!(
                        extension = %key,
                        previous = previous.format(),
                        format = %format,
                        "Extension taken over by another decoder"
                    );
                }
            }
        }
        if !self.formats.contains(&format) {
            self.formats.push(format);
        }
    }

    /// Create a parser for a document name, extension or `.extension`.
    ///
    /// Matching is case-insensitive on the suffix after the last dot.
    /// Returns `None` when no decoder is registered for it.
    #[must_use]
    pub fn get_parser_by_extension(&self, name: &str) -> Option<Parser<'_>> {
        let decoder = self.decoder_for(name)?;
        Some(Parser::new(self, Arc::clone(decoder), name))
    }

    pub(crate) fn decoder_for(&self, name: &str) -> Option<&Arc<dyn Decoder>> {
        self.decoders.get(&normalize_extension(name))
    }

    /// Check whether a document name resolves to a decoder.
    #[must_use]
    pub fn supports(&self, name: &str) -> bool {
        self.decoder_for(name).is_some()
    }

    /// Format identifiers that still own at least one extension, in
    /// registration order.
    #[must_use]
    pub fn available_formats(&self) -> Vec<String> {
        self.formats
            .iter()
            .filter(|format| self.decoders.values().any(|d| d.format() == format.as_str()))
            .cloned()
            .collect()
    }

    /// Every registered extension, sorted.
    #[must_use]
    pub fn supported_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.decoders.keys().cloned().collect();
        extensions.sort();
        extensions
    }

    /// Extensions handled by one format, sorted.
    #[must_use]
    pub fn extensions_for(&self, format: &str) -> Vec<String> {
        let mut extensions: Vec<String> = self
            .decoders
            .iter()
            .filter(|(_, d)| d.format() == format)
            .map(|(ext, _)| ext.clone())
            .collect();
        extensions.sort();
        extensions
    }
}

impl Default for ParserManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ParserManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserManager")
            .field("formats", &self.formats)
            .field("extensions", &self.supported_extensions())
            .finish()
    }
}
