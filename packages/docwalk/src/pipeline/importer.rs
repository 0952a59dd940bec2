//! Parser selection for an input.

use std::sync::Arc;

use super::input::Input;
use crate::error::{DocwalkError, Result};
use crate::manager::ParserManager;
use crate::params::Parameters;
use crate::parser::{Observer, ParseSummary, Parser};

/// First stage of a chain: resolves a parser for each input and runs it.
#[derive(Debug, Clone)]
pub struct Importer {
    manager: Arc<ParserManager>,
    parameters: Parameters,
}

impl Importer {
    #[must_use]
    pub fn new(manager: Arc<ParserManager>) -> Self {
        Self {
            manager,
            parameters: Parameters::new(),
        }
    }

    /// Importer over the built-in decoders.
    #[must_use]
    pub fn with_builtin() -> Self {
        Self::new(Arc::new(ParserManager::with_builtin()))
    }

    /// Parameters attached to every parse this importer starts.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    pub fn manager(&self) -> &Arc<ParserManager> {
        &self.manager
    }

    /// Resolve the parser for an input.
    ///
    /// # Errors
    /// Returns `FormatNotSupported` listing the available formats.
    pub fn resolve<'m>(&'m self, input: &Input) -> Result<Parser<'m>> {
        self.manager
            .get_parser_by_extension(input.lookup_name())
            .ok_or_else(|| DocwalkError::FormatNotSupported {
                name: input.name().to_string(),
                available: self.manager.available_formats(),
            })
    }

    /// Parse an input, delivering events to `observers` in order.
    ///
    /// # Errors
    /// Returns `FormatNotSupported` if no decoder matches, or
    /// `DecodeFailure` if the document cannot be decoded.
    pub fn import<'o>(
        &'o self,
        input: &Input,
        observers: Vec<Box<dyn Observer + 'o>>,
    ) -> Result<ParseSummary> {
        let parser = self.resolve(input)?;
        self.drive(parser, input, observers)
    }

    /// Run a parser already resolved with [`Importer::resolve`] on `input`.
    ///
    /// # Errors
    /// Returns `DecodeFailure` if the document cannot be decoded.
    pub fn drive<'o>(
        &self,
        mut parser: Parser<'o>,
        input: &Input,
        observers: Vec<Box<dyn Observer + 'o>>,
    ) -> Result<ParseSummary> {
        parser.add_parameters(self.parameters.clone());
        for observer in observers {
            parser.add_boxed_observer(observer);
        }

        tracing::debug!(input = %input.name(), format = parser.format(), "Importing");
        parser.parse(input.bytes())
    }
}
