//! Chain assembly and execution.

use super::exporter::Exporter;
use super::importer::Importer;
use super::input::Input;
use super::transformer::Transformer;
use crate::error::{DocwalkError, Result};
use crate::parser::{Observer, ParseSummary};

/// Partially assembled pipeline.
///
/// Fragments are plain values: cloning one and finishing the clones with
/// different exporters fans a single input out to several outputs. A clone
/// forks every transformer, so each fanned-out chain filters on its own.
#[derive(Debug, Default)]
pub struct Fragment {
    importer: Option<Importer>,
    input: Option<Input>,
    transformers: Vec<Transformer>,
}

impl Clone for Fragment {
    fn clone(&self) -> Self {
        Self {
            importer: self.importer.clone(),
            input: self.input.clone(),
            transformers: self.transformers.iter().map(Transformer::fork).collect(),
        }
    }
}

impl Fragment {
    /// Fragment starting at an importer.
    #[must_use]
    pub fn new(importer: Importer) -> Self {
        Self {
            importer: Some(importer),
            ..Self::default()
        }
    }

    /// Fragment holding only an input, to be joined with [`Fragment::append`].
    #[must_use]
    pub fn from_input(input: Input) -> Self {
        Self {
            input: Some(input),
            ..Self::default()
        }
    }

    /// Bind an input, replacing any bound before.
    #[must_use]
    pub fn with_input(mut self, input: Input) -> Self {
        self.input = Some(input);
        self
    }

    /// Append a transformer after those already present.
    #[must_use]
    pub fn then(mut self, transformer: Transformer) -> Self {
        self.transformers.push(transformer);
        self
    }

    /// Concatenate two fragments; `other`'s transformers run after ours.
    ///
    /// # Errors
    /// Returns `InvalidConnection` if both fragments carry an importer or
    /// both carry an input.
    pub fn append(mut self, other: Fragment) -> Result<Self> {
        if self.importer.is_some() && other.importer.is_some() {
            return Err(DocwalkError::InvalidConnection(
                "both fragments have an importer".to_string(),
            ));
        }
        if self.input.is_some() && other.input.is_some() {
            return Err(DocwalkError::InvalidConnection(
                "both fragments have an input".to_string(),
            ));
        }

        self.importer = self.importer.or(other.importer);
        self.input = self.input.or(other.input);
        self.transformers.extend(other.transformers);
        Ok(self)
    }

    #[must_use]
    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    /// Finish the pipeline without running it.
    ///
    /// # Errors
    /// Returns `InvalidConnection` if the fragment has no importer.
    pub fn build(self, exporters: impl IntoIterator<Item = Exporter>) -> Result<ParsingChain> {
        let importer = self.importer.ok_or_else(|| {
            DocwalkError::InvalidConnection("fragment has no importer".to_string())
        })?;
        let state = if self.input.is_some() {
            ChainState::Bound
        } else {
            ChainState::Unbound
        };

        Ok(ParsingChain {
            importer,
            transformers: self.transformers,
            exporters: exporters.into_iter().collect(),
            input: self.input,
            state,
            runs: 0,
        })
    }

    /// Finish the pipeline with one exporter and run it if an input is bound.
    ///
    /// # Errors
    /// Returns the build error, or the error of the immediate run.
    pub fn connect(self, exporter: Exporter) -> Result<ParsingChain> {
        let mut chain = self.build([exporter])?;
        if chain.input.is_some() {
            chain.run()?;
        }
        Ok(chain)
    }
}

/// Execution state of a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// No input bound yet.
    Unbound,
    /// Input bound, not yet run.
    Bound,
    /// Last run finished, completely or cancelled.
    Completed(ParseSummary),
    /// Last run failed.
    Failed,
}

/// Executable pipeline.
#[derive(Debug)]
pub struct ParsingChain {
    importer: Importer,
    transformers: Vec<Transformer>,
    exporters: Vec<Exporter>,
    input: Option<Input>,
    state: ChainState,
    runs: usize,
}

impl ParsingChain {
    /// Add an exporter for subsequent runs.
    pub fn add_exporter(&mut self, exporter: Exporter) {
        self.exporters.push(exporter);
    }

    /// Bind a new input and run the chain on it once.
    ///
    /// Transformer state carries over from earlier runs.
    ///
    /// # Errors
    /// See [`ParsingChain::run`].
    pub fn set_input(&mut self, input: Input) -> Result<ParseSummary> {
        self.input = Some(input);
        self.state = ChainState::Bound;
        self.run()
    }

    /// Run the chain on the bound input.
    ///
    /// Every exporter writes its footer even when the run fails, so partial
    /// output stays well-formed.
    ///
    /// # Errors
    /// Returns `ChainUnbound` without an input, `InvalidConnection` without
    /// an exporter, `FormatNotSupported` or `DecodeFailure` from the
    /// importer, and `Export` if writing output failed.
    pub fn run(&mut self) -> Result<ParseSummary> {
        let input = self.input.clone().ok_or(DocwalkError::ChainUnbound)?;
        if self.exporters.is_empty() {
            return Err(DocwalkError::InvalidConnection(
                "chain has no exporter".to_string(),
            ));
        }
        let parser = match self.importer.resolve(&input) {
            Ok(parser) => parser,
            Err(err) => {
                self.state = ChainState::Failed;
                return Err(err);
            }
        };

        self.runs += 1;
        tracing::info!(
            input = %input.name(),
            run = self.runs,
            transformers = self.transformers.len(),
            exporters = self.exporters.len(),
            "Running chain"
        );

        for exporter in &self.exporters {
            exporter.begin_run();
        }

        let observers: Vec<Box<dyn Observer + '_>> = self
            .transformers
            .iter()
            .map(Transformer::observer)
            .chain(self.exporters.iter().map(Exporter::observer))
            .collect();
        let result = self.importer.drive(parser, &input, observers);

        let mut export_error = None;
        for exporter in &self.exporters {
            if let Err(err) = exporter.finish_run() {
                export_error.get_or_insert(err);
            }
        }

        let outcome = match (result, export_error) {
            (Ok(summary), None) => Ok(summary),
            (Err(err), _) | (Ok(_), Some(err)) => Err(err),
        };

        match outcome {
            Ok(summary) => {
                tracing::info!(
                    input = %input.name(),
                    events = summary.events,
                    skipped = summary.skipped,
                    cancelled = summary.is_cancelled(),
                    "Chain run finished"
                );
                self.state = ChainState::Completed(summary);
                Ok(summary)
            }
            Err(err) => {
                tracing::warn!(input = %input.name(), error = %err, "Chain run failed");
                self.state = ChainState::Failed;
                Err(err)
            }
        }
    }

    #[must_use]
    pub fn state(&self) -> ChainState {
        self.state
    }

    /// Number of runs started so far.
    #[must_use]
    pub fn runs(&self) -> usize {
        self.runs
    }

    #[must_use]
    pub fn input(&self) -> Option<&Input> {
        self.input.as_ref()
    }
}
