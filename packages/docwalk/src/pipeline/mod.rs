//! Composable parsing pipelines.
//!
//! A pipeline is assembled from independent stages:
//!
//! ```text
//! Input -> Importer -> [Transformer]* -> Exporter(s)
//! ```
//!
//! [`Fragment`]s collect stages while the pipeline is being built;
//! [`Fragment::build`] turns a complete fragment into a [`ParsingChain`],
//! which runs once per bound input. Transformers and exporters are shared
//! handles, so a caller can keep inspecting them after a run.

mod chain;
mod exporter;
mod importer;
mod input;
mod transformer;

pub use chain::{ChainState, Fragment, ParsingChain};
pub use exporter::{Exporter, Framing, SharedBuffer};
pub use importer::Importer;
pub use input::Input;
pub use transformer::Transformer;
