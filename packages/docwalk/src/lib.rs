//! docwalk - Event-driven document traversal with composable pipelines.
//!
//! This crate walks hierarchical documents (plain files, mailboxes, mail
//! messages with attachments, zip archives, XML) and emits one
//! [`NodeEvent`] per visited node. Observers can skip subtrees or cancel the
//! traversal while it runs; exporters serialize whatever survives.
//!
//! # Example
//!
//! ```
//! use docwalk::{Exporter, Fragment, Importer, Input, NodeEvent, Tag, TextWriter, Transformer};
//!
//! let mbox = "From a@example.com Mon Jan  1 10:00:00 2024\nSubject: Hello A\n\nHello A\n\n\
//! From b@example.com Tue Jan  2 10:00:00 2024\nSubject: Report\n\nFigures\n";
//!
//! let (exporter, buffer) = Exporter::to_buffer(TextWriter::new());
//! Fragment::new(Importer::with_builtin())
//!     .with_input(Input::from_bytes("inbox.mbox", mbox))
//!     .then(Transformer::filter(|event: &NodeEvent| {
//!         event.tag() == &Tag::MailHeader && event.string_attribute("subject") == "Report"
//!     }))
//!     .connect(exporter)
//!     .unwrap();
//!
//! assert_eq!(buffer.to_string_lossy(), "Hello A\n");
//! ```
//!
//! # Architecture
//!
//! - [`event`]: Node events and tags
//! - [`params`]: Named parameters passed into every nested parse
//! - [`parser`]: Parser, observer and decoder traits, traversal context
//! - [`manager`]: Extension registry and plugin manifests
//! - [`decoders`]: Built-in text, XML, mail, mbox and zip decoders
//! - [`writer`]: Plain text and HTML writers
//! - [`pipeline`]: Inputs, importers, transformers, exporters and chains
//! - [`extractor`]: One-call text extraction
//! - [`config`]: Constants and validation
//! - [`error`]: Error types and Result alias
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod config;
pub mod decoders;
pub mod error;
pub mod event;
pub mod extractor;
pub mod manager;
pub mod params;
pub mod parser;
pub mod pipeline;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used items
pub use error::{DocwalkError, Result};
pub use event::{AttributeValue, NodeEvent, Tag};
pub use extractor::SimpleExtractor;
pub use manager::ParserManager;
pub use params::{ParamValue, Parameters};
pub use parser::{Decoder, Observer, Outcome, ParseSummary, Parser, TraversalContext};
pub use pipeline::{
    ChainState, Exporter, Fragment, Framing, Importer, Input, ParsingChain, SharedBuffer,
    Transformer,
};
pub use writer::{HtmlWriter, TextWriter, Writer};
