//! Built-in decoders.
//!
//! These cover the formats docwalk understands without plugins: plain
//! text, XML, single mail messages, mbox mailboxes and zip archives. Mail
//! and archive decoders are containers: they emit a node per message or
//! entry and hand the contents back to the registry as nested documents.

mod archive;
mod mail;
mod mbox;
mod text;
mod xml;

pub use archive::ZipDecoder;
pub use mail::MailDecoder;
pub use mbox::MboxDecoder;
pub use text::{decode_text, TextDecoder};
pub use xml::XmlDecoder;

/// Build an owned extension list.
fn extension_list(extensions: &[&str]) -> Vec<String> {
    extensions.iter().map(|e| (*e).to_string()).collect()
}
