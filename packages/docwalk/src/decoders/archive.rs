//! Zip archive decoder.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use super::extension_list;
use crate::error::Result;
use crate::event::{NodeEvent, Tag};
use crate::parser::{Decoder, TraversalContext};

/// Decoder emitting one `ArchiveEntry` container per file in a zip archive.
///
/// Entry contents are parsed as nested documents, resolved by entry name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipDecoder;

impl Decoder for ZipDecoder {
    fn format(&self) -> &str {
        "zip"
    }

    fn extensions(&self) -> Vec<String> {
        extension_list(&["zip", "jar", "epub"])
    }

    fn decode(&self, document: &[u8], ctx: &mut TraversalContext<'_, '_>) -> Result<()> {
        let mut archive = ZipArchive::new(Cursor::new(document))?;

        for index in 0..archive.len() {
            let (name, bytes) = {
                let mut entry = match archive.by_index(index) {
                    Ok(entry) => entry,
                    Err(err) => {
                        tracing::warn!(error = %err, index, "Unreadable archive entry, skipping");
                        continue;
                    }
                };
                if entry.is_dir() {
                    continue;
                }

                let name = entry.name().to_string();
                let mut bytes = Vec::new();
                if let Err(err) = entry.read_to_end(&mut bytes) {
                    tracing::warn!(error = %err, entry = %name, "Corrupt archive entry, skipping");
                    continue;
                }
                (name, bytes)
            };

            let event = NodeEvent::new(Tag::ArchiveEntry)
                .with_attribute("name", name.as_str())
                .with_attribute("size", bytes.len() as u64);
            let flow = ctx.container(event, |ctx| {
                ctx.parse_nested(&name, &bytes);
                Ok(())
            })?;
            if flow.is_cancelled() {
                break;
            }
        }
        Ok(())
    }
}
