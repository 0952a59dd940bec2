//! Plugin decoders declared by YAML manifests.
//!
//! A plugin directory holds one manifest per external converter:
//!
//! ```yaml
//! name: pdf
//! extensions: [pdf]
//! command: [pdftotext, "-", "-"]
//! ```
//!
//! The converter gets the document on stdin and prints its text on stdout.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Deserialize;

use crate::error::{DocwalkError, Result};
use crate::event::{NodeEvent, Tag};
use crate::parser::{Decoder, TraversalContext};

/// Plugin manifest as stored on disk.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PluginManifest {
    /// Format identifier.
    pub name: String,
    /// Extensions claimed by the plugin.
    pub extensions: Vec<String>,
    /// Program followed by its arguments.
    pub command: Vec<String>,
}

impl PluginManifest {
    /// Parse and validate a manifest.
    ///
    /// # Errors
    /// Returns `PluginManifest` if the YAML is invalid or a field is empty.
    pub fn from_yaml(path: &Path, yaml: &str) -> Result<Self> {
        let manifest: Self =
            serde_yaml_ng::from_str(yaml).map_err(|e| DocwalkError::PluginManifest {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let problem = if manifest.name.trim().is_empty() {
            Some("name is empty")
        } else if manifest.extensions.iter().all(|e| e.trim().is_empty()) {
            Some("no extensions declared")
        } else if manifest.command.first().map_or(true, |c| c.trim().is_empty()) {
            Some("command is empty")
        } else {
            None
        };

        match problem {
            Some(message) => Err(DocwalkError::PluginManifest {
                path: path.display().to_string(),
                message: message.to_string(),
            }),
            None => Ok(manifest),
        }
    }
}

/// Decoder running an external converter program.
#[derive(Debug, Clone)]
pub struct ExternalDecoder {
    manifest: PluginManifest,
}

impl ExternalDecoder {
    #[must_use]
    pub fn new(manifest: PluginManifest) -> Self {
        Self { manifest }
    }

    #[must_use]
    pub fn manifest(&self) -> &PluginManifest {
        &self.manifest
    }

    fn run(&self, document: &[u8]) -> Result<Vec<u8>> {
        let (program, args) = self
            .manifest
            .command
            .split_first()
            .ok_or_else(|| DocwalkError::decode(&self.manifest.name, "command is empty"))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                DocwalkError::decode(&self.manifest.name, format!("cannot start {program}: {e}"))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| DocwalkError::decode(&self.manifest.name, "stdin unavailable"))?;

        // Feed stdin from a second thread so a converter that writes before
        // it has read everything cannot deadlock us.
        let (output, written) = std::thread::scope(|scope| {
            let feeder = scope.spawn(move || stdin.write_all(document));
            let output = child.wait_with_output();
            (output, feeder.join())
        });

        let output = output?;
        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(DocwalkError::decode(
                    &self.manifest.name,
                    "stdin writer panicked",
                ))
            }
        }

        if !output.status.success() {
            return Err(DocwalkError::decode(
                &self.manifest.name,
                format!(
                    "{program} exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        Ok(output.stdout)
    }
}

impl Decoder for ExternalDecoder {
    fn format(&self) -> &str {
        &self.manifest.name
    }

    fn extensions(&self) -> Vec<String> {
        self.manifest.extensions.clone()
    }

    fn decode(&self, document: &[u8], ctx: &mut TraversalContext<'_, '_>) -> Result<()> {
        let stdout = self.run(document)?;
        let text = String::from_utf8_lossy(&stdout).trim_end().to_string();
        let program = self.manifest.command.first().cloned().unwrap_or_default();

        ctx.emit(
            NodeEvent::new(Tag::Content)
                .with_text(text)
                .with_attribute("converter", program),
        );
        Ok(())
    }
}

/// Load every `*.yaml` / `*.yml` manifest in a directory, sorted by path.
pub(super) fn load_plugin_dir(dir: &Path) -> Result<Vec<ExternalDecoder>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        })
        .collect();
    paths.sort();

    let mut decoders = Vec::new();
    for path in paths {
        let loaded = fs::read_to_string(&path)
            .map_err(DocwalkError::from)
            .and_then(|yaml| PluginManifest::from_yaml(&path, &yaml));

        match loaded {
            Ok(manifest) => {
                tracing::debug!(plugin = %manifest.name, path = %path.display(), "Loaded plugin manifest");
                decoders.push(ExternalDecoder::new(manifest));
            }
            Err(err) => {
                tracing::warn!(error = %err, path = %path.display(), "Skipping invalid plugin manifest");
            }
        }
    }

    Ok(decoders)
}
