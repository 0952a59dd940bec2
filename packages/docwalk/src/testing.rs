//! Scriptable decoder for traversal tests.
//!
//! A `.tree` document is a whitespace-separated token stream:
//!
//! - `word {` opens a container named `word`, `}` closes it
//! - `@key` parses the registered document `key` as the nested `key.tree`
//! - `!` fails the decode
//! - any other word is a content leaf

use std::collections::HashMap;

use crate::error::{DocwalkError, Result};
use crate::event::{NodeEvent, Tag};
use crate::parser::{Decoder, TraversalContext};

#[derive(Debug, Clone)]
pub(crate) struct TreeDecoder {
    extensions: Vec<String>,
    docs: HashMap<String, String>,
}

impl TreeDecoder {
    pub(crate) fn new() -> Self {
        Self {
            extensions: vec!["tree".to_string()],
            docs: HashMap::new(),
        }
    }

    pub(crate) fn with_extensions<const N: usize>(mut self, extensions: [&str; N]) -> Self {
        self.extensions = extensions.iter().map(|e| (*e).to_string()).collect();
        self
    }

    /// Register a document reachable through `@key`.
    pub(crate) fn with_doc(mut self, key: &str, source: &str) -> Self {
        self.docs.insert(key.to_string(), source.to_string());
        self
    }
}

impl Decoder for TreeDecoder {
    fn format(&self) -> &str {
        "tree"
    }

    fn extensions(&self) -> Vec<String> {
        self.extensions.clone()
    }

    fn decode(&self, document: &[u8], ctx: &mut TraversalContext<'_, '_>) -> Result<()> {
        let source = String::from_utf8_lossy(document);
        let tokens: Vec<&str> = source.split_whitespace().collect();
        let mut position = 0;
        self.decode_tokens(&tokens, &mut position, ctx)
    }
}

impl TreeDecoder {
    fn decode_tokens(
        &self,
        tokens: &[&str],
        position: &mut usize,
        ctx: &mut TraversalContext<'_, '_>,
    ) -> Result<()> {
        while *position < tokens.len() {
            if ctx.is_cancelled() {
                return Ok(());
            }

            let token = tokens[*position];
            *position += 1;

            match token {
                "}" => return Ok(()),
                "!" => return Err(DocwalkError::decode("tree", "scripted failure")),
                _ if token.starts_with('@') => {
                    let key = &token[1..];
                    let nested = self.docs.get(key).map(String::as_str).unwrap_or_default();
                    ctx.parse_nested(&format!("{key}.tree"), nested.as_bytes());
                }
                _ if tokens.get(*position) == Some(&"{") => {
                    *position += 1;
                    let event = NodeEvent::new(Tag::Custom("box".to_string()))
                        .with_attribute("name", token);
                    let flow =
                        ctx.container(event, |ctx| self.decode_tokens(tokens, position, ctx))?;
                    if flow.is_cancelled() {
                        return Ok(());
                    }
                }
                _ => {
                    ctx.emit(NodeEvent::new(Tag::Content).with_text(token));
                }
            }
        }
        Ok(())
    }
}
