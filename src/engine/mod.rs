//! Language-aware diagnostic engines.
//!
//! The scanner does not type-check anything itself. It asks a
//! [`DiagnosticEngine`] for the suggestion diagnostics of each file and
//! for the definition behind a diagnostic, then keeps the ones that flag
//! deprecated declarations.
//!
//! # Available Engines
//!
//! | Engine | Backing |
//! |--------|---------|
//! | [`CommandEngine`] | External process speaking JSON lines over stdio |
//! | [`CannedEngine`] | In-memory canned responses, for tests and embedding |

mod canned;
mod command;

pub use canned::CannedEngine;
pub use command::CommandEngine;

use crate::project::Project;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to start analysis engine `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Analysis engine I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed engine response: {0}")]
    Protocol(String),

    #[error("Cannot analyze {path}: {message}")]
    Analysis { path: PathBuf, message: String },

    #[error("Analysis engine is not running")]
    NotRunning,
}

/// A diagnostic message, either plain text or a chain of nested messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageText {
    Text(String),
    Chain(MessageChain),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageChain {
    pub message_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub next: Vec<MessageChain>,
}

impl MessageText {
    /// Flattens the message into one string. Nested messages each start on
    /// a new line, indented two spaces per level of depth.
    pub fn flatten(&self) -> String {
        match self {
            MessageText::Text(text) => text.clone(),
            MessageText::Chain(chain) => {
                let mut out = String::new();
                flatten_chain(chain, 0, &mut out);
                out
            }
        }
    }
}

fn flatten_chain(chain: &MessageChain, depth: usize, out: &mut String) {
    if depth > 0 {
        out.push('\n');
        out.push_str(&"  ".repeat(depth));
    }
    out.push_str(&chain.message_text);
    for next in &chain.next {
        flatten_chain(next, depth + 1, out);
    }
}

impl From<&str> for MessageText {
    fn from(text: &str) -> Self {
        MessageText::Text(text.to_string())
    }
}

/// A diagnostic as reported by the engine.
///
/// `start` and `length` are measured in UTF-16 code units from the start
/// of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDiagnostic {
    pub code: u32,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub length: Option<usize>,
    pub message_text: MessageText,
}

impl RawDiagnostic {
    pub fn new(code: u32, start: usize, length: usize, message: impl Into<MessageText>) -> Self {
        Self {
            code,
            start: Some(start),
            length: Some(length),
            message_text: message.into(),
        }
    }
}

/// Capability to analyze source files of one project.
///
/// One engine instance belongs to one scan: it is opened on the project
/// once, queried for every file, and disposed when the scan ends.
#[async_trait]
pub trait DiagnosticEngine: Send {
    /// Returns the human-readable name of this engine.
    fn name(&self) -> &'static str;

    /// Prepares the engine for the resolved project.
    async fn open_project(&mut self, _project: &Project) -> Result<(), EngineError> {
        Ok(())
    }

    /// Returns every suggestion diagnostic the engine reports for `file`.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be analyzed.
    async fn suggestion_diagnostics(&mut self, file: &Path)
        -> Result<Vec<RawDiagnostic>, EngineError>;

    /// Returns the file that declares the symbol at `offset` in `file`.
    async fn definition_at(
        &mut self,
        _file: &Path,
        _offset: usize,
    ) -> Result<Option<String>, EngineError> {
        Ok(None)
    }

    /// Releases engine resources. Called exactly once per scan.
    fn dispose(&mut self) {}
}
