//! Persistence payloads and save outcomes.
//!
//! A save is a whole-tree replace: deep-copy the canonical tree, strip the
//! subtrees the backend owns, and PUT the remainder. The live tree is never
//! touched; a rejected or failed save degrades to "not yet persisted". The
//! auxiliary scenes document follows the same discipline against its own
//! resource.

use hearth_key_path as key_path;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Subtrees owned by the backend engines. They arrive with the initial
/// snapshot but are stripped from every save payload; writing them back
/// would clobber state the engines maintain themselves.
pub const SERVER_OWNED: &[&str] = &[
    "patterns.learned",
    "presence.runtime",
    "system.diagnostics",
    "system.version",
];

/// Which backend resource a save targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Settings,
    Scenes,
}

/// A fully prepared PUT body, ready for the host transport.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub document: DocumentKind,
    pub body: Value,
}

/// Build the primary save payload: a deep copy of `tree` with the
/// server-owned subtrees stripped, wrapped as `{"settings": …}`.
pub fn prepare(tree: &Value) -> SaveRequest {
    let mut copy = tree.clone();
    for path in SERVER_OWNED {
        key_path::remove(&mut copy, path);
    }
    SaveRequest {
        document: DocumentKind::Settings,
        body: json!({ "settings": copy }),
    }
}

/// Build the scenes save payload. The scenes document carries no
/// server-owned subtrees.
pub fn prepare_scenes(tree: &Value) -> SaveRequest {
    SaveRequest {
        document: DocumentKind::Scenes,
        body: json!({ "scenes": tree.clone() }),
    }
}

/// Wire shape of the backend's answer to a PUT.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub restart_required: bool,
}

impl SaveResponse {
    /// Structural rejection surfaces the backend's message verbatim.
    pub fn into_result(self) -> Result<SaveAck, SaveError> {
        if self.success {
            Ok(SaveAck {
                restart_required: self.restart_required,
            })
        } else {
            Err(SaveError::Rejected(
                self.message
                    .unwrap_or_else(|| "settings rejected".to_string()),
            ))
        }
    }
}

/// A completed save, possibly flagging that a dependent subsystem must be
/// restarted before the new settings take effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveAck {
    pub restart_required: bool,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SaveError {
    /// The request never completed (network, timeout, …).
    #[error("transport: {0}")]
    Transport(String),
    /// The backend refused the document; message from the response body.
    #[error("{0}")]
    Rejected(String),
}
