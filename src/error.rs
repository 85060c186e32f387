// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for snapshotbot

use crate::snapshot::SnapshotKind;
use thiserror::Error;

/// Main error type for snapshotbot
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Diff failed: {0}")]
    Diff(#[from] DiffError),
}

pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Which side of a comparison an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Old,
    New,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Old => write!(f, "old"),
            Side::New => write!(f, "new"),
        }
    }
}

/// Rejected diff input.
///
/// Returned as a value so callers can render the reason without a crash
/// handler; [`DiffError::to_json`] gives the `{"error": reason}` shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    #[error("{0} snapshot is missing")]
    Missing(Side),

    #[error("cannot compare a {old} snapshot with a {new} snapshot")]
    KindMismatch { old: SnapshotKind, new: SnapshotKind },

    #[error("malformed {kind} snapshot data: {reason}")]
    Malformed { kind: SnapshotKind, reason: String },

    #[error("invalid {side} snapshot envelope: {reason}")]
    InvalidEnvelope { side: Side, reason: String },
}

impl DiffError {
    /// Structured error body for JSON consumers
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}
