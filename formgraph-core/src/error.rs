use formgraph_forms::FormError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Sheet not found: {0}")]
    MissingSheet(String),

    #[error("Field \"{field}\" not found in sheet: {sheet}")]
    MissingHeader { sheet: String, field: String },

    #[error("Invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("Form service error: {0}")]
    Form(#[from] FormError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SyncError {
    /// Configuration problems are detected before anything is mutated.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SyncError::MissingSheet(_)
                | SyncError::MissingHeader { .. }
                | SyncError::InvalidSetting { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    UnresolvedDestination,
    UnsupportedNodeType,
    OrphanEdge,
    DuplicateNodeId,
    StaleExternalId,
    MissingItem,
    ItemKindMismatch,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::UnresolvedDestination => "unresolved_destination",
            DiagnosticKind::UnsupportedNodeType => "unsupported_node_type",
            DiagnosticKind::OrphanEdge => "orphan_edge",
            DiagnosticKind::DuplicateNodeId => "duplicate_node_id",
            DiagnosticKind::StaleExternalId => "stale_external_id",
            DiagnosticKind::MissingItem => "missing_item",
            DiagnosticKind::ItemKindMismatch => "item_kind_mismatch",
        }
    }
}

/// A recoverable problem found while reading or materializing a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    /// Build a diagnostic and emit it as a warning.
    pub fn warn(kind: DiagnosticKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        let diagnostic = Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        };
        tracing::warn!(kind = kind.as_str(), subject = %diagnostic.subject, "{}", diagnostic.message);
        diagnostic
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind.as_str(), self.subject, self.message)
    }
}
