use formgraph_core::SyncError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("Workbook error: {0}")]
    Store(#[from] SyncError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook returned {status}: {body}")]
    Webhook { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IntakeError>;
