use std::fmt;

use thiserror::Error;

/// A non-success response from the Canvas API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.status, self.reason, self.body)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Canvas API error {0}")]
    Api(ApiError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode Canvas response: {0}")]
    Decode(String),

    #[error("Lookup error: {0}")]
    Lookup(String),

    #[error("Unrecognized date: {0:?}")]
    DateParse(String),

    #[error("Spreadsheet error: {0}")]
    Sheet(String),

    #[error("Assignment {0} not found in course")]
    UnknownAssignment(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
