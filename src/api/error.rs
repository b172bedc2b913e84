use crate::models::ViewValidationError;

/// Errors surfaced by the backend API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("query error: {0}")]
    Query(String),

    #[error(transparent)]
    Validation(#[from] ViewValidationError),

    #[error("view not found: {0}")]
    ViewNotFound(String),
}

impl ApiError {
    /// Short form for a widget's inline error region.
    pub fn summary(&self) -> String {
        match self {
            Self::Transport(e) => format!("request failed: {}", e),
            Self::Status { status, .. } => format!("server error ({})", status),
            Self::Decode(_) => "malformed response".to_string(),
            Self::Query(msg) => format!("query error: {}", msg),
            Self::Validation(e) => e.to_string(),
            Self::ViewNotFound(id) => format!("view not found: {}", id),
        }
    }
}
