use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No valid URL found for {subject} {year}")]
    NotFound { subject: String, year: String },

    #[error("Transfer of {url} failed: {reason}")]
    Transfer { url: String, reason: String },

    #[error("I/O error: {0}")]
    Io(String),
}
