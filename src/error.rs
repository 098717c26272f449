//! Custom error types for orgqa

use thiserror::Error;

/// Main error type for orgqa operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("No documents to index: provide a site corpus and/or an FAQ file")]
    NoDocuments,

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Generation service error{}: {message}", status_suffix(.status))]
    GenerationService {
        status: Option<u16>,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Errors scoped to a single request; the shared index is unaffected
    pub fn is_per_request(&self) -> bool {
        matches!(
            self,
            Error::EmbeddingService(_) | Error::GenerationService { .. }
        )
    }

    pub(crate) fn generation(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::GenerationService {
            status,
            message: message.into(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {})", s)).unwrap_or_default()
}

/// Result type alias for orgqa
pub type Result<T> = std::result::Result<T, Error>;
