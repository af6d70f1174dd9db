//! Error types for the financial engine and its lookup adapters

use thiserror::Error;

/// Errors surfaced by the engine and its configuration layer
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input rejected at the boundary before entering the engine
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    /// The yield estimator returned nothing and the configuration asks to abort
    #[error("first-year yield unavailable for {lat:.4}, {lon:.4}")]
    YieldUnavailable { lat: f64, lon: f64 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl EngineError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        EngineError::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }
}

/// Failures of a single remote lookup
///
/// These never leave the `lookup` module: the trait implementations log them
/// and hand back `None`.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service answered with status {0}")]
    Status(reqwest::StatusCode),

    #[error("response is missing `{0}`")]
    MissingField(&'static str),

    #[error("cannot parse `{field}` from {value:?}")]
    Parse { field: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;
