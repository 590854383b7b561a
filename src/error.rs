use thiserror::Error;

use crate::refusal::CyclePhase;

#[derive(Debug, Error)]
pub enum MbnaError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{context} dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("internal confidence must be in [0, 1], got {0}")]
    InvalidConfidence(f64),
    #[error("duplicate belief engine id '{0}'")]
    DuplicateEngine(String),
    #[error("invalid cycle transition: {from:?} -> {to:?}")]
    InvalidTransition { from: CyclePhase, to: CyclePhase },
}

pub type Result<T> = std::result::Result<T, MbnaError>;
