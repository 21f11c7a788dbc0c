//! Error types for Prompt Fusion operations.

use std::io;

use thiserror::Error;

use prompt_fusion_parser::error::ParseError;

/// The main error type for Prompt Fusion operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries the text its diagnostic spans refer to. For
/// variable errors that is the prompt as written; for structural errors it
/// is the prompt after variable resolution.
#[derive(Debug, Error)]
pub enum FusionError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl FusionError {
    /// Create a new `Parse` error with the text its spans refer to.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
