//! Kernel-wide base error type.
//!
//! Sub-crates define their own error enums for their own failure modes and
//! wrap `CoreError` where a configuration or parse problem bubbles up.

use thiserror::Error;

/// Errors raised by `tl-core` itself (configuration validation, parsing).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for `tl-core`.
pub type CoreResult<T> = Result<T, CoreError>;
