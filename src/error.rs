//! Error types for the conversion core

use thiserror::Error;

/// Every way a single conversion can fail.
///
/// Errors are terminal for the current attempt; the core never returns a
/// partially filled model.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Malformed VLESS URL: {0}")]
    MalformedUrl(String),

    #[error("Malformed config: {0}")]
    MalformedConfig(String),

    #[error("Invalid JSON: {0}")]
    JsonDecode(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Result type alias for the conversion core
pub type Result<T> = std::result::Result<T, ConvertError>;
