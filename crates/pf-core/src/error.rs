//! # Error Types: Structured Error Hierarchy
//!
//! Error types shared across the stack. All errors use `thiserror` for
//! derive-based `Display` and `Error` implementations.
//!
//! - Cryptographic errors fail loudly with full context.
//! - Validation errors name the offending field and the rejected value.

use thiserror::Error;

/// Top-level error type for the export integrity stack.
#[derive(Error, Debug)]
pub enum PfError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Cryptographic operation failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// A value failed structural validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// The value could not be represented as JSON.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error in cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key generation or parsing failed.
    #[error("key error: {0}")]
    KeyError(String),

    /// Signature encoding is malformed.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),
}
