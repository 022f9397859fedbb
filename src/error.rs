use thiserror::Error;

/// Application-level errors with context-rich messages.
///
/// Every fallible operation of the batch driver returns Result<T, AppError>.
/// The decoder core itself never produces these: malformed instructions and
/// indices degrade to markers inside the parsed output instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the base58 address codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid base58 character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },

    #[error("decoded address has {actual} bytes, expected {expected}")]
    InvalidLength { expected: usize, actual: usize },
}
