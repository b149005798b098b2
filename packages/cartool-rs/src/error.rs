use thiserror::Error;

#[derive(Error, Debug)]
pub enum CartoolError {
    /// Bad magic tag, bad flag byte, malformed name field or truncated payload.
    #[error("Format error: {0}")]
    Format(String),

    /// Cross-entity inconsistency (index out of range, cardinality mismatch).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid argument: wrong shape, unknown method, bad dimensionality.
    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CartoolError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn argument(msg: impl Into<String>) -> Self {
        Self::Argument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CartoolError>;
