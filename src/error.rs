use thiserror::Error;

/// The single error type returned by every public operation in this crate.
///
/// Mirrors the flat, `#[from]`-heavy style used throughout the rest of this
/// codebase: callers match on variants when they care, otherwise propagate
/// with `?` and let `Display` produce a one-line, human-readable message.
#[derive(Error, Debug)]
pub enum Error {
    #[error("usage error: {0}")]
    Usage(String),

    #[error("malformed edge list: {0}")]
    FileFormat(String),

    #[error("failed to allocate {what} ({bytes} bytes)")]
    Allocation { what: &'static str, bytes: usize },

    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn usage(msg: impl Into<String>) -> Self {
        Error::Usage(msg.into())
    }

    pub fn file_format(msg: impl Into<String>) -> Self {
        Error::FileFormat(msg.into())
    }

    pub fn allocation(what: &'static str, bytes: usize) -> Self {
        Error::Allocation { what, bytes }
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Error::InvariantViolation(msg.into())
    }
}
