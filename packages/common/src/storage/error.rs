use std::fmt;

/// Errors raised by exercise and submission persistence.
#[derive(Debug)]
pub enum StoreError {
    /// An I/O error occurred.
    Io(std::io::Error),
    /// A stored document could not be encoded or decoded.
    Serialization(serde_json::Error),
    /// A stored document does not belong where it was found.
    Corrupted(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "store IO error: {err}"),
            Self::Serialization(err) => write!(f, "store serialization error: {err}"),
            Self::Corrupted(msg) => write!(f, "corrupted store document: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Corrupted(_) => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}
