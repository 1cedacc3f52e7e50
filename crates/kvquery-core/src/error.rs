//! Error types for kvquery.

use crate::query::ParseError;
use std::fmt;

/// The main error type for kvquery operations.
#[derive(Debug)]
pub enum Error {
    /// The keyspace reports no active connection
    NotConnected,

    /// Enumerating the keyspace failed
    Scan(String),

    /// Reading the value or TTL of a single key failed
    Key {
        /// Key being read
        key: String,
        /// Store-reported reason
        message: String,
    },

    /// Writing or deleting a single key failed
    Write {
        /// Key being written
        key: String,
        /// Store-reported reason
        message: String,
    },

    /// The statement was rejected by the parser
    Parse(ParseError),

    /// Input rejected by the configured limits
    InvalidInput(String),

    /// A lock was poisoned (internal error)
    LockPoisoned,
}

impl Error {
    /// Builds a [`Error::Key`] for `key`.
    pub fn key(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Key {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Builds a [`Error::Write`] for `key`.
    pub fn write(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Write {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotConnected => write!(f, "Not connected to the keyspace"),
            Error::Scan(msg) => write!(f, "Scan error: {}", msg),
            Error::Key { key, message } => write!(f, "Key error on '{}': {}", key, message),
            Error::Write { key, message } => write!(f, "Write error on '{}': {}", key, message),
            Error::Parse(e) => write!(f, "Parse error: {}", e),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::LockPoisoned => write!(f, "Lock poisoned"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}

/// A specialized `Result` type for kvquery operations.
pub type Result<T> = std::result::Result<T, Error>;
