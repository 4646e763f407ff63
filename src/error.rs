/// Error types for the needly library
use std::fmt;

/// Result type alias for needly operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for needly operations
///
/// The search core itself is total: building an automaton and running it
/// never fail. Errors only arise when loading a packed automaton from
/// untrusted bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Format/parsing errors (bad magic, unsupported version, truncation)
    Format(String),

    /// Structural validation errors in an otherwise well-formed buffer
    Validation(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Format(msg) => write!(f, "Format error: {}", msg),
            Error::Validation(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
