//! Error types for tag query compilation

use thiserror::Error;

/// Main error type for tag query compilation
///
/// Every failure happens while compiling query text. Evaluating a compiled
/// filter against a metric definition never fails.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed expression structure (missing `=`, stray `;`, empty key,
    /// `^=~`, misuse of the reserved `__tag` key)
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    /// The key of an expression failed tag key validation
    #[error("Error when validating key \"{key}\" of expression \"{expression}\": {source}")]
    InvalidKey {
        /// The rejected key
        key: String,
        /// The full expression text
        expression: String,
        /// Why the key was rejected
        #[source]
        source: ValidationError,
    },

    /// Regex compilation failed
    #[error(transparent)]
    Regex(#[from] regex::Error),

    /// The expressions parsed but do not form a valid query
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl Error {
    /// Short label for the error kind, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidExpression(_) => "invalid_expression",
            Error::InvalidKey { .. } => "invalid_key",
            Error::Regex(_) => "regex",
            Error::InvalidQuery(_) => "invalid_query",
            Error::Configuration(_) => "configuration",
        }
    }
}

/// Tag key validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Key is empty
    #[error("tag key must not be empty")]
    Empty,

    /// Key contains a character reserved by the query grammar
    #[error("tag key contains reserved character '{0}'")]
    ReservedCharacter(char),

    /// Key contains a control character
    #[error("tag key contains control character {0:?}")]
    ControlCharacter(char),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
