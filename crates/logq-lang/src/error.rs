use thiserror::Error;

/// Result type local to logq-lang.
pub type Result<T> = std::result::Result<T, ParseError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expecting {expected}; got {got}")]
    Expected { expected: String, got: String },

    #[error("unexpected end of clause; expecting {0}")]
    UnexpectedEnd(String),

    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),

    #[error("cannot parse quoted field name: {0}")]
    InvalidString(String),

    #[error("unexpected trailing token {0}")]
    Trailing(String),
}
