use thiserror::Error;

/// Malformed or out-of-range configuration values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("empty input")]
    Empty,

    #[error("not a valid non-negative integer: {0}")]
    NotANumber(String),

    #[error("value must be greater than zero")]
    Zero,

    #[error("value {value} exceeds the maximum of {max}")]
    TooLarge { value: u64, max: u64 },

    #[error("expected {expected} host entries, got {got}")]
    MissingHosts { expected: usize, got: usize },

    #[error("host entry {index} is empty")]
    EmptyHost { index: usize },
}

/// Errors that abort a batch before any probe starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),
}

/// Transport-level failure raised by a probe implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}{}", .cause.as_ref().map(|c| format!(": {c}")).unwrap_or_default())]
pub struct ProbeError {
    pub message: String,
    pub cause: Option<String>,
}

impl ProbeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(message: impl Into<String>, cause: impl ToString) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.to_string()),
        }
    }
}
