//! Failures surfaced by a drive.

use serde_json::Value;
use thiserror::Error;

/// Every way a drive, or a single request inside it, can fail.
#[derive(Debug, Error)]
pub enum Error {
    /// The coroutine yielded a value that has no conversion to a completion.
    #[error(
        "You may only yield a function, future, coroutine, array, or object, but the following object was passed: \"{0}\""
    )]
    InvalidRequest(String),

    /// A thunk dropped its callback without ever invoking it.
    #[error("callback was dropped before it was invoked")]
    CallbackDropped,

    /// A finished coroutine was resumed or raised into.
    #[error("coroutine already completed")]
    AlreadyComplete,

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Build a free-form failure.
    pub fn msg(message: impl Into<String>) -> Self {
        Error::Message(message.into())
    }

    pub(crate) fn invalid_request(value: &Value) -> Self {
        Error::InvalidRequest(stringify(value))
    }
}

/// Renders a value the way a script's `String(value)` would for scalars:
/// strings without quotes, everything else in its JSON spelling.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
