//! The `{ "data": ... }` / `{ "error": ... }` response envelope.

use serde::{Deserialize, Serialize};

/// Every API response body is exactly one of these two shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    /// Successful response.
    Data {
        /// Response payload.
        data: T,
    },
    /// Failed response with a human-readable message.
    Error {
        /// What went wrong.
        error: String,
    },
}

impl<T> Envelope<T> {
    /// Wraps a successful payload.
    pub const fn data(data: T) -> Self {
        Self::Data { data }
    }

    /// Wraps an error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }

    /// Converts into a `Result`, the error side being the message.
    ///
    /// # Errors
    ///
    /// Returns the message of an [`Envelope::Error`].
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Data { data } => Ok(data),
            Self::Error { error } => Err(error),
        }
    }
}
