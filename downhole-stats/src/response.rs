//! Structured responses for the tool layer.

use serde::Serialize;
use serde_json::Value;

use crate::error::{DownholeError, Result};

/// The outcome of one service call.
///
/// Serializes with a `status` field of `success`, `partial` or `error`; the
/// payload's own fields sit next to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResponse<T> {
    Success(T),
    /// Some of the requested work failed; the payload describes what.
    Partial(T),
    Error {
        error: String,
        error_type: String,
    },
}

impl<T> ToolResponse<T> {
    pub fn error(err: &DownholeError) -> Self {
        Self::Error {
            error: err.to_string(),
            error_type: err.kind().to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Partial(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The payload of a success or partial response.
    pub fn payload(&self) -> Option<&T> {
        match self {
            Self::Success(payload) | Self::Partial(payload) => Some(payload),
            Self::Error { .. } => None,
        }
    }

    pub fn into_payload(self) -> Option<T> {
        match self {
            Self::Success(payload) | Self::Partial(payload) => Some(payload),
            Self::Error { .. } => None,
        }
    }

    /// The message of an error response.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl<T: Serialize> ToolResponse<T> {
    /// Renders the response as a JSON value.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl<T> From<Result<T>> for ToolResponse<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(payload) => Self::Success(payload),
            Err(e) => Self::error(&e),
        }
    }
}
