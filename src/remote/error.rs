//! Error mapping for issue server responses.

use std::fmt;

use serde::Deserialize;

use crate::error::NavigatorError;

/// A non-success response from the issue server.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status code, if available
    pub status: Option<reqwest::StatusCode>,
    /// Human-readable error message
    pub message: String,
    /// Endpoint path, for context
    pub endpoint: String,
}

/// Error body the server sends alongside 4xx/5xx statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorMessage>,
    #[serde(default)]
    err_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    msg: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Build from a status and the raw response body.
    ///
    /// The server's `errors[].msg` (or legacy `err_msg`) is used when the body
    /// carries one, otherwise the canonical reason of the status.
    pub fn from_response(status: reqwest::StatusCode, body: &str, endpoint: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| {
                if b.errors.is_empty() {
                    b.err_msg
                } else {
                    Some(
                        b.errors
                            .into_iter()
                            .map(|e| e.msg)
                            .collect::<Vec<_>>()
                            .join("; "),
                    )
                }
            })
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").to_string());

        Self {
            status: Some(status),
            message,
            endpoint: endpoint.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status
            .is_some_and(|s| s == reqwest::StatusCode::NOT_FOUND)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(
                f,
                "{} ({} {})",
                self.message,
                status.as_u16(),
                self.endpoint
            ),
            None => write!(f, "{} ({})", self.message, self.endpoint),
        }
    }
}

impl From<ApiError> for NavigatorError {
    fn from(error: ApiError) -> Self {
        NavigatorError::Api(error.to_string())
    }
}
