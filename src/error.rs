use thiserror::Error;

use crate::detail::actions::FormKind;

#[derive(Error, Debug)]
pub enum NavigatorError {
    #[error("issue '{0}' not found")]
    IssueNotFound(String),

    #[error("favorite filter '{0}' not found")]
    FilterNotFound(String),

    #[error("invalid filter id '{0}'")]
    InvalidFilterId(String),

    #[error("issue '{0}' has no rule")]
    NoRule(String),

    #[error("comment '{0}' not found on this issue")]
    CommentNotFound(String),

    #[error("invalid severity '{0}'")]
    InvalidSeverity(String),

    #[error("invalid sort field '{0}'")]
    InvalidSortField(String),

    // Action form state machine
    #[error("the {0} form is already open")]
    FormAlreadyOpen(FormKind),

    #[error("no action form is open")]
    NoFormOpen,

    #[error("comment text cannot be empty")]
    EmptyComment,

    #[error("navigator has been closed")]
    Closed,

    #[error("malformed response from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl NavigatorError {
    pub fn malformed(endpoint: impl Into<String>, message: impl ToString) -> Self {
        NavigatorError::MalformedResponse {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, NavigatorError>;
