//! Issue server access.
//!
//! This module defines the [`IssueService`] seam every engine component talks
//! through, the catalogue of issue mutations, and the reqwest-backed
//! [`HttpIssueService`].

pub mod config;
pub mod error;
pub mod http;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    ActionPlan, AppState, FavoriteFilter, Issue, LineRange, Rule, SearchResponse, Severity,
    SourceSnippet, UserPage,
};

pub use config::{Config, MergeStrategy};
pub use error::ApiError;
pub use http::HttpIssueService;

/// Request parameters as ordered key/value pairs.
pub type Params = Vec<(String, String)>;

/// A write operation on an issue or one of its comments.
///
/// Mutations report only success or failure; callers re-fetch the issue by
/// key afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueMutation {
    AddComment { issue: String, text: String },
    EditComment { comment: String, text: String },
    DeleteComment { comment: String },
    SetSeverity { issue: String, severity: Severity },
    /// `None` unassigns.
    Assign {
        issue: String,
        assignee: Option<String>,
    },
    /// `None` removes the issue from its action plan.
    Plan { issue: String, plan: Option<String> },
    DoTransition { issue: String, transition: String },
    DoAction { issue: String, action: String },
}

impl IssueMutation {
    pub fn path(&self) -> &'static str {
        match self {
            IssueMutation::AddComment { .. } => "/api/issues/add_comment",
            IssueMutation::EditComment { .. } => "/api/issues/edit_comment",
            IssueMutation::DeleteComment { .. } => "/issue/delete_comment",
            IssueMutation::SetSeverity { .. } => "/api/issues/set_severity",
            IssueMutation::Assign { .. } => "/api/issues/assign",
            IssueMutation::Plan { .. } => "/api/issues/plan",
            IssueMutation::DoTransition { .. } => "/api/issues/do_transition",
            IssueMutation::DoAction { .. } => "/api/issues/do_action",
        }
    }

    /// Form fields posted to [`IssueMutation::path`].
    pub fn form(&self) -> Vec<(&'static str, String)> {
        match self {
            IssueMutation::AddComment { issue, text } => {
                vec![("issue", issue.clone()), ("text", text.clone())]
            }
            IssueMutation::EditComment { comment, text } => {
                vec![("key", comment.clone()), ("text", text.clone())]
            }
            IssueMutation::DeleteComment { comment } => vec![("id", comment.clone())],
            IssueMutation::SetSeverity { issue, severity } => {
                vec![("issue", issue.clone()), ("severity", severity.to_string())]
            }
            IssueMutation::Assign { issue, assignee } => vec![
                ("issue", issue.clone()),
                ("assignee", assignee.clone().unwrap_or_default()),
            ],
            IssueMutation::Plan { issue, plan } => vec![
                ("issue", issue.clone()),
                ("plan", plan.clone().unwrap_or_default()),
            ],
            IssueMutation::DoTransition { issue, transition } => {
                vec![("issue", issue.clone()), ("transition", transition.clone())]
            }
            IssueMutation::DoAction { issue, action } => {
                vec![("issue", issue.clone()), ("actionKey", action.clone())]
            }
        }
    }

    /// Short name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            IssueMutation::AddComment { .. } => "add comment",
            IssueMutation::EditComment { .. } => "edit comment",
            IssueMutation::DeleteComment { .. } => "delete comment",
            IssueMutation::SetSeverity { .. } => "set severity",
            IssueMutation::Assign { .. } => "assign",
            IssueMutation::Plan { .. } => "plan",
            IssueMutation::DoTransition { .. } => "transition",
            IssueMutation::DoAction { .. } => "action",
        }
    }
}

/// Remote operations consumed by the navigator.
#[async_trait]
pub trait IssueService: Send + Sync {
    /// Run an issue search with already-merged filter, sort and page params.
    async fn search_issues(&self, params: &Params) -> Result<SearchResponse>;

    async fn show_issue(&self, key: &str) -> Result<Issue>;

    /// Filter page: permissions and favorites of the current user.
    async fn filter_page(&self) -> Result<AppState>;

    async fn favorite_filters(&self) -> Result<Vec<FavoriteFilter>>;

    async fn show_favorite_filter(&self, id: u64) -> Result<FavoriteFilter>;

    async fn show_rule(&self, key: &str) -> Result<Rule>;

    async fn show_source(&self, component: &str, range: LineRange) -> Result<SourceSnippet>;

    async fn action_plans(&self, project: &str) -> Result<Vec<ActionPlan>>;

    async fn search_users(&self, term: &str, page: u32) -> Result<UserPage>;

    async fn mutate(&self, mutation: &IssueMutation) -> Result<()>;

    /// Overwrite a favorite's stored query. `query` is request-encoded.
    async fn save_filter(&self, id: u64, query: &str) -> Result<()>;
}
