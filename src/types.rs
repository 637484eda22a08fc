//! Entities exchanged with the issue server.
//!
//! Field names follow the server's camelCase JSON. Display-only fields that
//! are computed while parsing a search response (`component_long_name` and
//! friends) are skipped by serde in both directions so they are never sent
//! back to the server.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NavigatorError, Result};

/// Issue severity, from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Minor,
    #[default]
    Major,
    Critical,
    Blocker,
}

pub const VALID_SEVERITIES: &[&str] = &["INFO", "MINOR", "MAJOR", "CRITICAL", "BLOCKER"];

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Info,
        Severity::Minor,
        Severity::Major,
        Severity::Critical,
        Severity::Blocker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Minor => "MINOR",
            Severity::Major => "MAJOR",
            Severity::Critical => "CRITICAL",
            Severity::Blocker => "BLOCKER",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = NavigatorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INFO" => Ok(Severity::Info),
            "MINOR" => Ok(Severity::Minor),
            "MAJOR" => Ok(Severity::Major),
            "CRITICAL" => Ok(Severity::Critical),
            "BLOCKER" => Ok(Severity::Blocker),
            _ => Err(NavigatorError::InvalidSeverity(s.to_string())),
        }
    }
}

/// Workflow status of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IssueStatus {
    Open,
    Confirmed,
    Reopened,
    Resolved,
    Closed,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Open => "OPEN",
            IssueStatus::Confirmed => "CONFIRMED",
            IssueStatus::Reopened => "REOPENED",
            IssueStatus::Resolved => "RESOLVED",
            IssueStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub key: String,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub html_text: Option<String>,
    #[serde(default)]
    pub markdown: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updatable: bool,
}

/// A code finding with its workflow state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub key: String,
    #[serde(default)]
    pub component: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub rule: Option<String>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub status: Option<IssueStatus>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub reporter: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub action_plan: Option<String>,
    #[serde(default)]
    pub transitions: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub update_date: Option<String>,
    #[serde(default)]
    pub close_date: Option<String>,

    #[serde(skip)]
    pub component_long_name: Option<String>,
    #[serde(skip)]
    pub component_qualifier: Option<String>,
    #[serde(skip)]
    pub project_long_name: Option<String>,
    #[serde(skip)]
    pub rule_name: Option<String>,
}

impl Issue {
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn find_comment(&self, comment_key: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.key == comment_key)
    }

    /// Component label for display, preferring the denormalized long name.
    pub fn component_label(&self) -> &str {
        self.component_long_name
            .as_deref()
            .or(self.component.as_deref())
            .unwrap_or("")
    }

    pub fn rule_label(&self) -> &str {
        self.rule_name
            .as_deref()
            .or(self.rule.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRef {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub qualifier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub long_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleRef {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}

/// Paging block of a search response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub page_index: u32,
    pub page_size: u32,
    pub total: u64,
    #[serde(default)]
    pub pages: Option<u32>,
}

impl Paging {
    /// Number of pages, derived from total and page size when the server
    /// does not send it.
    pub fn page_count(&self) -> u32 {
        if let Some(pages) = self.pages {
            return pages;
        }
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.page_size)) as u32
    }

    pub fn is_last_page(&self) -> bool {
        self.page_index >= self.page_count()
    }
}

/// Raw search response as sent by the server.
///
/// `issues` and `paging` are required; the reference lists may be absent,
/// in which case nothing gets denormalized.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub components: Vec<ComponentRef>,
    #[serde(default)]
    pub projects: Vec<ProjectRef>,
    #[serde(default)]
    pub rules: Vec<RuleRef>,
    pub paging: Paging,
    #[serde(default)]
    pub max_results_reached: bool,
}

/// A named query saved on the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteFilter {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub description: Option<String>,
    /// Stored query in route encoding.
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub can_modify: bool,
}

/// Permissions and favorites of the current user, from the filter page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub can_manage_filters: bool,
    #[serde(default)]
    pub can_bulk_change: bool,
    #[serde(default)]
    pub favorites: Vec<FavoriteFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPlan {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub dead_line: Option<String>,
}

/// An entry of the user search used by assignee lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserChoice {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPage {
    #[serde(default)]
    pub more: bool,
    #[serde(default)]
    pub results: Vec<UserChoice>,
}

/// Inclusive range of source lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub from: u32,
    pub to: u32,
}

impl LineRange {
    /// Context window around an issue line: 10 lines before, 30 after.
    pub fn around(line: u32) -> Self {
        Self {
            from: line.saturating_sub(10),
            to: line.saturating_add(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLine {
    pub line: u32,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScmLine {
    pub line: u32,
    pub author: Option<String>,
    pub date: Option<String>,
}

/// Source context of an issue together with its blame lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceSnippet {
    pub lines: Vec<SourceLine>,
    pub scm: Vec<ScmLine>,
}
