//! Issue detail: the selected issue plus the context loaded around it.
//!
//! Source lines and blame are fetched together with the issue when it points
//! at a line. The rule description is only fetched when asked for.

pub mod actions;
pub mod assign;

use crate::error::{NavigatorError, Result};
use crate::remote::IssueService;
use crate::types::{Issue, LineRange, Rule, SourceSnippet};

pub use actions::{ActionController, ActionForm, FormKind, FormState};
pub use assign::{AssigneeChoice, AssigneeLookup};

#[derive(Debug, Clone, Default)]
pub struct IssueDetail {
    pub issue: Issue,
    pub source: Option<SourceSnippet>,
    pub rule: Option<Rule>,
}

impl IssueDetail {
    pub fn new(issue: Issue) -> Self {
        Self {
            issue,
            source: None,
            rule: None,
        }
    }

    /// Fetch the issue by key and, when it has a line, its source context.
    ///
    /// A failed source fetch does not fail the detail; the issue is shown
    /// without source.
    pub async fn load(service: &dyn IssueService, key: &str) -> Result<Self> {
        let issue = service.show_issue(key).await?;
        let mut detail = Self::new(issue);
        detail.source = Self::fetch_source(service, &detail.issue).await;
        Ok(detail)
    }

    /// Like [`IssueDetail::load`], but starts from an issue already known
    /// from the result list so the issue and source fetches run together.
    pub async fn load_from(service: &dyn IssueService, known: &Issue) -> Result<Self> {
        let (issue, source) = futures::join!(
            service.show_issue(&known.key),
            Self::fetch_source(service, known)
        );
        let mut detail = Self::new(issue?);
        if detail.issue.line == known.line && detail.issue.component == known.component {
            detail.source = source;
        } else {
            detail.source = Self::fetch_source(service, &detail.issue).await;
        }
        Ok(detail)
    }

    async fn fetch_source(service: &dyn IssueService, issue: &Issue) -> Option<SourceSnippet> {
        let (Some(line), Some(component)) = (issue.line, issue.component.as_deref()) else {
            return None;
        };
        match service.show_source(component, LineRange::around(line)).await {
            Ok(snippet) => Some(snippet),
            Err(e) => {
                tracing::warn!("failed to load source of {}: {e}", issue.key);
                None
            }
        }
    }

    /// Rule of the issue, fetched on first use and cached.
    pub async fn ensure_rule(&mut self, service: &dyn IssueService) -> Result<&Rule> {
        let Some(key) = self.issue.rule.clone() else {
            return Err(NavigatorError::NoRule(self.issue.key.clone()));
        };
        if self.rule.as_ref().is_none_or(|r| r.key != key) {
            self.rule = Some(service.show_rule(&key).await?);
        }
        // Populated above.
        Ok(self.rule.get_or_insert_with(Rule::default))
    }
}
