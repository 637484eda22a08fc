//! Choices offered by the assign form.

use crate::error::Result;
use crate::remote::IssueService;
use crate::types::{Issue, UserChoice};

/// Terms shorter than this are not sent to the user search.
pub const MIN_LOOKUP_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssigneeChoice {
    /// Login to assign; `None` unassigns.
    pub login: Option<String>,
    pub label: String,
}

impl AssigneeChoice {
    pub fn me(login: &str) -> Self {
        Self {
            login: Some(login.to_string()),
            label: "Assign to me".to_string(),
        }
    }

    pub fn unassigned() -> Self {
        Self {
            login: None,
            label: "Unassigned".to_string(),
        }
    }
}

impl From<UserChoice> for AssigneeChoice {
    fn from(user: UserChoice) -> Self {
        Self {
            login: Some(user.id),
            label: user.text,
        }
    }
}

/// Assignee lookup for one issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssigneeLookup {
    fixed: Vec<AssigneeChoice>,
}

impl AssigneeLookup {
    /// "Assign to me" unless the issue is already assigned to `current_user`;
    /// "Unassigned" when the issue has an assignee.
    pub fn new(issue: &Issue, current_user: Option<&str>) -> Self {
        let mut fixed = Vec::new();
        if let Some(me) = current_user
            && issue.assignee.as_deref() != Some(me)
        {
            fixed.push(AssigneeChoice::me(me));
        }
        if issue.assignee.is_some() {
            fixed.push(AssigneeChoice::unassigned());
        }
        Self { fixed }
    }

    pub fn fixed_choices(&self) -> &[AssigneeChoice] {
        &self.fixed
    }

    /// An empty term gives the fixed choices, a term below
    /// [`MIN_LOOKUP_CHARS`] gives nothing, anything longer searches users.
    pub async fn lookup(&self, service: &dyn IssueService, term: &str) -> Result<Vec<AssigneeChoice>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(self.fixed.clone());
        }
        if term.chars().count() < MIN_LOOKUP_CHARS {
            return Ok(Vec::new());
        }
        tracing::debug!(term, "searching users");
        let page = service.search_users(term, 1).await?;
        Ok(page.results.into_iter().map(AssigneeChoice::from).collect())
    }
}
