//! Action form state machine for one issue detail.
//!
//! At most one form is open at a time. Every successful mutation is followed
//! by a re-fetch of the issue by key, and the fetched issue replaces the local
//! one wholesale. A failed mutation leaves both the issue and any pending form
//! input untouched.

use std::fmt;
use std::sync::Arc;

use crate::error::{NavigatorError, Result};
use crate::events::{EventBus, NavigatorEvent};
use crate::remote::{IssueMutation, IssueService};
use crate::search::SearchState;
use crate::types::{ActionPlan, Issue, Rule, Severity};

use super::IssueDetail;
use super::assign::{AssigneeChoice, AssigneeLookup};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Comment,
    EditComment,
    SetSeverity,
    Assign,
    Plan,
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormKind::Comment => "comment",
            FormKind::EditComment => "edit comment",
            FormKind::SetSeverity => "severity",
            FormKind::Assign => "assign",
            FormKind::Plan => "plan",
        };
        f.write_str(name)
    }
}

/// An open form together with its pending input.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionForm {
    Comment {
        text: String,
    },
    EditComment {
        comment_key: String,
        text: String,
    },
    SetSeverity {
        severity: Severity,
    },
    Assign {
        assignee: Option<String>,
        lookup: AssigneeLookup,
    },
    Plan {
        plans: Vec<ActionPlan>,
        selected: Option<String>,
    },
}

impl ActionForm {
    pub fn kind(&self) -> FormKind {
        match self {
            ActionForm::Comment { .. } => FormKind::Comment,
            ActionForm::EditComment { .. } => FormKind::EditComment,
            ActionForm::SetSeverity { .. } => FormKind::SetSeverity,
            ActionForm::Assign { .. } => FormKind::Assign,
            ActionForm::Plan { .. } => FormKind::Plan,
        }
    }

    /// Comment forms need some text; the others can always be submitted.
    pub fn can_submit(&self) -> bool {
        match self {
            ActionForm::Comment { text } | ActionForm::EditComment { text, .. } => {
                !text.trim().is_empty()
            }
            _ => true,
        }
    }

    pub fn set_text(&mut self, value: impl Into<String>) -> Result<()> {
        match self {
            ActionForm::Comment { text } | ActionForm::EditComment { text, .. } => {
                *text = value.into();
                Ok(())
            }
            other => Err(NavigatorError::Other(format!(
                "the {} form has no text",
                other.kind()
            ))),
        }
    }

    fn mutation(&self, issue_key: &str) -> Result<IssueMutation> {
        if !self.can_submit() {
            return Err(NavigatorError::EmptyComment);
        }
        let issue = issue_key.to_string();
        let mutation = match self {
            ActionForm::Comment { text } => IssueMutation::AddComment {
                issue,
                text: text.clone(),
            },
            ActionForm::EditComment { comment_key, text } => IssueMutation::EditComment {
                comment: comment_key.clone(),
                text: text.clone(),
            },
            ActionForm::SetSeverity { severity } => IssueMutation::SetSeverity {
                issue,
                severity: *severity,
            },
            ActionForm::Assign { assignee, .. } => IssueMutation::Assign {
                issue,
                assignee: assignee.clone(),
            },
            ActionForm::Plan { selected, .. } => IssueMutation::Plan {
                issue,
                plan: selected.clone(),
            },
        };
        Ok(mutation)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum FormState {
    #[default]
    Idle,
    Open(ActionForm),
}

impl FormState {
    pub fn is_open(&self) -> bool {
        matches!(self, FormState::Open(_))
    }

    pub fn kind(&self) -> Option<FormKind> {
        match self {
            FormState::Idle => None,
            FormState::Open(form) => Some(form.kind()),
        }
    }
}

/// Drives the action forms and direct actions of one issue.
pub struct ActionController {
    service: Arc<dyn IssueService>,
    detail: IssueDetail,
    state: FormState,
    current_user: Option<String>,
    events: EventBus,
    results: Option<Arc<SearchState>>,
}

impl ActionController {
    pub fn new(
        service: Arc<dyn IssueService>,
        detail: IssueDetail,
        current_user: Option<String>,
        events: EventBus,
    ) -> Self {
        Self {
            service,
            detail,
            state: FormState::Idle,
            current_user,
            events,
            results: None,
        }
    }

    /// Keep the matching result list entry in sync with refreshes.
    pub fn with_results(mut self, results: Arc<SearchState>) -> Self {
        self.results = Some(results);
        self
    }

    pub fn detail(&self) -> &IssueDetail {
        &self.detail
    }

    pub fn issue(&self) -> &Issue {
        &self.detail.issue
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    /// Rule of the issue, fetched on first use.
    pub async fn ensure_rule(&mut self) -> Result<&Rule> {
        self.detail.ensure_rule(self.service.as_ref()).await
    }

    /// The action buttons are hidden while a form is open.
    pub fn actions_visible(&self) -> bool {
        !self.state.is_open()
    }

    pub fn open_comment(&mut self) -> Result<()> {
        self.open(ActionForm::Comment {
            text: String::new(),
        })
    }

    /// Open the edit form prefilled with the comment's markdown.
    pub fn open_edit_comment(&mut self, comment_key: &str) -> Result<()> {
        self.ensure_idle()?;
        let comment = self
            .detail
            .issue
            .find_comment(comment_key)
            .ok_or_else(|| NavigatorError::CommentNotFound(comment_key.to_string()))?;
        let form = ActionForm::EditComment {
            comment_key: comment.key.clone(),
            text: comment.markdown.clone().unwrap_or_default(),
        };
        self.open(form)
    }

    pub fn open_set_severity(&mut self) -> Result<()> {
        let severity = self.detail.issue.severity.unwrap_or_default();
        self.open(ActionForm::SetSeverity { severity })
    }

    pub fn open_assign(&mut self) -> Result<()> {
        let form = ActionForm::Assign {
            assignee: self.detail.issue.assignee.clone(),
            lookup: AssigneeLookup::new(&self.detail.issue, self.current_user.as_deref()),
        };
        self.open(form)
    }

    /// Fetch the project's action plans, then open the plan form. The form
    /// stays closed when the fetch fails.
    pub async fn open_plan(&mut self) -> Result<()> {
        self.ensure_idle()?;
        let project = self.detail.issue.project.clone().unwrap_or_default();
        let plans = match self.service.action_plans(&project).await {
            Ok(plans) => plans,
            Err(e) => return Err(self.failed(e)),
        };
        let form = ActionForm::Plan {
            plans,
            selected: self.detail.issue.action_plan.clone(),
        };
        self.open(form)
    }

    pub fn form(&self) -> Option<&ActionForm> {
        match &self.state {
            FormState::Open(form) => Some(form),
            FormState::Idle => None,
        }
    }

    pub fn form_mut(&mut self) -> Result<&mut ActionForm> {
        match &mut self.state {
            FormState::Open(form) => Ok(form),
            FormState::Idle => Err(NavigatorError::NoFormOpen),
        }
    }

    pub fn can_submit(&self) -> bool {
        self.form().is_some_and(ActionForm::can_submit)
    }

    /// Candidates for the open assign form.
    pub async fn lookup_assignees(&self, term: &str) -> Result<Vec<AssigneeChoice>> {
        match self.form() {
            Some(ActionForm::Assign { lookup, .. }) => {
                lookup.lookup(self.service.as_ref(), term).await
            }
            _ => Err(NavigatorError::NoFormOpen),
        }
    }

    /// Close the open form without a remote call. Returns whether one was
    /// open.
    pub fn cancel(&mut self) -> bool {
        if !self.state.is_open() {
            return false;
        }
        self.set_state(FormState::Idle);
        true
    }

    /// Run the open form's mutation.
    ///
    /// On success the form closes and the issue is re-fetched. On failure the
    /// form stays open with its input as it was.
    pub async fn submit(&mut self) -> Result<()> {
        let mutation = match &self.state {
            FormState::Idle => return Err(NavigatorError::NoFormOpen),
            FormState::Open(form) => form.mutation(&self.detail.issue.key)?,
        };

        tracing::debug!(issue = %self.detail.issue.key, "submitting {}", mutation.name());
        if let Err(e) = self.service.mutate(&mutation).await {
            return Err(self.failed(e));
        }

        // The mutation applied; the form closes even if the refresh fails.
        self.set_state(FormState::Idle);
        self.refresh().await
    }

    pub async fn assign_to_me(&mut self) -> Result<()> {
        let me = self.current_user.clone().ok_or_else(|| {
            NavigatorError::Config(
                "no current user; set current_user or ISSUENAV_USER".to_string(),
            )
        })?;
        let mutation = IssueMutation::Assign {
            issue: self.detail.issue.key.clone(),
            assignee: Some(me),
        };
        self.run_direct(mutation).await
    }

    pub async fn transition(&mut self, transition: &str) -> Result<()> {
        let mutation = IssueMutation::DoTransition {
            issue: self.detail.issue.key.clone(),
            transition: transition.to_string(),
        };
        self.run_direct(mutation).await
    }

    pub async fn do_action(&mut self, action: &str) -> Result<()> {
        let mutation = IssueMutation::DoAction {
            issue: self.detail.issue.key.clone(),
            action: action.to_string(),
        };
        self.run_direct(mutation).await
    }

    pub async fn delete_comment(&mut self, comment_key: &str) -> Result<()> {
        if self.detail.issue.find_comment(comment_key).is_none() {
            return Err(NavigatorError::CommentNotFound(comment_key.to_string()));
        }
        let mutation = IssueMutation::DeleteComment {
            comment: comment_key.to_string(),
        };
        self.run_direct(mutation).await
    }

    /// Re-fetch the issue by key and replace it wholesale.
    pub async fn refresh(&mut self) -> Result<()> {
        let key = self.detail.issue.key.clone();
        let issue = match self.service.show_issue(&key).await {
            Ok(issue) => issue,
            Err(e) => return Err(self.failed(e)),
        };

        if let Some(results) = &self.results {
            results.replace_issue(issue.clone());
        }
        self.detail.issue = issue;
        self.events.emit(NavigatorEvent::IssueRefreshed { key });
        Ok(())
    }

    async fn run_direct(&mut self, mutation: IssueMutation) -> Result<()> {
        self.ensure_idle()?;
        tracing::debug!(issue = %self.detail.issue.key, "running {}", mutation.name());
        if let Err(e) = self.service.mutate(&mutation).await {
            return Err(self.failed(e));
        }
        self.refresh().await
    }

    fn ensure_idle(&self) -> Result<()> {
        match &self.state {
            FormState::Idle => Ok(()),
            FormState::Open(form) => Err(NavigatorError::FormAlreadyOpen(form.kind())),
        }
    }

    fn open(&mut self, form: ActionForm) -> Result<()> {
        self.ensure_idle()?;
        self.set_state(FormState::Open(form));
        Ok(())
    }

    fn set_state(&mut self, state: FormState) {
        self.state = state;
        self.events.emit(NavigatorEvent::FormChanged {
            key: self.detail.issue.key.clone(),
            form: self.state.kind(),
        });
    }

    fn failed(&self, error: NavigatorError) -> NavigatorError {
        tracing::warn!(issue = %self.detail.issue.key, "action failed: {error}");
        self.events.emit(NavigatorEvent::ActionFailed {
            key: self.detail.issue.key.clone(),
            message: error.to_string(),
        });
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_form_requires_text() {
        let mut form = ActionForm::Comment {
            text: "   ".to_string(),
        };
        assert!(!form.can_submit());
        assert!(matches!(
            form.mutation("I1"),
            Err(NavigatorError::EmptyComment)
        ));

        form.set_text("looks wrong").unwrap();
        assert!(form.can_submit());
        assert_eq!(
            form.mutation("I1").unwrap(),
            IssueMutation::AddComment {
                issue: "I1".to_string(),
                text: "looks wrong".to_string(),
            }
        );
    }

    #[test]
    fn test_edit_comment_targets_comment_key() {
        let form = ActionForm::EditComment {
            comment_key: "CM1".to_string(),
            text: "fixed".to_string(),
        };
        assert_eq!(
            form.mutation("I1").unwrap(),
            IssueMutation::EditComment {
                comment: "CM1".to_string(),
                text: "fixed".to_string(),
            }
        );
    }

    #[test]
    fn test_plan_form_without_selection_unplans() {
        let form = ActionForm::Plan {
            plans: Vec::new(),
            selected: None,
        };
        assert_eq!(
            form.mutation("I1").unwrap(),
            IssueMutation::Plan {
                issue: "I1".to_string(),
                plan: None,
            }
        );
    }

    #[test]
    fn test_set_text_rejected_on_severity_form() {
        let mut form = ActionForm::SetSeverity {
            severity: Severity::Major,
        };
        assert!(form.set_text("x").is_err());
    }

    #[test]
    fn test_form_state_kind() {
        assert_eq!(FormState::Idle.kind(), None);
        let state = FormState::Open(ActionForm::SetSeverity {
            severity: Severity::Blocker,
        });
        assert!(state.is_open());
        assert_eq!(state.kind(), Some(FormKind::SetSeverity));
        assert_eq!(FormKind::EditComment.to_string(), "edit comment");
    }
}
