//! Scripted in-memory issue service shared by the integration tests.

#![allow(dead_code)]

pub mod mock_data;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use issuenav::error::{NavigatorError, Result};
use issuenav::remote::{IssueMutation, IssueService, Params};
use issuenav::types::{
    ActionPlan, AppState, Comment, FavoriteFilter, Issue, LineRange, Rule, SearchResponse,
    SourceSnippet, UserPage,
};

/// A remote call seen by [`MockService`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Search(Params),
    ShowIssue(String),
    FilterPage,
    Favorites,
    ShowFavorite(u64),
    ShowRule(String),
    ShowSource(String, LineRange),
    ActionPlans(String),
    SearchUsers(String),
    Mutate(IssueMutation),
    SaveFilter(u64, String),
}

#[derive(Default)]
pub struct MockService {
    calls: Mutex<Vec<Call>>,
    search_responses: Mutex<VecDeque<std::result::Result<SearchResponse, String>>>,
    search_gate: Mutex<Option<Arc<Notify>>>,
    issues: Mutex<HashMap<String, Issue>>,
    favorites: Mutex<HashMap<u64, FavoriteFilter>>,
    plans: Mutex<Vec<ActionPlan>>,
    source: Mutex<Option<std::result::Result<SourceSnippet, String>>>,
    app_state: Mutex<AppState>,
    fail_mutations: Mutex<Option<String>>,
    fail_show: Mutex<Option<String>>,
    fail_plans: Mutex<Option<String>>,
}

impl MockService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the response of the next issue search.
    pub fn push_search(&self, response: SearchResponse) {
        self.search_responses.lock().push_back(Ok(response));
    }

    pub fn push_search_error(&self, message: &str) {
        self.search_responses
            .lock()
            .push_back(Err(message.to_string()));
    }

    /// Make searches wait until the returned handle is notified, once per
    /// search.
    pub fn hold_searches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.search_gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn release_searches(&self) {
        *self.search_gate.lock() = None;
    }

    pub fn add_issue(&self, issue: Issue) {
        self.issues.lock().insert(issue.key.clone(), issue);
    }

    pub fn stored_issue(&self, key: &str) -> Option<Issue> {
        self.issues.lock().get(key).cloned()
    }

    pub fn add_favorite(&self, favorite: FavoriteFilter) {
        self.favorites.lock().insert(favorite.id, favorite);
    }

    pub fn set_plans(&self, plans: Vec<ActionPlan>) {
        *self.plans.lock() = plans;
    }

    pub fn set_source(&self, source: std::result::Result<SourceSnippet, String>) {
        *self.source.lock() = Some(source);
    }

    pub fn set_app_state(&self, app: AppState) {
        *self.app_state.lock() = app;
    }

    pub fn fail_mutations(&self, message: Option<&str>) {
        *self.fail_mutations.lock() = message.map(str::to_string);
    }

    pub fn fail_show(&self, message: Option<&str>) {
        *self.fail_show.lock() = message.map(str::to_string);
    }

    pub fn fail_plans(&self, message: Option<&str>) {
        *self.fail_plans.lock() = message.map(str::to_string);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    pub fn search_calls(&self) -> Vec<Params> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Search(params) => Some(params.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn show_issue_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::ShowIssue(_)))
    }

    pub fn mutations(&self) -> Vec<IssueMutation> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Mutate(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn apply(&self, mutation: &IssueMutation) {
        let mut issues = self.issues.lock();
        match mutation {
            IssueMutation::AddComment { issue, text } => {
                if let Some(issue) = issues.get_mut(issue) {
                    let key = format!("CM{}", issue.comments.len() + 1);
                    issue.comments.push(Comment {
                        key,
                        markdown: Some(text.clone()),
                        ..Default::default()
                    });
                }
            }
            IssueMutation::EditComment { comment, text } => {
                for issue in issues.values_mut() {
                    if let Some(c) = issue.comments.iter_mut().find(|c| &c.key == comment) {
                        c.markdown = Some(text.clone());
                    }
                }
            }
            IssueMutation::DeleteComment { comment } => {
                for issue in issues.values_mut() {
                    issue.comments.retain(|c| &c.key != comment);
                }
            }
            IssueMutation::SetSeverity { issue, severity } => {
                if let Some(issue) = issues.get_mut(issue) {
                    issue.severity = Some(*severity);
                }
            }
            IssueMutation::Assign { issue, assignee } => {
                if let Some(issue) = issues.get_mut(issue) {
                    issue.assignee = assignee.clone();
                }
            }
            IssueMutation::Plan { issue, plan } => {
                if let Some(issue) = issues.get_mut(issue) {
                    issue.action_plan = plan.clone();
                }
            }
            IssueMutation::DoTransition { .. } | IssueMutation::DoAction { .. } => {}
        }
    }
}

#[async_trait]
impl IssueService for MockService {
    async fn search_issues(&self, params: &Params) -> Result<SearchResponse> {
        self.record(Call::Search(params.clone()));
        let gate = self.search_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.search_responses.lock().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(NavigatorError::Api(message)),
            None => Err(NavigatorError::Api("no scripted search response".to_string())),
        }
    }

    async fn show_issue(&self, key: &str) -> Result<Issue> {
        self.record(Call::ShowIssue(key.to_string()));
        if let Some(message) = self.fail_show.lock().clone() {
            return Err(NavigatorError::Api(message));
        }
        self.issues
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| NavigatorError::IssueNotFound(key.to_string()))
    }

    async fn filter_page(&self) -> Result<AppState> {
        self.record(Call::FilterPage);
        Ok(self.app_state.lock().clone())
    }

    async fn favorite_filters(&self) -> Result<Vec<FavoriteFilter>> {
        self.record(Call::Favorites);
        let mut favorites: Vec<_> = self.favorites.lock().values().cloned().collect();
        favorites.sort_by_key(|f| f.id);
        Ok(favorites)
    }

    async fn show_favorite_filter(&self, id: u64) -> Result<FavoriteFilter> {
        self.record(Call::ShowFavorite(id));
        self.favorites
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| NavigatorError::FilterNotFound(id.to_string()))
    }

    async fn show_rule(&self, key: &str) -> Result<Rule> {
        self.record(Call::ShowRule(key.to_string()));
        Ok(Rule {
            key: key.to_string(),
            name: Some(format!("Rule {key}")),
            desc: Some("<p>Do not do this.</p>".to_string()),
        })
    }

    async fn show_source(&self, component: &str, range: LineRange) -> Result<SourceSnippet> {
        self.record(Call::ShowSource(component.to_string(), range));
        match self.source.lock().clone() {
            Some(Ok(snippet)) => Ok(snippet),
            Some(Err(message)) => Err(NavigatorError::Api(message)),
            None => Ok(SourceSnippet::default()),
        }
    }

    async fn action_plans(&self, project: &str) -> Result<Vec<ActionPlan>> {
        self.record(Call::ActionPlans(project.to_string()));
        if let Some(message) = self.fail_plans.lock().clone() {
            return Err(NavigatorError::Api(message));
        }
        Ok(self.plans.lock().clone())
    }

    async fn search_users(&self, term: &str, _page: u32) -> Result<UserPage> {
        self.record(Call::SearchUsers(term.to_string()));
        Ok(UserPage::default())
    }

    async fn mutate(&self, mutation: &IssueMutation) -> Result<()> {
        self.record(Call::Mutate(mutation.clone()));
        if let Some(message) = self.fail_mutations.lock().clone() {
            return Err(NavigatorError::Api(message));
        }
        self.apply(mutation);
        Ok(())
    }

    async fn save_filter(&self, id: u64, query: &str) -> Result<()> {
        self.record(Call::SaveFilter(id, query.to_string()));
        Ok(())
    }
}

/// Value of `key` in recorded request params.
pub fn param<'a>(params: &'a Params, key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
