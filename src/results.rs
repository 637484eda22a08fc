//! Search results and denormalization of raw search responses.
//!
//! A search response carries issues alongside the components, projects and
//! rules they reference. Denormalization copies display names from those
//! reference lists onto each issue. A reference that is missing from the
//! lists is left as the raw key with no display field; that is not an error.

use std::collections::{HashMap, HashSet};

use crate::query::Sorting;
use crate::types::{ComponentRef, Issue, Paging, ProjectRef, RuleRef, SearchResponse};

/// One page of denormalized issues.
#[derive(Debug, Clone)]
pub struct Page {
    pub issues: Vec<Issue>,
    pub paging: Paging,
    pub max_results_reached: bool,
}

/// Resolve component, project and rule references of every issue using only
/// the lists bundled in the same response.
pub fn denormalize(response: SearchResponse) -> Page {
    let components: HashMap<&str, &ComponentRef> = response
        .components
        .iter()
        .map(|c| (c.key.as_str(), c))
        .collect();
    let projects: HashMap<&str, &ProjectRef> = response
        .projects
        .iter()
        .map(|p| (p.key.as_str(), p))
        .collect();
    let rules: HashMap<&str, &RuleRef> = response
        .rules
        .iter()
        .map(|r| (r.key.as_str(), r))
        .collect();

    let issues = response
        .issues
        .into_iter()
        .map(|mut issue| {
            if let Some(component) = issue.component.as_deref().and_then(|k| components.get(k)) {
                issue.component_long_name = component.long_name.clone();
                issue.component_qualifier = component.qualifier.clone();
            }
            if let Some(project) = issue.project.as_deref().and_then(|k| projects.get(k)) {
                issue.project_long_name = project.long_name.clone();
            }
            if let Some(rule) = issue.rule.as_deref().and_then(|k| rules.get(k)) {
                issue.rule_name = rule.name.clone();
            }
            issue
        })
        .collect();

    Page {
        issues,
        paging: response.paging,
        max_results_reached: response.max_results_reached,
    }
}

/// Ordered issues of the current search, in server page order.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    issues: Vec<Issue>,
    keys: HashSet<String>,
    paging: Option<Paging>,
    max_results_reached: bool,
    sorting: Sorting,
}

impl ResultSet {
    pub fn new(sorting: Sorting) -> Self {
        Self {
            sorting,
            ..Default::default()
        }
    }

    /// Replace the whole sequence with a first page.
    pub fn replace(&mut self, page: Page, sorting: Sorting) {
        self.keys = page.issues.iter().map(|i| i.key.clone()).collect();
        self.issues = page.issues;
        self.paging = Some(page.paging);
        self.max_results_reached = page.max_results_reached;
        self.sorting = sorting;
    }

    /// Append a following page, skipping keys already present.
    ///
    /// Returns the number of issues actually appended.
    pub fn append(&mut self, page: Page) -> usize {
        let before = self.issues.len();
        for issue in page.issues {
            if self.keys.insert(issue.key.clone()) {
                self.issues.push(issue);
            }
        }
        self.paging = Some(page.paging);
        self.max_results_reached = page.max_results_reached;
        self.issues.len() - before
    }

    /// Swap the entry with the same key, keeping its position.
    pub fn replace_issue(&mut self, issue: Issue) -> bool {
        match self.issues.iter_mut().find(|i| i.key == issue.key) {
            Some(slot) => {
                *slot = issue;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.issues.clear();
        self.keys.clear();
        self.paging = None;
        self.max_results_reached = false;
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn get(&self, key: &str) -> Option<&Issue> {
        self.issues.iter().find(|i| i.key == key)
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn paging(&self) -> Option<&Paging> {
        self.paging.as_ref()
    }

    pub fn page_index(&self) -> Option<u32> {
        self.paging.map(|p| p.page_index)
    }

    pub fn max_results_reached(&self) -> bool {
        self.max_results_reached
    }

    pub fn sorting(&self) -> &Sorting {
        &self.sorting
    }

    /// Whether another page may be requested.
    ///
    /// The result-cap flag stops pagination whatever the reported total.
    pub fn has_more(&self) -> bool {
        if self.max_results_reached {
            return false;
        }
        self.paging.is_some_and(|p| !p.is_last_page())
    }
}
