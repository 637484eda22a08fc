//! Builders for issues, search responses and favorites.

use issuenav::types::{
    Comment, ComponentRef, FavoriteFilter, Issue, IssueStatus, Paging, SearchResponse, Severity,
};

/// Builder for test issues
pub struct IssueBuilder {
    issue: Issue,
}

impl IssueBuilder {
    pub fn new(key: &str) -> Self {
        Self {
            issue: Issue {
                key: key.to_string(),
                component: Some("org:proj:src/Main.java".to_string()),
                project: Some("org:proj".to_string()),
                rule: Some("squid:S1234".to_string()),
                severity: Some(Severity::Major),
                status: Some(IssueStatus::Open),
                message: Some(format!("Message of {key}")),
                ..Default::default()
            },
        }
    }

    pub fn component(mut self, component: &str) -> Self {
        self.issue.component = Some(component.to_string());
        self
    }

    pub fn line(mut self, line: u32) -> Self {
        self.issue.line = Some(line);
        self
    }

    pub fn severity(mut self, severity: Severity) -> Self {
        self.issue.severity = Some(severity);
        self
    }

    pub fn assignee(mut self, login: &str) -> Self {
        self.issue.assignee = Some(login.to_string());
        self
    }

    pub fn action_plan(mut self, plan: &str) -> Self {
        self.issue.action_plan = Some(plan.to_string());
        self
    }

    pub fn comment(mut self, key: &str, markdown: &str) -> Self {
        self.issue.comments.push(Comment {
            key: key.to_string(),
            markdown: Some(markdown.to_string()),
            updatable: true,
            ..Default::default()
        });
        self
    }

    pub fn build(self) -> Issue {
        self.issue
    }
}

/// A search response holding `keys` as page `page_index`.
pub fn search_page(keys: &[&str], page_index: u32, page_size: u32, total: u64) -> SearchResponse {
    SearchResponse {
        issues: keys.iter().map(|k| IssueBuilder::new(k).build()).collect(),
        components: vec![ComponentRef {
            key: "org:proj:src/Main.java".to_string(),
            long_name: Some("src/Main.java".to_string()),
            qualifier: Some("FIL".to_string()),
            ..Default::default()
        }],
        projects: Vec::new(),
        rules: Vec::new(),
        paging: Paging {
            page_index,
            page_size,
            total,
            pages: None,
        },
        max_results_reached: false,
    }
}

pub fn favorite(id: u64, name: &str, query: &str) -> FavoriteFilter {
    FavoriteFilter {
        id,
        name: name.to_string(),
        query: Some(query.to_string()),
        can_modify: true,
        ..Default::default()
    }
}
