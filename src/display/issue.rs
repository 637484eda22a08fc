use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::detail::IssueDetail;
use crate::types::{ActionPlan, FavoriteFilter, Issue, Rule, SourceSnippet};

use super::{format_severity_colored, format_status_colored, truncate};

const MESSAGE_WIDTH: usize = 60;

/// JSON output view of an issue, carrying the labels resolved from the
/// search response next to the wire fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueJson<'a> {
    #[serde(flatten)]
    issue: &'a Issue,
    #[serde(skip_serializing_if = "Option::is_none")]
    component_long_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    component_qualifier: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_long_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rule_name: Option<&'a str>,
}

impl<'a> From<&'a Issue> for IssueJson<'a> {
    fn from(issue: &'a Issue) -> Self {
        Self {
            issue,
            component_long_name: issue.component_long_name.as_deref(),
            component_qualifier: issue.component_qualifier.as_deref(),
            project_long_name: issue.project_long_name.as_deref(),
            rule_name: issue.rule_name.as_deref(),
        }
    }
}

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Line")]
    line: String,
    #[tabled(rename = "Assignee")]
    assignee: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&Issue> for IssueRow {
    fn from(issue: &Issue) -> Self {
        Self {
            key: issue.key.clone(),
            severity: issue.severity.map(|s| s.to_string()).unwrap_or_default(),
            status: issue.status.map(|s| s.to_string()).unwrap_or_default(),
            component: issue.component_label().to_string(),
            line: issue.line.map(|l| l.to_string()).unwrap_or_default(),
            assignee: issue.assignee.clone().unwrap_or_default(),
            message: truncate(issue.message.as_deref().unwrap_or(""), MESSAGE_WIDTH),
        }
    }
}

pub fn issue_table(issues: &[Issue]) -> Table {
    let mut table = Table::new(issues.iter().map(IssueRow::from));
    table.with(Style::rounded());
    table
}

#[derive(Tabled)]
struct FavoriteRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Owner")]
    user: String,
    #[tabled(rename = "Shared")]
    shared: String,
}

pub fn favorite_table(favorites: &[FavoriteFilter]) -> Table {
    let rows = favorites.iter().map(|f| FavoriteRow {
        id: f.id,
        name: f.name.clone(),
        user: f.user.clone().unwrap_or_default(),
        shared: if f.shared { "yes" } else { "" }.to_string(),
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Deadline")]
    dead_line: String,
}

pub fn plan_table(plans: &[ActionPlan]) -> Table {
    let rows = plans.iter().map(|p| PlanRow {
        key: p.key.clone(),
        name: p.name.clone(),
        status: p.status.clone().unwrap_or_default(),
        dead_line: p.dead_line.clone().unwrap_or_default(),
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table
}

/// Print an issue with its comments, available actions and source context.
pub fn print_issue_detail(detail: &IssueDetail) {
    let issue = &detail.issue;

    let severity = issue
        .severity
        .map(format_severity_colored)
        .unwrap_or_default();
    let status = issue.status.map(format_status_colored).unwrap_or_default();
    println!("{} {} {}", issue.key.cyan().bold(), severity, status);
    if let Some(resolution) = &issue.resolution {
        println!("Resolution: {resolution}");
    }
    println!("{}", issue.message.as_deref().unwrap_or("(no message)"));
    println!();

    let location = match issue.line {
        Some(line) => format!("{}:{line}", issue.component_label()),
        None => issue.component_label().to_string(),
    };
    print_field("Component", &location);
    print_field("Rule", issue.rule_label());
    print_field("Assignee", issue.assignee.as_deref().unwrap_or("(unassigned)"));
    if let Some(plan) = &issue.action_plan {
        print_field("Action plan", plan);
    }
    if let Some(author) = &issue.author {
        print_field("Author", author);
    }
    if let Some(created) = &issue.creation_date {
        print_field("Created", created);
    }
    if let Some(updated) = &issue.update_date {
        print_field("Updated", updated);
    }
    if !issue.transitions.is_empty() {
        print_field("Transitions", &issue.transitions.join(", "));
    }
    if !issue.actions.is_empty() {
        print_field("Actions", &issue.actions.join(", "));
    }

    if !issue.comments.is_empty() {
        println!();
        println!("{}", "Comments".bold());
        for comment in &issue.comments {
            let who = comment
                .user_name
                .as_deref()
                .or(comment.login.as_deref())
                .unwrap_or("unknown");
            let when = comment.created_at.as_deref().unwrap_or("");
            println!("  {} {} {}", comment.key.dimmed(), who.yellow(), when.dimmed());
            let text = comment
                .markdown
                .as_deref()
                .or(comment.html_text.as_deref())
                .unwrap_or("");
            for line in text.lines() {
                println!("    {line}");
            }
        }
    }

    if let Some(source) = &detail.source {
        println!();
        print_source(source, issue.line);
    }
}

fn print_field(name: &str, value: &str) {
    println!("{:>12}: {}", name.dimmed(), value);
}

/// Source lines with blame, the issue line highlighted.
pub fn print_source(source: &SourceSnippet, highlight: Option<u32>) {
    for line in &source.lines {
        let blame = source
            .scm
            .iter()
            .find(|s| s.line == line.line)
            .and_then(|s| s.author.as_deref())
            .unwrap_or("");
        let number = format!("{:>5}", line.line);
        let author = format!("{:<12}", truncate(blame, 12));
        if Some(line.line) == highlight {
            println!("{} {} {}", number.red().bold(), author.dimmed(), line.code.bold());
        } else {
            println!("{} {} {}", number.dimmed(), author.dimmed(), line.code);
        }
    }
}

pub fn print_rule(rule: &Rule) {
    println!(
        "{} {}",
        rule.key.cyan().bold(),
        rule.name.as_deref().unwrap_or("")
    );
    if let Some(desc) = &rule.desc {
        println!();
        println!("{desc}");
    }
}
