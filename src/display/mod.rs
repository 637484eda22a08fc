use owo_colors::OwoColorize;

use crate::types::{IssueStatus, Severity};

pub mod issue;

pub use issue::*;

pub fn format_severity_colored(severity: Severity) -> String {
    let badge = format!("[{severity}]");
    match severity {
        Severity::Blocker => badge.red().bold().to_string(),
        Severity::Critical => badge.red().to_string(),
        Severity::Major => badge.yellow().to_string(),
        Severity::Minor => badge.green().to_string(),
        Severity::Info => badge.dimmed().to_string(),
    }
}

pub fn format_status_colored(status: IssueStatus) -> String {
    let label = status.to_string();
    match status {
        IssueStatus::Open | IssueStatus::Reopened => label.cyan().to_string(),
        IssueStatus::Confirmed => label.magenta().to_string(),
        IssueStatus::Resolved => label.green().to_string(),
        IssueStatus::Closed => label.dimmed().to_string(),
    }
}

/// Cut `text` to `max` characters, ending with an ellipsis when cut.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{kept}…")
}
