use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::types::{Severity, VALID_SEVERITIES};

#[derive(Parser)]
#[command(name = "issuenav")]
#[command(about = "Browse and triage code-quality issues")]
#[command(version)]
pub struct Cli {
    /// Config file (default: config.yaml in the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search issues with a route fragment (e.g. 'severities=BLOCKER|sort=SEVERITY')
    #[command(visible_alias = "s")]
    Search {
        /// Route fragment; empty loads the default open/reopened view
        fragment: Option<String>,

        /// Number of pages to load
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show an issue with its source context
    Show {
        /// Issue key
        key: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the rule an issue violates
    Rule {
        /// Issue key
        key: String,
    },

    /// Add a comment to an issue
    Comment {
        /// Issue key
        key: String,

        /// Comment text (markdown)
        text: String,
    },

    /// Replace the text of a comment
    EditComment {
        /// Issue key
        key: String,

        /// Comment key
        comment: String,

        /// New comment text (markdown)
        text: String,
    },

    /// Delete a comment
    DeleteComment {
        /// Issue key
        key: String,

        /// Comment key
        comment: String,
    },

    /// Assign an issue; without a login the issue is unassigned
    Assign {
        /// Issue key
        key: String,

        /// Login of the new assignee
        login: Option<String>,

        /// Assign to the current user
        #[arg(long, conflicts_with = "login")]
        me: bool,
    },

    /// Change the severity of an issue
    Severity {
        /// Issue key
        key: String,

        /// INFO, MINOR, MAJOR, CRITICAL or BLOCKER (case-insensitive)
        #[arg(value_parser = parse_severity)]
        severity: Severity,
    },

    /// Put an issue in an action plan; without a plan it is removed from its plan
    Plan {
        /// Issue key
        key: String,

        /// Action plan key or name
        plan: Option<String>,
    },

    /// List the action plans of a project
    Plans {
        /// Project key
        project: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply a workflow transition (e.g. confirm, resolve, reopen)
    Transition {
        /// Issue key
        key: String,

        /// Transition name
        name: String,
    },

    /// Run a plugin action on an issue
    Action {
        /// Issue key
        key: String,

        /// Action key
        action: String,
    },

    /// List favorite filters
    Favorites {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load the issues of a favorite filter
    Filter {
        /// Favorite filter id
        id: u64,

        /// Number of pages to load
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        pages: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search users for assignment
    Users {
        /// Search term (at least 2 characters)
        term: String,
    },
}

fn parse_severity(s: &str) -> Result<Severity, String> {
    s.parse().map_err(|_| {
        format!(
            "Invalid severity. Must be one of: {}",
            VALID_SEVERITIES.join(", ")
        )
    })
}
