use owo_colors::OwoColorize;

use super::{connect, print_json};
use crate::detail::assign::MIN_LOOKUP_CHARS;
use crate::display::{favorite_table, plan_table};
use crate::error::{NavigatorError, Result};
use crate::remote::Config;

pub async fn cmd_favorites(config: &Config, json: bool) -> Result<()> {
    let favorites = connect(config)?.favorite_filters().await?;
    if json {
        return print_json(&favorites);
    }
    if favorites.is_empty() {
        println!("No favorite filters.");
    } else {
        println!("{}", favorite_table(&favorites));
    }
    Ok(())
}

pub async fn cmd_plans(config: &Config, project: &str, json: bool) -> Result<()> {
    let plans = connect(config)?.action_plans(project).await?;
    if json {
        return print_json(&plans);
    }
    if plans.is_empty() {
        println!("No action plans for {project}.");
    } else {
        println!("{}", plan_table(&plans));
    }
    Ok(())
}

pub async fn cmd_users(config: &Config, term: &str) -> Result<()> {
    if term.trim().chars().count() < MIN_LOOKUP_CHARS {
        return Err(NavigatorError::Other(format!(
            "search term must have at least {MIN_LOOKUP_CHARS} characters"
        )));
    }
    let page = connect(config)?.search_users(term.trim(), 1).await?;
    for user in &page.results {
        println!("{:<20} {}", user.id.cyan(), user.text);
    }
    if page.more {
        println!("{}", "(more users match; refine the term)".dimmed());
    }
    Ok(())
}
