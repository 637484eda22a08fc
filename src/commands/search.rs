use owo_colors::OwoColorize;
use serde_json::json;

use super::{navigator, print_json};
use crate::display::{IssueJson, issue_table};
use crate::error::Result;
use crate::navigator::IssueNavigator;
use crate::remote::Config;
use crate::search::FetchOutcome;

/// Search issues for a route fragment and print up to `pages` pages.
pub async fn cmd_search(
    config: &Config,
    fragment: Option<&str>,
    pages: u32,
    json: bool,
) -> Result<()> {
    let nav = navigator(config)?;
    nav.navigate(fragment.unwrap_or("")).await?;
    load_pages(&nav, pages).await?;
    print_results(&nav, json)
}

/// Load a favorite filter and print its issues.
pub async fn cmd_filter(config: &Config, id: u64, pages: u32, json: bool) -> Result<()> {
    let nav = navigator(config)?;
    nav.apply_favorite(id).await?;
    load_pages(&nav, pages).await?;

    if !json && let Some(favorite) = nav.state().favorite {
        println!("{} {}\n", "Filter:".dimmed(), favorite.name.bold());
    }
    print_results(&nav, json)
}

async fn load_pages(nav: &IssueNavigator, pages: u32) -> Result<()> {
    for _ in 1..pages {
        if let FetchOutcome::Skipped(reason) = nav.fetch_next_page().await? {
            tracing::debug!(?reason, "stopped loading pages");
            break;
        }
    }
    Ok(())
}

fn print_results(nav: &IssueNavigator, json: bool) -> Result<()> {
    let results = nav.results();
    let total = results.paging().map(|p| p.total).unwrap_or(0);

    if json {
        return print_json(&json!({
            "fragment": nav.fragment(),
            "issues": results.issues().iter().map(IssueJson::from).collect::<Vec<_>>(),
            "paging": results.paging(),
            "maxResultsReached": results.max_results_reached(),
        }));
    }

    println!("{} {}\n", "Route:".dimmed(), nav.fragment());
    if results.is_empty() {
        println!("No issues found.");
        return Ok(());
    }

    println!("{}", issue_table(results.issues()));
    println!("\n{} of {} issue(s)", results.len(), total);
    if results.max_results_reached() {
        eprintln!(
            "{}",
            "Result limit reached; refine the filter to see more issues.".yellow()
        );
    } else if results.has_more() {
        println!("Use --pages to load more.");
    }
    Ok(())
}
