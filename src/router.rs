//! Route fragment resolution.
//!
//! A fragment is the route-encoded pair list (`statuses=OPEN|sort=SEVERITY`).
//! An empty fragment redirects to [`DEFAULT_ROUTE`]; a fragment carrying an
//! `id` pair is merged with that favorite's stored query first.

use crate::error::{NavigatorError, Result};
use crate::favorites::stored_pairs;
use crate::query::{QueryPair, Separator, decode};
use crate::remote::{IssueService, MergeStrategy};
use crate::types::FavoriteFilter;

pub const DEFAULT_ROUTE: &str = "statuses=OPEN,REOPENED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Navigate to this fragment instead.
    Redirect(String),
    Load {
        pairs: Vec<QueryPair>,
        favorite: Option<u64>,
    },
}

/// Parse a fragment without touching the server.
pub fn parse_route(fragment: &str) -> Result<Route> {
    let fragment = fragment.trim().trim_start_matches('#');
    let pairs = decode(fragment, Separator::Route);
    if pairs.is_empty() {
        return Ok(Route::Redirect(DEFAULT_ROUTE.to_string()));
    }

    let favorite = match pairs.iter().find(|p| p.key == "id") {
        Some(pair) => {
            let raw = pair.value.as_deref().unwrap_or_default();
            let id = raw
                .parse::<u64>()
                .map_err(|_| NavigatorError::InvalidFilterId(raw.to_string()))?;
            Some(id)
        }
        None => None,
    };
    Ok(Route::Load { pairs, favorite })
}

/// Combine a favorite's stored pairs with the explicit route pairs.
pub fn merge_pairs(
    stored: &[QueryPair],
    explicit: &[QueryPair],
    strategy: MergeStrategy,
) -> Vec<QueryPair> {
    let mut merged = stored.to_vec();
    match strategy {
        MergeStrategy::Positional => {
            for (i, pair) in explicit.iter().enumerate() {
                match merged.get_mut(i) {
                    Some(slot) => *slot = pair.clone(),
                    None => merged.push(pair.clone()),
                }
            }
        }
        MergeStrategy::ByKey => {
            for pair in explicit {
                match merged.iter_mut().find(|s| s.key == pair.key) {
                    Some(slot) => *slot = pair.clone(),
                    None => merged.push(pair.clone()),
                }
            }
        }
    }
    merged
}

/// Pairs to load plus the favorite they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub pairs: Vec<QueryPair>,
    pub favorite: Option<FavoriteFilter>,
}

/// Resolve the pairs of a [`Route::Load`], fetching the favorite it names.
pub async fn resolve(
    service: &dyn IssueService,
    pairs: Vec<QueryPair>,
    favorite: Option<u64>,
    strategy: MergeStrategy,
) -> Result<Resolved> {
    let Some(id) = favorite else {
        return Ok(Resolved {
            pairs,
            favorite: None,
        });
    };

    let filter = service.show_favorite_filter(id).await?;
    let merged = merge_pairs(&stored_pairs(&filter), &pairs, strategy);
    tracing::debug!(id, ?strategy, pairs = merged.len(), "merged favorite route");
    Ok(Resolved {
        pairs: merged,
        favorite: Some(filter),
    })
}
