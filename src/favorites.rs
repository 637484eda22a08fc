//! Favorite filters: applying, saving, and the header links around them.

use crate::context::NavigationContext;
use crate::error::{NavigatorError, Result};
use crate::query::{Query, QueryPair, Separator, Sorting, decode, encode, route_pairs};
use crate::remote::IssueService;
use crate::search::{FetchOutcome, SearchState};
use crate::types::{AppState, FavoriteFilter};

/// Decoded route pairs of a favorite's stored query.
pub fn stored_pairs(favorite: &FavoriteFilter) -> Vec<QueryPair> {
    favorite
        .query
        .as_deref()
        .map(|q| decode(q, Separator::Route))
        .unwrap_or_default()
}

/// Replace the current query with the favorite's stored query and load
/// page 1.
pub async fn apply_favorite(search: &SearchState, id: u64) -> Result<FetchOutcome> {
    let favorite = search.service().show_favorite_filter(id).await?;
    tracing::debug!(id, name = %favorite.name, "applying favorite filter");

    let pairs = stored_pairs(&favorite);
    search.restore_sorting(Sorting::from_pairs(&pairs));
    search.context().update(|state| {
        state.query = Query::from_pairs(&pairs);
        state.favorite = Some(favorite);
        state.in_search = false;
    });
    search.fetch_first_page().await
}

/// Fetch permissions and favorites into the shared context.
pub async fn refresh_app_state(
    service: &dyn IssueService,
    context: &NavigationContext,
) -> Result<AppState> {
    let app = service.filter_page().await?;
    context.update(|state| state.app = app.clone());
    Ok(app)
}

/// Overwrite the current favorite with the current query and sorting.
pub async fn save_current(
    service: &dyn IssueService,
    context: &NavigationContext,
    sorting: &Sorting,
) -> Result<()> {
    let snapshot = context.snapshot();
    let favorite = snapshot
        .favorite
        .ok_or_else(|| NavigatorError::Other("no favorite filter is loaded".to_string()))?;

    let query = encode(&route_pairs(&snapshot.query, sorting), Separator::Request);
    service.save_filter(favorite.id, &query).await?;
    context.update(|state| state.in_search = false);
    Ok(())
}

/// Drop the current favorite. Callers then navigate to the default route.
pub fn clear_favorite(context: &NavigationContext) {
    context.update(|state| {
        state.favorite = None;
        state.in_search = false;
    });
}

/// Relative URLs of the filter forms hosted by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterLinks {
    pub save_as: String,
    pub copy: Option<String>,
    pub edit: Option<String>,
}

impl FilterLinks {
    /// Copy and edit are offered only for a loaded favorite; edit only when
    /// the user may modify it.
    pub fn new(query: &Query, sorting: &Sorting, favorite: Option<&FavoriteFilter>) -> Self {
        let encoded = encode(&route_pairs(query, sorting), Separator::Request);
        let save_as = if encoded.is_empty() {
            "/issues/save_as_form".to_string()
        } else {
            format!("/issues/save_as_form?{encoded}")
        };
        Self {
            save_as,
            copy: favorite.map(|f| format!("/issues/copy_form/{}", f.id)),
            edit: favorite
                .filter(|f| f.can_modify)
                .map(|f| format!("/issues/edit_form/{}", f.id)),
        }
    }
}
