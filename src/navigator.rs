//! The issue navigator: routing, searching, favorites and issue detail wired
//! around one shared [`NavigationContext`].

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use crate::context::{NavigationContext, NavigationState};
use crate::detail::{ActionController, IssueDetail};
use crate::error::{NavigatorError, Result};
use crate::events::{EventBus, NavigatorEvent};
use crate::favorites::{self, FilterLinks};
use crate::query::{Query, QueryPair, Separator, Sorting, encode, route_pairs};
use crate::remote::{Config, IssueService, MergeStrategy};
use crate::results::ResultSet;
use crate::router::{DEFAULT_ROUTE, Resolved, Route, parse_route, resolve};
use crate::scroll::{ScrollListener, ScrollMetrics};
use crate::search::{FetchOutcome, SearchState};
use crate::types::AppState;

pub struct IssueNavigator {
    service: Arc<dyn IssueService>,
    context: NavigationContext,
    events: EventBus,
    search: Arc<SearchState>,
    merge: MergeStrategy,
    current_user: Option<String>,
    scroll: Mutex<Option<ScrollListener>>,
}

impl IssueNavigator {
    pub fn new(service: Arc<dyn IssueService>, config: &Config) -> Self {
        let context = NavigationContext::default();
        let events = EventBus::new();
        let search = Arc::new(SearchState::new(
            Arc::clone(&service),
            context.clone(),
            events.clone(),
            config.page_size,
        ));
        Self {
            service,
            context,
            events,
            search,
            merge: config.favorite_merge,
            current_user: config.acting_user().map(str::to_string),
            scroll: Mutex::new(None),
        }
    }

    pub fn context(&self) -> &NavigationContext {
        &self.context
    }

    pub fn state(&self) -> NavigationState {
        self.context.snapshot()
    }

    pub fn watch_state(&self) -> watch::Receiver<NavigationState> {
        self.context.subscribe()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<NavigatorEvent> {
        self.events.subscribe()
    }

    pub fn search_state(&self) -> &Arc<SearchState> {
        &self.search
    }

    pub fn results(&self) -> ResultSet {
        self.search.results()
    }

    pub fn fragment(&self) -> String {
        self.context.snapshot().fragment
    }

    /// Load the view described by a route fragment.
    ///
    /// An empty fragment navigates to the default route, which is then
    /// recorded as the current fragment.
    pub async fn navigate(&self, fragment: &str) -> Result<FetchOutcome> {
        self.ensure_open()?;
        let (fragment, route) = match parse_route(fragment)? {
            Route::Redirect(target) => {
                tracing::debug!(%target, "redirecting empty route");
                let route = parse_route(&target)?;
                (target, route)
            }
            route => (fragment.trim().trim_start_matches('#').to_string(), route),
        };

        let Route::Load { pairs, favorite } = route else {
            return Err(NavigatorError::Other(format!(
                "default route '{fragment}' redirects again"
            )));
        };
        let resolved = resolve(self.service.as_ref(), pairs, favorite, self.merge).await?;
        self.load(fragment, resolved).await
    }

    async fn load(&self, fragment: String, resolved: Resolved) -> Result<FetchOutcome> {
        let Resolved { pairs, favorite } = resolved;
        self.search.restore_sorting(Sorting::from_pairs(&pairs));
        self.context.update(|state| {
            state.query = Query::from_pairs(&pairs);
            state.fragment = fragment;
            if let Some(favorite) = favorite {
                state.favorite = Some(favorite);
                state.in_search = false;
            }
        });
        self.search.fetch_first_page().await
    }

    /// Run an ad-hoc search from the filter bar.
    pub async fn search(&self, query: Query) -> Result<FetchOutcome> {
        self.ensure_open()?;
        let fragment = route_fragment(self.favorite_id(), &query, &self.search.sorting());
        self.context.update(|state| {
            state.in_search = true;
            state.fragment = fragment;
        });
        self.search.search(query).await
    }

    pub async fn sort_by(&self, sorting: Sorting) -> Result<FetchOutcome> {
        self.ensure_open()?;
        let fragment = route_fragment(self.favorite_id(), &self.context.query(), &sorting);
        self.context.update(|state| state.fragment = fragment);
        self.search.set_sorting(sorting).await
    }

    pub async fn fetch_next_page(&self) -> Result<FetchOutcome> {
        self.search.fetch_next_page().await
    }

    pub async fn apply_favorite(&self, id: u64) -> Result<FetchOutcome> {
        self.ensure_open()?;
        let outcome = favorites::apply_favorite(&self.search, id).await;
        let fragment = route_fragment(
            self.favorite_id(),
            &self.context.query(),
            &self.search.sorting(),
        );
        self.context.update(|state| state.fragment = fragment);
        outcome
    }

    /// Drop the current favorite and go back to the default route.
    pub async fn new_search(&self) -> Result<FetchOutcome> {
        self.ensure_open()?;
        favorites::clear_favorite(&self.context);
        self.navigate(DEFAULT_ROUTE).await
    }

    /// Overwrite the current favorite with the current query.
    pub async fn save_filter(&self) -> Result<()> {
        self.ensure_open()?;
        favorites::save_current(self.service.as_ref(), &self.context, &self.search.sorting())
            .await
    }

    pub async fn refresh_app_state(&self) -> Result<AppState> {
        favorites::refresh_app_state(self.service.as_ref(), &self.context).await
    }

    pub fn filter_links(&self) -> FilterLinks {
        let state = self.context.snapshot();
        FilterLinks::new(&state.query, &self.search.sorting(), state.favorite.as_ref())
    }

    /// Load an issue with its source context and return its action
    /// controller. Refreshes done through the controller update the result
    /// list.
    pub async fn open_detail(&self, key: &str) -> Result<ActionController> {
        self.ensure_open()?;
        let known = self.search.with_results(|results| results.get(key).cloned());
        let detail = match known {
            Some(issue) => IssueDetail::load_from(self.service.as_ref(), &issue).await?,
            None => IssueDetail::load(self.service.as_ref(), key).await?,
        };
        Ok(ActionController::new(
            Arc::clone(&self.service),
            detail,
            self.current_user.clone(),
            self.events.clone(),
        )
        .with_results(Arc::clone(&self.search)))
    }

    /// Start infinite scroll, replacing any previous listener.
    pub fn attach_scroll(&self) -> Result<()> {
        self.ensure_open()?;
        let listener = ScrollListener::spawn(&self.search);
        if let Some(previous) = self.scroll.lock().replace(listener) {
            previous.detach();
        }
        Ok(())
    }

    /// Forward a scroll position to the attached listener.
    pub fn scrolled(&self, metrics: ScrollMetrics) -> bool {
        self.scroll
            .lock()
            .as_ref()
            .is_some_and(|listener| listener.notify(metrics))
    }

    pub fn detach_scroll(&self) {
        if let Some(listener) = self.scroll.lock().take() {
            listener.detach();
        }
    }

    pub fn scroll_attached(&self) -> bool {
        self.scroll
            .lock()
            .as_ref()
            .is_some_and(ScrollListener::is_attached)
    }

    /// Tear down: pending responses are dropped, subscribers stop hearing
    /// from the navigator and the scroll listener is detached.
    pub fn close(&self) {
        tracing::debug!("closing navigator");
        self.search.close();
        self.events.close();
        self.detach_scroll();
    }

    pub fn is_closed(&self) -> bool {
        self.search.is_closed()
    }

    fn favorite_id(&self) -> Option<u64> {
        self.context.snapshot().favorite.map(|f| f.id)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(NavigatorError::Closed);
        }
        Ok(())
    }
}

impl Drop for IssueNavigator {
    fn drop(&mut self) {
        self.close();
    }
}

/// Route fragment for a view, so it can be bookmarked. A loaded favorite is
/// kept as a leading `id` pair; the default sorting is omitted.
pub fn route_fragment(favorite: Option<u64>, query: &Query, sorting: &Sorting) -> String {
    let mut pairs: Vec<QueryPair> = favorite
        .map(|id| QueryPair::new("id", id.to_string()))
        .into_iter()
        .collect();
    pairs.extend(route_pairs(query, sorting));
    encode(&pairs, Separator::Route)
}
