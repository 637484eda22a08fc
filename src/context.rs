//! Shared navigation state.
//!
//! The router, the header and the filter bar all read and write the same
//! state: current query, route fragment, favorite filter and the in-search
//! flag. It lives in a `watch` channel so every writer produces a new
//! snapshot (last write wins) and dependents subscribe instead of polling.

use std::sync::Arc;

use tokio::sync::watch;

use crate::query::Query;
use crate::types::{AppState, FavoriteFilter};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavigationState {
    /// Filter query driving the search
    pub query: Query,
    /// Route fragment last navigated to
    pub fragment: String,
    /// Favorite filter the current view was loaded from
    pub favorite: Option<FavoriteFilter>,
    /// Set while the user runs an ad-hoc search, cleared when a favorite is
    /// applied or saved
    pub in_search: bool,
    pub app: AppState,
}

impl NavigationState {
    /// The current favorite can be overwritten with the ad-hoc search.
    pub fn can_save(&self) -> bool {
        self.favorite.is_some() && self.in_search
    }
}

/// Handle to the shared navigation state. Cheap to clone.
#[derive(Clone)]
pub struct NavigationContext {
    tx: Arc<watch::Sender<NavigationState>>,
}

impl Default for NavigationContext {
    fn default() -> Self {
        Self::new(NavigationState::default())
    }
}

impl NavigationContext {
    pub fn new(initial: NavigationState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn snapshot(&self) -> NavigationState {
        self.tx.borrow().clone()
    }

    pub fn query(&self) -> Query {
        self.tx.borrow().query.clone()
    }

    /// Apply a change. Subscribers are notified only when the state differs
    /// afterwards. Returns whether it did.
    pub fn update(&self, f: impl FnOnce(&mut NavigationState)) -> bool {
        self.tx.send_if_modified(|state| {
            let before = state.clone();
            f(state);
            *state != before
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<NavigationState> {
        self.tx.subscribe()
    }
}
