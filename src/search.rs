//! Filter / sort / paging state machine.
//!
//! Every first-page fetch starts a new generation. Responses are applied only
//! when their generation is still current, so a response for an older query
//! or sort can never land in the result set, and pages of one generation are
//! requested strictly one at a time.
//!
//! The lock is never held across a remote call; operations can be driven
//! concurrently from several tasks.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::NavigationContext;
use crate::error::Result;
use crate::events::{EventBus, NavigatorEvent};
use crate::query::{Query, QueryPair, Sorting};
use crate::remote::{IssueService, Params};
use crate::results::{ResultSet, denormalize};
use crate::types::Issue;

/// Why a next-page request was not issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ResultCapReached,
    FetchInFlight,
    NotLoaded,
    LastPage,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Replaced { count: usize },
    Appended { added: usize, page_index: u32 },
    Skipped(SkipReason),
    /// The response arrived for a superseded generation or after close.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    generation: u64,
    page_index: u32,
}

#[derive(Debug, Default)]
struct SearchInner {
    sorting: Sorting,
    results: ResultSet,
    generation: u64,
    /// Generation the current results were loaded for
    loaded_generation: Option<u64>,
    in_flight: Option<InFlight>,
    closed: bool,
}

/// Owns the in-flight marker of one fetch. Dropping the fetch future before
/// its response is settled releases the marker, so a cancelled request never
/// blocks later pages.
struct InFlightGuard<'a> {
    inner: &'a Mutex<SearchInner>,
    ticket: InFlight,
    armed: bool,
}

impl<'a> InFlightGuard<'a> {
    fn new(inner: &'a Mutex<SearchInner>, ticket: InFlight) -> Self {
        Self {
            inner,
            ticket,
            armed: true,
        }
    }

    /// Settle the response under the already held lock.
    fn settle(mut self, inner: &mut SearchInner) -> bool {
        self.armed = false;
        SearchState::settle(inner, self.ticket)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.inner.lock();
        if inner.in_flight == Some(self.ticket) {
            tracing::debug!(
                generation = self.ticket.generation,
                page = self.ticket.page_index,
                "search request cancelled"
            );
            inner.in_flight = None;
        }
    }
}

pub struct SearchState {
    service: Arc<dyn IssueService>,
    context: NavigationContext,
    events: EventBus,
    page_size: u32,
    inner: Mutex<SearchInner>,
}

impl SearchState {
    pub fn new(
        service: Arc<dyn IssueService>,
        context: NavigationContext,
        events: EventBus,
        page_size: u32,
    ) -> Self {
        Self {
            service,
            context,
            events,
            page_size,
            inner: Mutex::new(SearchInner::default()),
        }
    }

    /// Request parameters: filter fields, then sort, then paging.
    pub fn request_params(
        query: &Query,
        sorting: &Sorting,
        page_index: u32,
        page_size: u32,
    ) -> Params {
        let mut params: Params = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        params.extend(
            sorting
                .to_pairs()
                .into_iter()
                .filter_map(|QueryPair { key, value }| value.map(|v| (key, v))),
        );
        params.push(("pageIndex".to_string(), page_index.to_string()));
        params.push(("pageSize".to_string(), page_size.to_string()));
        params
    }

    /// Load page 1 for the current query and sorting, replacing the results.
    pub async fn fetch_first_page(&self) -> Result<FetchOutcome> {
        let (ticket, params) = {
            let mut inner = self.inner.lock();
            if inner.closed {
                return Ok(FetchOutcome::Skipped(SkipReason::Closed));
            }
            inner.generation += 1;
            let ticket = InFlight {
                generation: inner.generation,
                page_index: 1,
            };
            inner.in_flight = Some(ticket);
            let params =
                Self::request_params(&self.context.query(), &inner.sorting, 1, self.page_size);
            (ticket, params)
        };
        let guard = InFlightGuard::new(&self.inner, ticket);

        tracing::debug!(generation = ticket.generation, "fetching first page");
        let response = self.service.search_issues(&params).await;

        let mut inner = self.inner.lock();
        if !guard.settle(&mut inner) {
            return Ok(FetchOutcome::Discarded);
        }

        match response {
            Ok(response) => {
                let page = denormalize(response);
                let total = page.paging.total;
                let sorting = inner.sorting.clone();
                inner.results.replace(page, sorting);
                inner.loaded_generation = Some(ticket.generation);
                let count = inner.results.len();
                drop(inner);

                self.events
                    .emit(NavigatorEvent::ResultsReplaced { count, total });
                Ok(FetchOutcome::Replaced { count })
            }
            Err(e) => {
                drop(inner);
                self.events.emit(NavigatorEvent::SearchFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Load the page after the last loaded one and append it.
    ///
    /// Does nothing when the result cap was reached, a fetch is outstanding,
    /// the loaded results belong to an older query, or the last page is
    /// already loaded.
    pub async fn fetch_next_page(&self) -> Result<FetchOutcome> {
        let (ticket, params) = {
            let mut inner = self.inner.lock();
            if let Some(reason) = Self::next_page_blocker(&inner) {
                tracing::debug!(?reason, "next page skipped");
                return Ok(FetchOutcome::Skipped(reason));
            }
            let page_index = inner.results.page_index().unwrap_or(0) + 1;
            let ticket = InFlight {
                generation: inner.generation,
                page_index,
            };
            inner.in_flight = Some(ticket);
            let params = Self::request_params(
                &self.context.query(),
                &inner.sorting,
                page_index,
                self.page_size,
            );
            (ticket, params)
        };
        let guard = InFlightGuard::new(&self.inner, ticket);

        tracing::debug!(page = ticket.page_index, "fetching next page");
        let response = self.service.search_issues(&params).await;

        let mut inner = self.inner.lock();
        if !guard.settle(&mut inner) {
            return Ok(FetchOutcome::Discarded);
        }

        match response {
            Ok(response) => {
                let page = denormalize(response);
                let page_index = page.paging.page_index;
                let added = inner.results.append(page);
                drop(inner);

                self.events
                    .emit(NavigatorEvent::ResultsAppended { added, page_index });
                Ok(FetchOutcome::Appended { added, page_index })
            }
            Err(e) => {
                drop(inner);
                self.events.emit(NavigatorEvent::SearchFailed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn next_page_blocker(inner: &SearchInner) -> Option<SkipReason> {
        if inner.closed {
            return Some(SkipReason::Closed);
        }
        if inner.results.max_results_reached() {
            return Some(SkipReason::ResultCapReached);
        }
        if inner.in_flight.is_some() {
            return Some(SkipReason::FetchInFlight);
        }
        if inner.loaded_generation != Some(inner.generation) {
            return Some(SkipReason::NotLoaded);
        }
        if !inner.results.has_more() {
            return Some(SkipReason::LastPage);
        }
        None
    }

    /// Clear the outstanding marker owned by `ticket`. Returns whether the
    /// response may still be applied.
    fn settle(inner: &mut SearchInner, ticket: InFlight) -> bool {
        if inner.in_flight == Some(ticket) {
            inner.in_flight = None;
        }
        if inner.closed || inner.generation != ticket.generation {
            tracing::debug!(
                generation = ticket.generation,
                page = ticket.page_index,
                "discarding stale search response"
            );
            return false;
        }
        true
    }

    /// Replace the query in the shared context and reload page 1.
    pub async fn search(&self, query: Query) -> Result<FetchOutcome> {
        self.context.update(|state| state.query = query);
        self.fetch_first_page().await
    }

    pub async fn set_sorting(&self, sorting: Sorting) -> Result<FetchOutcome> {
        self.inner.lock().sorting = sorting;
        self.fetch_first_page().await
    }

    /// Set sorting without fetching; used while restoring a route.
    pub fn restore_sorting(&self, sorting: Sorting) {
        self.inner.lock().sorting = sorting;
    }

    pub fn sorting(&self) -> Sorting {
        self.inner.lock().sorting.clone()
    }

    /// Snapshot of the current results.
    pub fn results(&self) -> ResultSet {
        self.inner.lock().results.clone()
    }

    /// Run `f` against the results without cloning them.
    pub fn with_results<R>(&self, f: impl FnOnce(&ResultSet) -> R) -> R {
        f(&self.inner.lock().results)
    }

    pub fn is_fetching(&self) -> bool {
        self.inner.lock().in_flight.is_some()
    }

    /// Swap a refreshed issue into the results. No-op after close.
    pub fn replace_issue(&self, issue: Issue) -> bool {
        let mut inner = self.inner.lock();
        if inner.closed {
            return false;
        }
        inner.results.replace_issue(issue)
    }

    /// Make every outstanding and future fetch inert.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.in_flight = None;
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    pub fn context(&self) -> &NavigationContext {
        &self.context
    }

    pub fn service(&self) -> &Arc<dyn IssueService> {
        &self.service
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::SortField;

    #[test]
    fn test_request_params_merge_filter_sort_and_paging() {
        let query = Query::new()
            .with("statuses", "OPEN,REOPENED")
            .with("severities", "BLOCKER");
        let sorting = Sorting::new(SortField::Severity, true);

        let params = SearchState::request_params(&query, &sorting, 3, 50);
        let as_str: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            as_str,
            vec![
                ("severities", "BLOCKER"),
                ("statuses", "OPEN,REOPENED"),
                ("sort", "SEVERITY"),
                ("asc", "true"),
                ("pageIndex", "3"),
                ("pageSize", "50"),
            ]
        );
    }
}
