#[path = "common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::mock_data::search_page;
use common::{MockService, param};
use issuenav::context::NavigationContext;
use issuenav::events::{EventBus, NavigatorEvent};
use issuenav::query::{Query, SortField, Sorting};
use issuenav::search::{FetchOutcome, SearchState, SkipReason};

fn setup(page_size: u32) -> (Arc<MockService>, Arc<SearchState>, EventBus) {
    let mock = MockService::new();
    let events = EventBus::new();
    let search = Arc::new(SearchState::new(
        mock.clone(),
        NavigationContext::default(),
        events.clone(),
        page_size,
    ));
    (mock, search, events)
}

async fn wait_until_fetching(search: &SearchState) {
    while !search.is_fetching() {
        tokio::task::yield_now().await;
    }
}

fn keys(search: &SearchState) -> Vec<String> {
    search.with_results(|r| r.issues().iter().map(|i| i.key.clone()).collect())
}

// ============================================================================
// First page
// ============================================================================

#[tokio::test]
async fn test_search_requests_page_one_with_filter_and_sort() {
    let (mock, search, _events) = setup(2);
    mock.push_search(search_page(&["I1", "I2"], 1, 2, 5));

    let outcome = search
        .search(Query::new().with("statuses", "OPEN,REOPENED"))
        .await
        .unwrap();

    assert_eq!(outcome, FetchOutcome::Replaced { count: 2 });
    let params = &mock.search_calls()[0];
    assert_eq!(param(params, "statuses"), Some("OPEN,REOPENED"));
    assert_eq!(param(params, "sort"), Some("UPDATE_DATE"));
    assert_eq!(param(params, "asc"), Some("false"));
    assert_eq!(param(params, "pageIndex"), Some("1"));
    assert_eq!(param(params, "pageSize"), Some("2"));
    assert_eq!(
        search.context().query().get("statuses"),
        Some("OPEN,REOPENED")
    );
}

#[tokio::test]
async fn test_results_are_denormalized() {
    let (mock, search, _events) = setup(2);
    mock.push_search(search_page(&["I1"], 1, 2, 1));

    search.fetch_first_page().await.unwrap();

    let issue = search.with_results(|r| r.get("I1").cloned()).unwrap();
    assert_eq!(issue.component_long_name.as_deref(), Some("src/Main.java"));
    assert_eq!(issue.component_qualifier.as_deref(), Some("FIL"));
}

#[tokio::test]
async fn test_first_page_resets_to_page_one() {
    let (mock, search, _events) = setup(2);
    mock.push_search(search_page(&["I1", "I2"], 1, 2, 6));
    mock.push_search(search_page(&["I3", "I4"], 2, 2, 6));
    mock.push_search(search_page(&["I9"], 1, 2, 6));

    search.fetch_first_page().await.unwrap();
    search.fetch_next_page().await.unwrap();
    assert_eq!(search.results().page_index(), Some(2));

    let outcome = search
        .set_sorting(Sorting::new(SortField::Severity, true))
        .await
        .unwrap();

    assert_eq!(outcome, FetchOutcome::Replaced { count: 1 });
    let last = mock.search_calls().pop().unwrap();
    assert_eq!(param(&last, "pageIndex"), Some("1"));
    assert_eq!(param(&last, "sort"), Some("SEVERITY"));
    assert_eq!(param(&last, "asc"), Some("true"));
    assert_eq!(keys(&search), vec!["I9"]);
    assert_eq!(search.results().page_index(), Some(1));
    assert_eq!(search.results().sorting().field, SortField::Severity);
}

// ============================================================================
// Next page
// ============================================================================

#[tokio::test]
async fn test_next_page_appends_without_duplicates() {
    let (mock, search, events) = setup(2);
    let mut rx = events.subscribe();
    mock.push_search(search_page(&["I1", "I2"], 1, 2, 4));
    mock.push_search(search_page(&["I2", "I3"], 2, 2, 4));

    search.fetch_first_page().await.unwrap();
    let outcome = search.fetch_next_page().await.unwrap();

    assert_eq!(
        outcome,
        FetchOutcome::Appended {
            added: 1,
            page_index: 2
        }
    );
    assert_eq!(keys(&search), vec!["I1", "I2", "I3"]);
    assert_eq!(param(&mock.search_calls()[1], "pageIndex"), Some("2"));

    assert!(matches!(
        rx.try_recv(),
        Ok(NavigatorEvent::ResultsReplaced { count: 2, total: 4 })
    ));
    assert!(matches!(
        rx.try_recv(),
        Ok(NavigatorEvent::ResultsAppended {
            added: 1,
            page_index: 2
        })
    ));
}

#[tokio::test]
async fn test_next_page_before_any_results_is_skipped() {
    let (mock, search, _events) = setup(2);

    let outcome = search.fetch_next_page().await.unwrap();

    assert_eq!(outcome, FetchOutcome::Skipped(SkipReason::NotLoaded));
    assert!(mock.search_calls().is_empty());
}

#[tokio::test]
async fn test_next_page_after_last_page_is_skipped() {
    let (mock, search, _events) = setup(2);
    mock.push_search(search_page(&["I1", "I2"], 1, 2, 2));

    search.fetch_first_page().await.unwrap();
    let outcome = search.fetch_next_page().await.unwrap();

    assert_eq!(outcome, FetchOutcome::Skipped(SkipReason::LastPage));
    assert_eq!(mock.search_calls().len(), 1);
}

#[tokio::test]
async fn test_result_cap_stops_pagination() {
    let (mock, search, _events) = setup(2);
    let mut page = search_page(&["I1", "I2"], 1, 2, 50_000);
    page.max_results_reached = true;
    mock.push_search(page);

    search.fetch_first_page().await.unwrap();
    let before = search.results();
    let outcome = search.fetch_next_page().await.unwrap();

    assert_eq!(outcome, FetchOutcome::Skipped(SkipReason::ResultCapReached));
    assert_eq!(mock.search_calls().len(), 1);
    assert_eq!(search.results().issues(), before.issues());
}

#[tokio::test]
async fn test_two_rapid_next_page_calls_make_one_request() {
    let (mock, search, _events) = setup(2);
    mock.push_search(search_page(&["I1", "I2"], 1, 2, 6));
    mock.push_search(search_page(&["I3", "I4"], 2, 2, 6));
    search.fetch_first_page().await.unwrap();

    let gate = mock.hold_searches();
    let first = {
        let search = Arc::clone(&search);
        tokio::spawn(async move { search.fetch_next_page().await })
    };
    wait_until_fetching(&search).await;

    let second = search.fetch_next_page().await.unwrap();
    assert_eq!(second, FetchOutcome::Skipped(SkipReason::FetchInFlight));

    gate.notify_one();
    let first = first.await.unwrap().unwrap();

    assert_eq!(
        first,
        FetchOutcome::Appended {
            added: 2,
            page_index: 2
        }
    );
    assert_eq!(mock.search_calls().len(), 2);
    assert_eq!(keys(&search), vec!["I1", "I2", "I3", "I4"]);
}

// ============================================================================
// Failures and stale responses
// ============================================================================

#[tokio::test]
async fn test_failed_next_page_keeps_results() {
    let (mock, search, events) = setup(2);
    let mut rx = events.subscribe();
    mock.push_search(search_page(&["I1", "I2"], 1, 2, 6));
    mock.push_search_error("server exploded");

    search.fetch_first_page().await.unwrap();
    let _ = rx.try_recv();
    let result = search.fetch_next_page().await;

    assert!(result.is_err());
    assert_eq!(keys(&search), vec!["I1", "I2"]);
    assert_eq!(search.results().page_index(), Some(1));
    assert!(!search.is_fetching());
    match rx.try_recv() {
        Ok(NavigatorEvent::SearchFailed { message }) => {
            assert!(message.contains("server exploded"))
        }
        other => panic!("expected SearchFailed, got {other:?}"),
    }

    // The failed page can be retried.
    mock.push_search(search_page(&["I3"], 2, 2, 6));
    assert!(matches!(
        search.fetch_next_page().await.unwrap(),
        FetchOutcome::Appended { added: 1, .. }
    ));
}

#[tokio::test]
async fn test_failed_first_page_keeps_previous_results() {
    let (mock, search, _events) = setup(2);
    mock.push_search(search_page(&["I1"], 1, 2, 1));
    mock.push_search_error("timeout");

    search.fetch_first_page().await.unwrap();
    assert!(search.fetch_first_page().await.is_err());

    assert_eq!(keys(&search), vec!["I1"]);
    // The kept results belong to the previous query.
    assert_eq!(
        search.fetch_next_page().await.unwrap(),
        FetchOutcome::Skipped(SkipReason::NotLoaded)
    );
}

#[tokio::test]
async fn test_response_for_superseded_query_is_discarded() {
    let (mock, search, _events) = setup(2);
    mock.push_search(search_page(&["OLD"], 1, 2, 1));
    mock.push_search(search_page(&["NEW"], 1, 2, 1));
    let gate = mock.hold_searches();

    let stale = {
        let search = Arc::clone(&search);
        tokio::spawn(async move { search.fetch_first_page().await })
    };
    wait_until_fetching(&search).await;

    let current = {
        let search = Arc::clone(&search);
        tokio::spawn(async move {
            search
                .set_sorting(Sorting::new(SortField::Severity, false))
                .await
        })
    };
    while mock.search_calls().len() < 2 {
        tokio::task::yield_now().await;
    }

    gate.notify_one();
    assert_eq!(stale.await.unwrap().unwrap(), FetchOutcome::Discarded);
    assert!(search.results().is_empty());

    gate.notify_one();
    assert_eq!(
        current.await.unwrap().unwrap(),
        FetchOutcome::Replaced { count: 1 }
    );
    assert_eq!(keys(&search), vec!["NEW"]);
}

#[tokio::test]
async fn test_response_after_close_is_discarded() {
    let (mock, search, events) = setup(2);
    let mut rx = events.subscribe();
    mock.push_search(search_page(&["I1"], 1, 2, 1));
    let gate = mock.hold_searches();

    let pending = {
        let search = Arc::clone(&search);
        tokio::spawn(async move { search.fetch_first_page().await })
    };
    wait_until_fetching(&search).await;

    search.close();
    events.close();
    gate.notify_one();

    assert_eq!(pending.await.unwrap().unwrap(), FetchOutcome::Discarded);
    assert!(search.results().is_empty());
    assert!(rx.try_recv().is_err());
    assert_eq!(
        search.fetch_next_page().await.unwrap(),
        FetchOutcome::Skipped(SkipReason::Closed)
    );
    assert_eq!(
        search.fetch_first_page().await.unwrap(),
        FetchOutcome::Skipped(SkipReason::Closed)
    );
}

#[tokio::test]
async fn test_cancelled_next_page_releases_fetch() {
    let (mock, search, _events) = setup(2);
    mock.push_search(search_page(&["I1", "I2"], 1, 2, 6));
    mock.push_search(search_page(&["I3", "I4"], 2, 2, 6));
    search.fetch_first_page().await.unwrap();

    mock.hold_searches();
    let pending = {
        let search = Arc::clone(&search);
        tokio::spawn(async move { search.fetch_next_page().await })
    };
    wait_until_fetching(&search).await;

    pending.abort();
    assert!(pending.await.unwrap_err().is_cancelled());
    assert!(!search.is_fetching());

    mock.release_searches();
    assert_eq!(
        search.fetch_next_page().await.unwrap(),
        FetchOutcome::Appended {
            added: 2,
            page_index: 2
        }
    );
    assert_eq!(mock.search_calls().len(), 3);
}

#[tokio::test]
async fn test_timed_out_next_page_can_be_retried() {
    let (mock, search, _events) = setup(2);
    mock.push_search(search_page(&["I1", "I2"], 1, 2, 6));
    mock.push_search(search_page(&["I3", "I4"], 2, 2, 6));
    search.fetch_first_page().await.unwrap();

    mock.hold_searches();
    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), search.fetch_next_page()).await;
    assert!(timed_out.is_err());
    assert!(!search.is_fetching());

    mock.release_searches();
    assert!(matches!(
        search.fetch_next_page().await.unwrap(),
        FetchOutcome::Appended { added: 2, .. }
    ));
    assert_eq!(keys(&search), vec!["I1", "I2", "I3", "I4"]);
}

#[tokio::test]
async fn test_cancelled_first_page_releases_fetch() {
    let (mock, search, _events) = setup(2);
    mock.push_search(search_page(&["I1"], 1, 2, 1));

    mock.hold_searches();
    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), search.fetch_first_page()).await;
    assert!(timed_out.is_err());
    assert!(!search.is_fetching());

    mock.release_searches();
    assert_eq!(
        search.fetch_first_page().await.unwrap(),
        FetchOutcome::Replaced { count: 1 }
    );
}
