//! Infinite scroll: load the next page when the list is scrolled to the
//! bottom.
//!
//! The rendering side pushes [`ScrollMetrics`] into a [`ScrollListener`].
//! The listener runs in its own task and is detached when dropped. Bottom
//! reaches inside the throttle window are not lost: the last one fires once
//! the window closes.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::search::{FetchOutcome, SearchState};

/// Minimum delay between two bottom-reached triggers.
pub const SCROLL_THROTTLE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMetrics {
    pub offset_height: u32,
    pub scroll_top: u32,
    pub scroll_height: u32,
}

impl ScrollMetrics {
    pub fn at_bottom(&self) -> bool {
        u64::from(self.offset_height) + u64::from(self.scroll_top) >= u64::from(self.scroll_height)
    }
}

/// Lets one trigger through per interval.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// When the next trigger will be let through.
    pub fn next_ready(&self) -> Option<Instant> {
        self.last.map(|last| last + self.interval)
    }

    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

pub struct ScrollListener {
    tx: mpsc::UnboundedSender<ScrollMetrics>,
    task: JoinHandle<()>,
}

impl ScrollListener {
    /// Start listening for `search`. Must be called inside a tokio runtime.
    pub fn spawn(search: &Arc<SearchState>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_listener(rx, Arc::downgrade(search)));
        Self { tx, task }
    }

    /// Report a scroll position. Returns false once detached.
    pub fn notify(&self, metrics: ScrollMetrics) -> bool {
        !self.task.is_finished() && self.tx.send(metrics).is_ok()
    }

    pub fn detach(&self) {
        self.task.abort();
    }

    pub fn is_attached(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for ScrollListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_listener(mut rx: mpsc::UnboundedReceiver<ScrollMetrics>, search: Weak<SearchState>) {
    let mut throttle = Throttle::new(SCROLL_THROTTLE);
    // A bottom reach that arrived while throttled
    let mut trailing = false;

    loop {
        let deadline = throttle.next_ready().unwrap_or_else(Instant::now);
        tokio::select! {
            received = rx.recv() => {
                let Some(metrics) = received else {
                    break;
                };
                if !metrics.at_bottom() {
                    trailing = false;
                    continue;
                }
                if !throttle.ready(Instant::now()) {
                    trailing = true;
                    continue;
                }
            }
            _ = tokio::time::sleep_until(deadline), if trailing => {
                throttle.ready(Instant::now());
            }
        }
        trailing = false;

        let Some(search) = search.upgrade() else {
            break;
        };
        if search.is_closed() {
            break;
        }
        match search.fetch_next_page().await {
            Ok(FetchOutcome::Skipped(reason)) => {
                tracing::debug!(?reason, "scroll reached bottom, nothing to load");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("failed to load next page: {e}"),
        }
    }
}
