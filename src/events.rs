//! Engine notifications for the rendering side.
//!
//! Subscribers get an unbounded receiver each. Closing the bus drops every
//! sender, so a torn-down view stops receiving and later emits go nowhere.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::detail::actions::FormKind;

#[derive(Debug, Clone, PartialEq)]
pub enum NavigatorEvent {
    /// A first page replaced the result set.
    ResultsReplaced { count: usize, total: u64 },
    /// A following page was appended.
    ResultsAppended { added: usize, page_index: u32 },
    /// A search fetch failed; previous results are unchanged.
    SearchFailed { message: String },
    /// An issue was re-fetched after an action.
    IssueRefreshed { key: String },
    /// An action on an issue failed; the issue is unchanged.
    ActionFailed { key: String, message: String },
    /// The open action form changed (`None` means idle).
    FormChanged { key: String, form: Option<FormKind> },
}

#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<NavigatorEvent>>>>,
    closed: Arc<AtomicBool>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<NavigatorEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        if !self.is_closed() {
            self.subscribers.lock().push(tx);
        }
        rx
    }

    /// Deliver to every live subscriber, pruning dropped receivers.
    pub fn emit(&self, event: NavigatorEvent) {
        if self.is_closed() {
            return;
        }
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.subscribers.lock().clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
