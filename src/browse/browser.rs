//! Reactive search/sort/page state for a movie listing.
//!
//! The browser owns a [`SearchIntent`] and keeps a [`BrowseState`] in step
//! with it. Every setter bumps a sequence number and wakes a single
//! reconciler task. The reconciler waits out a short debounce window, reads
//! whatever the intent is by then and starts one fetch for it, so a burst of
//! setter calls produces one request. A result is applied only if its
//! sequence is still the latest one requested; anything older is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::intent::{SearchIntent, SortField, SortOrder};
use super::source::MovieSource;
use crate::models::{MovieQuery, MovieSummary};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

#[derive(Debug, Clone)]
pub struct BrowseOptions {
    pub debounce: Duration,
}

impl Default for BrowseOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Observable output of the browser.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseState {
    pub results: Vec<MovieSummary>,
    pub page: u32,
    pub total_pages: u32,
    pub total_results: u64,
    pub loading: bool,
    /// Sequence of the intent the current fields were produced for.
    pub applied_seq: u64,
    pub last_error: Option<String>,
    /// Sequence of the request `loading` refers to.
    request_seq: u64,
}

impl Default for BrowseState {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            page: 1,
            total_pages: 1,
            total_results: 0,
            loading: false,
            applied_seq: 0,
            last_error: None,
            request_seq: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct TaggedIntent {
    seq: u64,
    intent: SearchIntent,
}

pub struct MovieBrowser {
    intent_tx: Arc<watch::Sender<TaggedIntent>>,
    state_rx: watch::Receiver<BrowseState>,
    reconciler: JoinHandle<()>,
}

impl MovieBrowser {
    /// Start browsing with the default intent. The first fetch is issued
    /// right away (after the debounce window). Must be called from within a
    /// tokio runtime.
    pub fn new(source: Arc<dyn MovieSource>, options: BrowseOptions) -> Self {
        let (intent_tx, intent_rx) = watch::channel(TaggedIntent {
            seq: 1,
            intent: SearchIntent::default(),
        });
        let (state_tx, state_rx) = watch::channel(BrowseState::default());

        let intent_tx = Arc::new(intent_tx);
        let reconciler = tokio::spawn(reconcile(
            source,
            intent_rx,
            Arc::clone(&intent_tx),
            Arc::new(state_tx),
            options.debounce,
        ));

        Self {
            intent_tx,
            state_rx,
            reconciler,
        }
    }

    pub fn intent(&self) -> SearchIntent {
        self.intent_tx.borrow().intent.clone()
    }

    pub fn state(&self) -> BrowseState {
        self.state_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<BrowseState> {
        self.state_rx.clone()
    }

    /// New search text; always restarts at page 1.
    pub fn set_query(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|intent| {
            intent.query = text;
            intent.page = 1;
        });
    }

    /// Restarts at page 1, even when `field` is the current field.
    pub fn set_sort_field(&self, field: SortField) {
        self.update(|intent| {
            intent.sort_field = field;
            intent.page = 1;
        });
    }

    /// Restarts at page 1, even when `order` is the current order.
    pub fn set_sort_order(&self, order: SortOrder) {
        self.update(|intent| {
            intent.sort_order = order;
            intent.page = 1;
        });
    }

    /// Move to page `n` (at least 1) keeping query and sort.
    pub fn set_page(&self, n: u32) {
        self.update(|intent| intent.page = n.max(1));
    }

    fn update(&self, f: impl FnOnce(&mut SearchIntent)) {
        self.intent_tx.send_modify(|tagged| {
            f(&mut tagged.intent);
            tagged.seq += 1;
        });
    }

    /// Wait until the latest intent has been fetched and applied.
    pub async fn settled(&self) -> BrowseState {
        let mut state_rx = self.state_rx.clone();
        loop {
            let latest = self.intent_tx.borrow().seq;
            {
                let state = state_rx.borrow_and_update();
                if !state.loading && state.applied_seq >= latest {
                    return state.clone();
                }
            }
            if state_rx.changed().await.is_err() {
                return self.state();
            }
        }
    }
}

impl Drop for MovieBrowser {
    fn drop(&mut self) {
        self.reconciler.abort();
    }
}

/// Aborts the wrapped task when dropped, so a replaced or orphaned fetch
/// never outlives the reconciler that started it.
struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn reconcile(
    source: Arc<dyn MovieSource>,
    mut intent_rx: watch::Receiver<TaggedIntent>,
    intent_tx: Arc<watch::Sender<TaggedIntent>>,
    state_tx: Arc<watch::Sender<BrowseState>>,
    debounce: Duration,
) {
    let mut in_flight: Option<AbortOnDrop> = None;

    loop {
        if !debounce.is_zero() {
            tokio::time::sleep(debounce).await;
        }

        let TaggedIntent { seq, intent } = intent_rx.borrow_and_update().clone();

        drop(in_flight.take());

        state_tx.send_modify(|state| {
            state.loading = true;
            state.request_seq = seq;
        });
        in_flight = Some(AbortOnDrop(tokio::spawn(fetch(
            Arc::clone(&source),
            intent.to_query(),
            seq,
            Arc::clone(&intent_tx),
            Arc::clone(&state_tx),
        ))));

        if intent_rx.changed().await.is_err() {
            break;
        }
    }
}

async fn fetch(
    source: Arc<dyn MovieSource>,
    query: MovieQuery,
    seq: u64,
    intent_tx: Arc<watch::Sender<TaggedIntent>>,
    state_tx: Arc<watch::Sender<BrowseState>>,
) {
    let result = source.fetch_movies(&query).await;

    if intent_tx.borrow().seq != seq {
        debug!(seq = seq, "Discarding superseded movie page");
        // Nothing is outstanding until the reconciler starts the next request.
        state_tx.send_if_modified(|state| {
            if state.loading && state.request_seq == seq {
                state.loading = false;
                true
            } else {
                false
            }
        });
        return;
    }

    match result {
        Ok(page) => {
            let new_page = page.page;
            state_tx.send_modify(|state| {
                state.results = page.results;
                state.total_pages = page.total_pages;
                state.total_results = page.total_results;
                state.page = new_page;
                state.last_error = None;
                state.loading = false;
                state.applied_seq = seq;
            });

            // The provider may clamp the page; adopt its answer without
            // triggering another fetch.
            intent_tx.send_if_modified(|tagged| {
                if tagged.seq == seq {
                    tagged.intent.page = new_page;
                }
                false
            });
        }
        Err(e) => {
            warn!(error = %e, "Failed to fetch movies");
            state_tx.send_modify(|state| {
                state.results.clear();
                state.last_error = Some(e.to_string());
                state.loading = false;
                state.applied_seq = seq;
            });
        }
    }
}
