//! Query debouncer, request arbiter, and reconciliation orchestration.
//!
//! At most one remote search is in flight per engine. Every filter change
//! supersedes the previous one: the pending task is aborted and a generation
//! counter is bumped, and the commit path re-checks that counter so a slow
//! response that outlives its abort still lands as a no-op.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::models::Listing;
use crate::sync::pager::Pager;
use crate::sync::reconcile::{local_filter, merge_into_master_order, CatalogFilter};
use crate::sync::remote::{RemoteCatalog, RemoteError};
use crate::sync::store::{CatalogStore, OrderPolicy};

/// User-facing message for any transient remote failure.
pub const SYNC_ERROR_MESSAGE: &str = "Could not synchronize the catalog.";

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Trailing-edge debounce applied while the free-text query is non-empty.
    /// Category-only changes always act immediately.
    pub debounce: Duration,
    /// Bound on a single remote search, surfaced as a transient failure.
    pub request_timeout: Duration,
    /// Ordering policy for incoming server collections.
    pub order_policy: OrderPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(400),
            request_timeout: Duration::from_secs(12),
            order_policy: OrderPolicy::ServerOrder,
        }
    }
}

struct SyncState {
    store: CatalogStore,
    filter: CatalogFilter,
    pager: Pager,
    searching: bool,
    error: Option<String>,
    /// Cancellation signal: a response commits only if this still matches
    /// the value captured when its request was issued.
    generation: u64,
}

struct SyncInner<R> {
    remote: R,
    config: SyncConfig,
    state: Mutex<SyncState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Read-only view of the engine for rendering.
#[derive(Debug, Clone)]
pub struct SyncSnapshot {
    pub displayed: Vec<Listing>,
    pub page_items: Vec<Listing>,
    pub current_page: usize,
    pub total_pages: usize,
    pub items_per_page: usize,
    pub searching: bool,
    pub error: Option<String>,
    pub render_version: u64,
}

/// The catalog sync engine. Cheap to clone; clones share state.
pub struct CatalogSync<R: RemoteCatalog> {
    inner: Arc<SyncInner<R>>,
}

impl<R: RemoteCatalog> Clone for CatalogSync<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: RemoteCatalog> CatalogSync<R> {
    pub fn new(remote: R, config: SyncConfig) -> Self {
        Self {
            inner: Arc::new(SyncInner {
                remote,
                config,
                state: Mutex::new(SyncState {
                    store: CatalogStore::new(),
                    filter: CatalogFilter::default(),
                    pager: Pager::default(),
                    searching: false,
                    error: None,
                    generation: 0,
                }),
                task: Mutex::new(None),
            }),
        }
    }

    /// Fetch the server collection and seed the master order from it.
    pub async fn load(&self) -> Result<(), RemoteError> {
        let listings = self.inner.remote.fetch_catalog().await?;
        self.seed(listings);
        Ok(())
    }

    /// Seed the master order from an already-delivered collection (e.g. a
    /// server-rendered payload). Supersedes any in-flight search.
    pub fn seed(&self, listings: Vec<Listing>) {
        let mut st = self.inner.state.lock().unwrap();
        st.generation += 1;
        st.store.initialize(listings, self.inner.config.order_policy);
        st.searching = false;
        st.error = None;
        let filter = st.filter.clone();
        if !filter.is_trivial() {
            // Re-derive the displayed set for the active filter over the
            // fresh master order.
            let local = local_filter(st.store.master_order(), &filter);
            st.store.apply_filtered_set(local);
        }
        let shown = st.store.displayed().len();
        st.pager.repair(shown);
    }

    /// Change the free-text query.
    pub fn set_query(&self, query: &str) {
        let current = self.current_filter();
        if current.query == query {
            return;
        }
        self.apply_filter_change(CatalogFilter {
            query: query.to_string(),
            category: current.category,
        });
    }

    /// Change the category filter. `None` is the "no filter" state.
    pub fn set_category(&self, category: Option<&str>) {
        let current = self.current_filter();
        let category = category.map(str::to_string);
        if current.category == category {
            return;
        }
        self.apply_filter_change(CatalogFilter {
            query: current.query,
            category,
        });
    }

    /// Navigate to a page, clamped to the valid range.
    pub fn set_page(&self, page: usize) {
        let mut st = self.inner.state.lock().unwrap();
        let shown = st.store.displayed().len();
        st.pager.set_page(page, shown);
    }

    /// Report the viewport width; recomputes the page size and repairs the
    /// current page.
    pub fn set_viewport_width(&self, viewport_width: u32) {
        let mut st = self.inner.state.lock().unwrap();
        let shown = st.store.displayed().len();
        st.pager.set_viewport_width(viewport_width, shown);
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        let st = self.inner.state.lock().unwrap();
        let displayed = st.store.displayed().to_vec();
        SyncSnapshot {
            page_items: st.pager.page_items(&displayed).to_vec(),
            current_page: st.pager.current_page(),
            total_pages: st.pager.total_pages(displayed.len()),
            items_per_page: st.pager.items_per_page(),
            searching: st.searching,
            error: st.error.clone(),
            render_version: st.store.render_version(),
            displayed,
        }
    }

    /// Wait until the in-flight debounce/search task (if any) has finished.
    pub async fn settle(&self) {
        loop {
            let task = self.inner.task.lock().unwrap().take();
            match task {
                Some(handle) => {
                    let _ = handle.await;
                }
                None => break,
            }
        }
    }

    fn current_filter(&self) -> CatalogFilter {
        self.inner.state.lock().unwrap().filter.clone()
    }

    fn apply_filter_change(&self, new_filter: CatalogFilter) {
        let generation;
        let debounce;
        {
            let mut st = self.inner.state.lock().unwrap();
            st.filter = new_filter.clone();
            // A new filter always starts the user at the top of results.
            st.pager.reset();
            st.generation += 1;
            generation = st.generation;
        }
        debounce = if new_filter.query.trim().is_empty() {
            Duration::ZERO
        } else {
            self.inner.config.debounce
        };

        let this = self.clone();
        let mut slot = self.inner.task.lock().unwrap();
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(tokio::spawn(async move {
            this.run_update(generation, debounce).await;
        }));
    }

    async fn run_update(self, generation: u64, debounce: Duration) {
        if !debounce.is_zero() {
            tokio::time::sleep(debounce).await;
        }

        // Local pass: the UI never waits on the network for what the master
        // order can already answer.
        let filter = {
            let mut st = self.inner.state.lock().unwrap();
            if st.generation != generation {
                return;
            }
            let filter = st.filter.clone();
            let local = local_filter(st.store.master_order(), &filter);
            st.store.apply_filtered_set(local);
            let shown = st.store.displayed().len();
            st.pager.repair(shown);

            if filter.is_trivial() {
                st.searching = false;
                st.error = None;
                return;
            }
            st.searching = true;
            st.error = None;
            filter
        };

        let result = tokio::time::timeout(
            self.inner.config.request_timeout,
            self.inner
                .remote
                .search(&filter.query, filter.category.as_deref()),
        )
        .await;

        let mut st = self.inner.state.lock().unwrap();
        if st.generation != generation {
            // Superseded while in flight: no state update, no error.
            return;
        }
        st.searching = false;

        match result {
            Ok(Ok(remote_items)) => {
                let merged = merge_into_master_order(st.store.master_order(), remote_items);
                st.store.apply_filtered_set(merged);
                let shown = st.store.displayed().len();
                st.pager.repair(shown);
            }
            Ok(Err(e)) => {
                tracing::warn!("Remote search failed: {}", e);
                st.error = Some(SYNC_ERROR_MESSAGE.to_string());
            }
            Err(_) => {
                tracing::warn!("Remote search timed out");
                st.error = Some(SYNC_ERROR_MESSAGE.to_string());
            }
        }
    }
}
