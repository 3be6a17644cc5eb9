//! Shared fixtures for the sync engine tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::models::Listing;
use crate::sync::remote::{CurationAction, CurationQueue, RemoteCatalog, RemoteError};

pub fn listing(id: &str) -> Listing {
    listing_in(id, &format!("Listing {id}"), "General", None)
}

pub fn listing_in(id: &str, name: &str, category: &str, description: Option<&str>) -> Listing {
    Listing {
        id: id.to_string(),
        name: name.to_string(),
        category: category.to_string(),
        description: description.map(str::to_string),
        phone: None,
        whatsapp: None,
        instagram: None,
        tiktok: None,
        email: None,
        website: None,
        image: None,
        approved: true,
        suspended: false,
        deleted_at: None,
        views: 0,
        owner_email: "owner@example.com".to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
        updated_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

/// In-process remote with controllable latency and failure injection.
///
/// Search results come back in reverse catalog order, standing in for a
/// server relevance ranking that differs from the client's master order.
pub struct MockRemote {
    items: Mutex<Vec<Listing>>,
    search_delay: Mutex<Duration>,
    fail_search: AtomicBool,
    fail_batch: AtomicBool,
    pub search_calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
}

impl MockRemote {
    pub fn new(items: Vec<Listing>) -> Self {
        Self {
            items: Mutex::new(items),
            search_delay: Mutex::new(Duration::ZERO),
            fail_search: AtomicBool::new(false),
            fail_batch: AtomicBool::new(false),
            search_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_search_delay(&self, delay: Duration) {
        *self.search_delay.lock().unwrap() = delay;
    }

    pub fn fail_searches(&self) {
        self.fail_search.store(true, Ordering::SeqCst);
    }

    pub fn fail_batches(&self) {
        self.fail_batch.store(true, Ordering::SeqCst);
    }

    pub fn search_call_count(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    fn matching(&self, query: &str, category: Option<&str>) -> Vec<Listing> {
        let needle = query.trim().to_lowercase();
        let mut matches: Vec<Listing> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|l| {
                let by_category = category.map(|c| l.category == c).unwrap_or(true);
                let by_query = needle.is_empty()
                    || l.name.to_lowercase().contains(&needle)
                    || l.category.to_lowercase().contains(&needle)
                    || l.description
                        .as_deref()
                        .map(|d| d.to_lowercase().contains(&needle))
                        .unwrap_or(false);
                by_category && by_query
            })
            .cloned()
            .collect();
        matches.reverse();
        matches
    }
}

impl RemoteCatalog for MockRemote {
    async fn fetch_catalog(&self) -> Result<Vec<Listing>, RemoteError> {
        Ok(self.items.lock().unwrap().clone())
    }

    async fn search(
        &self,
        query: &str,
        category: Option<&str>,
    ) -> Result<Vec<Listing>, RemoteError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.search_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(RemoteError("search unavailable".to_string()));
        }
        Ok(self.matching(query, category))
    }

    async fn fetch_queue(&self, _queue: CurationQueue) -> Result<Vec<Listing>, RemoteError> {
        Ok(self.items.lock().unwrap().clone())
    }

    async fn batch(&self, action: CurationAction, ids: &[String]) -> Result<(), RemoteError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_batch.load(Ordering::SeqCst) {
            return Err(RemoteError("batch unavailable".to_string()));
        }
        if matches!(action, CurationAction::Delete | CurationAction::Reject) {
            self.items
                .lock()
                .unwrap()
                .retain(|l| !ids.contains(&l.id));
        }
        Ok(())
    }
}
