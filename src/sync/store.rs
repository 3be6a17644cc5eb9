//! Catalog state store: master order and displayed set.

use rand::seq::SliceRandom;

use crate::models::Listing;

/// Ordering policy applied when a fresh server collection seeds the store.
///
/// The server owns the shuffle decision by default; `Shuffle` exists for
/// shells that receive an unshuffled collection and want display variety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderPolicy {
    /// Take the collection in the order the server delivered it.
    #[default]
    ServerOrder,
    /// Shuffle once per incoming collection.
    Shuffle,
}

/// Holds the master order established at load and the currently displayed
/// subset derived from it.
///
/// Both sequences are owned exclusively by this store; the engine mutates
/// them only through [`initialize`](CatalogStore::initialize) and
/// [`apply_filtered_set`](CatalogStore::apply_filtered_set).
#[derive(Debug, Default)]
pub struct CatalogStore {
    master_order: Vec<Listing>,
    displayed: Vec<Listing>,
    /// Signature of the last applied displayed set, the anti-flicker guard.
    last_signature: String,
    /// Bumped only when `displayed` actually changes.
    render_version: u64,
}

/// Identity signature of a listing set: sorted ids, joined.
///
/// Order-insensitive on purpose: a remote response carrying the same members
/// as the current displayed set must not count as a change.
pub fn signature<'a, I>(ids: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut ids: Vec<&str> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.join(",")
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from a server collection.
    ///
    /// Idempotent on identity: when the incoming set has the same members as
    /// the current master order, the established ordering is kept (no visible
    /// reshuffle) and only the record contents are refreshed. A different
    /// member set fully replaces the state under the given policy.
    pub fn initialize(&mut self, listings: Vec<Listing>, policy: OrderPolicy) {
        let incoming = signature(listings.iter().map(|l| l.id.as_str()));
        let current = signature(self.master_order.iter().map(|l| l.id.as_str()));

        if incoming == current && !self.master_order.is_empty() {
            // Same identity set: keep the ordering, refresh the records.
            let by_id: std::collections::HashMap<&str, &Listing> =
                listings.iter().map(|l| (l.id.as_str(), l)).collect();
            for slot in &mut self.master_order {
                if let Some(fresh) = by_id.get(slot.id.as_str()) {
                    *slot = (*fresh).clone();
                }
            }
        } else {
            let mut master = listings;
            if policy == OrderPolicy::Shuffle {
                master.shuffle(&mut rand::thread_rng());
            }
            self.master_order = master;
        }

        self.displayed = self.master_order.clone();
        self.last_signature = signature(self.displayed.iter().map(|l| l.id.as_str()));
        self.render_version += 1;
    }

    /// Replace the displayed set, unless the new set carries the same
    /// members as the last applied one.
    ///
    /// Returns whether a render-affecting change happened. The de-duplication
    /// guard is what keeps a remote response that matches the local filter
    /// result from triggering a second render.
    pub fn apply_filtered_set(&mut self, new_displayed: Vec<Listing>) -> bool {
        let sig = signature(new_displayed.iter().map(|l| l.id.as_str()));
        if sig == self.last_signature {
            return false;
        }
        self.displayed = new_displayed;
        self.last_signature = sig;
        self.render_version += 1;
        true
    }

    pub fn master_order(&self) -> &[Listing] {
        &self.master_order
    }

    pub fn displayed(&self) -> &[Listing] {
        &self.displayed
    }

    pub fn render_version(&self) -> u64 {
        self.render_version
    }
}
