//! Local/remote reconciliation policy.
//!
//! Decides what the displayed set should be for a given filter and folds
//! authoritative remote results back into the master ordering.

use std::collections::HashMap;

use crate::models::Listing;

/// The current (free text, category) filter pair.
///
/// `category: None` is the "no filter" state; the UI's "All" chip maps to it
/// at the boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub query: String,
    pub category: Option<String>,
}

impl CatalogFilter {
    /// A trivial filter selects the whole master order and needs no remote
    /// round-trip.
    pub fn is_trivial(&self) -> bool {
        self.query.trim().is_empty() && self.category.is_none()
    }
}

/// Apply the filter against the master order, locally.
///
/// Case-insensitive substring match of the query against name, category and
/// description, AND exact category match. This is what the UI shows while
/// the authoritative remote answer is in flight.
pub fn local_filter(master: &[Listing], filter: &CatalogFilter) -> Vec<Listing> {
    let needle = filter.query.trim().to_lowercase();

    master
        .iter()
        .filter(|listing| {
            let matches_category = filter
                .category
                .as_deref()
                .map(|c| listing.category == c)
                .unwrap_or(true);

            let matches_query = needle.is_empty()
                || listing.name.to_lowercase().contains(&needle)
                || listing.category.to_lowercase().contains(&needle)
                || listing
                    .description
                    .as_deref()
                    .map(|d| d.to_lowercase().contains(&needle))
                    .unwrap_or(false);

            matches_category && matches_query
        })
        .cloned()
        .collect()
}

/// Re-sort a remote result to the positions its members hold in the master
/// order, discarding the server's relevance ordering.
///
/// Members absent from the master order sort last, stably. They should not
/// normally occur; a remote result can only add such entries after a catalog
/// change the client has not reloaded yet.
pub fn merge_into_master_order(master: &[Listing], mut remote: Vec<Listing>) -> Vec<Listing> {
    let positions: HashMap<&str, usize> = master
        .iter()
        .enumerate()
        .map(|(i, l)| (l.id.as_str(), i))
        .collect();

    remote.sort_by_key(|l| positions.get(l.id.as_str()).copied().unwrap_or(usize::MAX));
    remote
}
