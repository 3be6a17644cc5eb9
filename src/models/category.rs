//! Derived category facets.

use serde::{Deserialize, Serialize};

/// A `(name, count)` pair grouped over active approved listings.
///
/// Facets are recomputed from the listing table on demand and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFacet {
    pub name: String,
    pub count: i64,
}
