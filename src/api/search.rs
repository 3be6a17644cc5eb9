//! Search API endpoints.

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use super::{error, success, ApiResult};
use crate::models::Listing;
use crate::AppState;

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Free-text query string. May be empty.
    #[serde(default)]
    pub q: String,
    /// Exact category filter. Absent or empty means "no filter".
    #[serde(default)]
    pub category: Option<String>,
    /// Maximum number of results (default: 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

/// Search result with listings and metadata.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<Listing>,
    pub total: usize,
}

/// Maximum number of search results allowed.
const MAX_SEARCH_LIMIT: usize = 500;

/// GET /api/search - Authoritative filtered view of the active catalog.
///
/// Free text and category compose with AND semantics. With neither present
/// the full active set is returned, so the endpoint is total over all filter
/// states a client can be in.
pub async fn search_listings(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let limit = params.limit.clamp(1, MAX_SEARCH_LIMIT);
    let query = params.q.trim();
    let category = params
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    if query.is_empty() && category.is_none() {
        return match state.repo.list_active().await {
            Ok(listings) => {
                let total = listings.len();
                success(
                    SearchResponse {
                        results: listings,
                        total,
                    },
                    revision_id,
                )
            }
            Err(e) => error(e, revision_id),
        };
    }

    let search_results = match state.search.search(query, category, limit) {
        Ok(results) => results,
        Err(e) => return error(e, revision_id),
    };

    // Hydrate in relevance order. Entries that vanished from the database
    // between commit and query are skipped rather than failing the request.
    let mut results = Vec::new();
    for sr in search_results {
        if let Ok(Some(listing)) = state.repo.get_listing(&sr.listing_id).await {
            if listing.is_active() {
                results.push(listing);
            }
        }
    }

    let total = results.len();

    success(SearchResponse { results, total }, revision_id)
}
