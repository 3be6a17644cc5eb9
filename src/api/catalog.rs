//! Public catalog endpoints: the initial listing collection and its facets.

use axum::extract::State;
use rand::seq::SliceRandom;

use super::{error, success, ApiResult};
use crate::models::{CategoryFacet, Listing, RevisionInfo};
use crate::AppState;

/// GET /api/catalog - The approved listing collection.
///
/// This is the seed for a client's master order. Whether the server shuffles
/// it per request is the single configurable ordering-policy point; clients
/// take the order as delivered.
pub async fn get_catalog(State(state): State<AppState>) -> ApiResult<Vec<Listing>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_active().await {
        Ok(mut listings) => {
            if state.config.shuffle_catalog {
                listings.shuffle(&mut rand::thread_rng());
            }
            success(listings, revision_id)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/catalog/categories - Derived category facets.
pub async fn get_categories(State(state): State<AppState>) -> ApiResult<Vec<CategoryFacet>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.category_facets().await {
        Ok(facets) => success(facets, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/catalog/revision - Current revision for change detection.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    match state.repo.get_revision_info().await {
        Ok(info) => {
            let revision_id = info.revision_id;
            success(info, revision_id)
        }
        Err(e) => error(e, 0),
    }
}
