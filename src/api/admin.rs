//! Administrator curation endpoints.
//!
//! All routes in this module sit behind the admin PSK layer. The four batch
//! operations are idempotent from the client's perspective: re-applying a
//! transition an id has already made is a no-op, not an error.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{BatchIdsRequest, BatchOutcome, Listing};
use crate::AppState;

/// GET /api/admin/pending - Submissions awaiting approval.
pub async fn list_pending(State(state): State<AppState>) -> ApiResult<Vec<Listing>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_pending().await {
        Ok(listings) => success(listings, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/admin/pending-count - Dashboard badge count.
pub async fn pending_count(State(state): State<AppState>) -> ApiResult<i64> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.pending_count().await {
        Ok(count) => success(count, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/admin/trash - Trashed listings.
pub async fn list_trash(State(state): State<AppState>) -> ApiResult<Vec<Listing>> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.list_trashed().await {
        Ok(listings) => success(listings, revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/admin/batch/approve - Approve pending submissions.
pub async fn batch_approve(
    State(state): State<AppState>,
    Json(request): Json<BatchIdsRequest>,
) -> ApiResult<BatchOutcome> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.ids.is_empty() {
        return error(
            AppError::Validation("No ids provided".to_string()),
            revision_id,
        );
    }

    match state.repo.batch_approve(&request.ids).await {
        Ok(affected) => {
            // Newly approved listings become searchable
            for id in &request.ids {
                if let Ok(Some(listing)) = state.repo.get_listing(id).await {
                    if let Err(e) = state.search.index_listing(&listing).await {
                        tracing::warn!("Failed to index listing {}: {}", id, e);
                    }
                }
            }

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(BatchOutcome { affected }, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/admin/batch/reject - Move listings to the trash.
pub async fn batch_reject(
    State(state): State<AppState>,
    Json(request): Json<BatchIdsRequest>,
) -> ApiResult<BatchOutcome> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.ids.is_empty() {
        return error(
            AppError::Validation("No ids provided".to_string()),
            revision_id,
        );
    }

    match state.repo.batch_reject(&request.ids).await {
        Ok(affected) => {
            for id in &request.ids {
                if let Err(e) = state.search.remove_listing(id).await {
                    tracing::warn!("Failed to de-index listing {}: {}", id, e);
                }
            }

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(BatchOutcome { affected }, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/admin/batch/restore - Restore listings from the trash.
pub async fn batch_restore(
    State(state): State<AppState>,
    Json(request): Json<BatchIdsRequest>,
) -> ApiResult<BatchOutcome> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.ids.is_empty() {
        return error(
            AppError::Validation("No ids provided".to_string()),
            revision_id,
        );
    }

    match state.repo.batch_restore(&request.ids).await {
        Ok(affected) => {
            // Restored listings re-enter search only if they are active again
            for id in &request.ids {
                if let Ok(Some(listing)) = state.repo.get_listing(id).await {
                    if let Err(e) = state.search.index_listing(&listing).await {
                        tracing::warn!("Failed to re-index listing {}: {}", id, e);
                    }
                }
            }

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(BatchOutcome { affected }, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/admin/batch/delete - Permanently delete trashed listings.
pub async fn batch_delete(
    State(state): State<AppState>,
    Json(request): Json<BatchIdsRequest>,
) -> ApiResult<BatchOutcome> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.ids.is_empty() {
        return error(
            AppError::Validation("No ids provided".to_string()),
            revision_id,
        );
    }

    match state.repo.batch_delete(&request.ids).await {
        Ok(affected) => {
            for id in &request.ids {
                if let Err(e) = state.search.remove_listing(id).await {
                    tracing::warn!("Failed to de-index listing {}: {}", id, e);
                }
            }

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(BatchOutcome { affected }, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// Query parameters for account erasure.
#[derive(Debug, Deserialize)]
pub struct EraseAccountQuery {
    pub email: String,
}

/// DELETE /api/admin/account - Erase an account's listings and notifications.
pub async fn delete_account(
    State(state): State<AppState>,
    Query(params): Query<EraseAccountQuery>,
) -> ApiResult<BatchOutcome> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if params.email.trim().is_empty() {
        return error(
            AppError::Validation("Email is required".to_string()),
            revision_id,
        );
    }

    // Collect ids first so the index can be cleaned after the rows go
    let owned_ids: Vec<String> = match state.repo.list_active().await {
        Ok(listings) => listings
            .into_iter()
            .filter(|l| l.owner_email == params.email)
            .map(|l| l.id)
            .collect(),
        Err(e) => return error(e, revision_id),
    };

    match state.repo.delete_account_data(&params.email).await {
        Ok(affected) => {
            for id in &owned_ids {
                if let Err(e) = state.search.remove_listing(id).await {
                    tracing::warn!("Failed to de-index listing {}: {}", id, e);
                }
            }

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(BatchOutcome { affected }, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
