//! Listing submission and detail endpoints.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::auth::is_admin_request;
use crate::errors::AppError;
use crate::models::{CreateListingRequest, Listing, UpdateListingRequest};
use crate::AppState;

/// Query parameters for the listing detail endpoint.
#[derive(Debug, Deserialize)]
pub struct ViewerQuery {
    /// Account identity of the viewer, supplied by the identity layer.
    #[serde(default)]
    pub viewer: Option<String>,
}

/// POST /api/listings - Submit a new listing.
///
/// Submissions always enter the curation queue unapproved.
pub async fn create_listing(
    State(state): State<AppState>,
    Json(request): Json<CreateListingRequest>,
) -> ApiResult<Listing> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.name.trim().is_empty() {
        return error(
            AppError::Validation("Name is required".to_string()),
            revision_id,
        );
    }
    if request.category.trim().is_empty() {
        return error(
            AppError::Validation("Category is required".to_string()),
            revision_id,
        );
    }
    if request.owner_email.trim().is_empty() {
        return error(
            AppError::Validation("Owner identity is required".to_string()),
            revision_id,
        );
    }

    match state.repo.create_listing(&request).await {
        Ok(listing) => {
            // Not indexed yet: unapproved listings are invisible to search.
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(listing, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/listings/:id - Single listing detail.
///
/// Trashed listings are gone from the public surface. Unapproved listings
/// are visible only to their owner and administrators. A visit by anyone
/// else to an approved listing bumps the view counter.
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<ViewerQuery>,
    headers: HeaderMap,
) -> ApiResult<Listing> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let listing = match state.repo.get_listing(&id).await {
        Ok(Some(listing)) => listing,
        Ok(None) => {
            return error(
                AppError::NotFound(format!("Listing {} not found", id)),
                revision_id,
            )
        }
        Err(e) => return error(e, revision_id),
    };

    if listing.deleted_at.is_some() {
        return error(
            AppError::NotFound(format!("Listing {} not found", id)),
            revision_id,
        );
    }

    let is_admin = is_admin_request(&state.config.admin_psk, &headers);
    let is_owner = params
        .viewer
        .as_deref()
        .map(|v| v == listing.owner_email)
        .unwrap_or(false);

    if !listing.approved && !is_owner && !is_admin {
        return error(
            AppError::NotFound(format!("Listing {} not found", id)),
            revision_id,
        );
    }

    let mut listing = listing;
    if listing.approved && !is_owner && !is_admin {
        if let Err(e) = state.repo.increment_views(&listing.id).await {
            tracing::warn!("Failed to count view for {}: {}", listing.id, e);
        } else {
            listing.views += 1;
        }
    }

    success(listing, revision_id)
}

/// PUT /api/listings/:id - Edit listing content fields.
pub async fn update_listing(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateListingRequest>,
) -> ApiResult<Listing> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return error(
                AppError::Validation("Name cannot be empty".to_string()),
                revision_id,
            );
        }
    }
    if let Some(category) = &request.category {
        if category.trim().is_empty() {
            return error(
                AppError::Validation("Category cannot be empty".to_string()),
                revision_id,
            );
        }
    }

    match state.repo.update_listing(&id, &request).await {
        Ok(listing) => {
            // Keep the index in step with the edited content
            if let Err(e) = state.search.index_listing(&listing).await {
                tracing::warn!("Failed to re-index listing: {}", e);
            }

            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(listing, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}
