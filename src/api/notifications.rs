//! Notification endpoints.
//!
//! Notifications are owned by accounts; the catalog sync engine never touches
//! them. The only producer here is the contact event a visitor triggers from
//! a listing page.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::{error, success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateNotificationRequest, Notification, NotificationFeed};
use crate::AppState;

/// Query parameters identifying the account.
#[derive(Debug, Deserialize)]
pub struct AccountQuery {
    pub account: String,
}

/// GET /api/notifications - An account's feed, newest first.
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(params): Query<AccountQuery>,
) -> ApiResult<NotificationFeed> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    let notifications = match state.repo.list_notifications(&params.account).await {
        Ok(list) => list,
        Err(e) => return error(e, revision_id),
    };
    let unread = match state.repo.unread_count(&params.account).await {
        Ok(n) => n,
        Err(e) => return error(e, revision_id),
    };

    success(
        NotificationFeed {
            notifications,
            unread,
        },
        revision_id,
    )
}

/// POST /api/notifications - Record a contact event for a listing's owner.
pub async fn create_notification(
    State(state): State<AppState>,
    Json(request): Json<CreateNotificationRequest>,
) -> ApiResult<Notification> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    if request.message.trim().is_empty() {
        return error(
            AppError::Validation("Message is required".to_string()),
            revision_id,
        );
    }

    let listing = match state.repo.get_listing(&request.listing_id).await {
        Ok(Some(listing)) => listing,
        Ok(None) => {
            return error(
                AppError::NotFound(format!("Listing {} not found", request.listing_id)),
                revision_id,
            )
        }
        Err(e) => return error(e, revision_id),
    };

    match state
        .repo
        .create_notification(&listing.owner_email, &request.message)
        .await
    {
        Ok(notification) => {
            let new_revision = state.repo.get_revision_id().await.unwrap_or(revision_id);
            success(notification, new_revision)
        }
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/notifications/read - Mark all of an account's notifications read.
pub async fn mark_notifications_read(
    State(state): State<AppState>,
    Query(params): Query<AccountQuery>,
) -> ApiResult<u64> {
    let revision_id = state.repo.get_revision_id().await.unwrap_or(0);

    match state.repo.mark_notifications_read(&params.account).await {
        Ok(count) => success(count, revision_id),
        Err(e) => error(e, revision_id),
    }
}
