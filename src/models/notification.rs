//! Per-account notification records.

use serde::{Deserialize, Serialize};

/// A message delivered to an account, generated by system events such as a
/// visitor initiating contact with a listing owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub account_email: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: String,
}

/// Request body for recording a contact event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    /// The listing whose owner should be notified.
    pub listing_id: String,
    pub message: String,
}

/// Notification feed for one account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    pub unread: i64,
}
