//! Data models for the Feira marketplace.
//!
//! These models match the frontend TypeScript interfaces exactly for seamless interoperability.

mod category;
mod listing;
mod notification;

pub use category::*;
pub use listing::*;
pub use notification::*;

use serde::{Deserialize, Serialize};

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
