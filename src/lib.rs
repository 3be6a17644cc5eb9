//! Feira Marketplace Backend
//!
//! A production-grade REST backend with SQLite persistence and Tantivy full-text search,
//! plus the client-side catalog sync engine embedded by front-end shells.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod search;
pub mod sync;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use db::Repository;
use search::SearchIndex;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub search: Arc<SearchIndex>,
    pub config: Arc<Config>,
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Clone PSK for the auth layer
    let psk = state.config.admin_psk.clone();

    // Administrator curation routes, behind the PSK layer
    let admin_routes = Router::new()
        .route("/admin/pending", get(api::list_pending))
        .route("/admin/pending-count", get(api::pending_count))
        .route("/admin/trash", get(api::list_trash))
        .route("/admin/batch/approve", post(api::batch_approve))
        .route("/admin/batch/reject", post(api::batch_reject))
        .route("/admin/batch/restore", post(api::batch_restore))
        .route("/admin/batch/delete", post(api::batch_delete))
        .route("/admin/account", delete(api::delete_account))
        .layer(middleware::from_fn(move |req, next| {
            auth::admin_psk_layer(psk.clone(), req, next)
        }));

    // Public routes
    let public_routes = Router::new()
        // Catalog
        .route("/catalog", get(api::get_catalog))
        .route("/catalog/categories", get(api::get_categories))
        .route("/catalog/revision", get(api::get_revision))
        // Search
        .route("/search", get(api::search_listings))
        // Listings
        .route("/listings", post(api::create_listing))
        .route("/listings/{id}", get(api::get_listing))
        .route("/listings/{id}", put(api::update_listing))
        // Notifications
        .route("/notifications", get(api::list_notifications))
        .route("/notifications", post(api::create_notification))
        .route("/notifications/read", put(api::mark_notifications_read));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", public_routes.merge(admin_routes))
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
