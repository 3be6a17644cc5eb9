//! Integration tests for the Feira backend.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::search::SearchIndex;
use crate::sync::{
    CatalogSync, CurationAction, CurationQueue, CurationWorkflow, HttpRemote, OrderPolicy,
    SyncConfig,
};
use crate::{create_router, AppState};

const TEST_ADMIN_KEY: &str = "test-admin-key";

/// Test fixture for integration tests.
struct TestFixture {
    /// Plain client: what a visitor or listing owner uses.
    client: Client,
    /// Client carrying the admin PSK header.
    admin: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(Some(TEST_ADMIN_KEY.to_string())).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");
        let index_path = temp_dir.path().join("index");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        // Initialize search index
        let search = Arc::new(SearchIndex::open(&index_path).expect("Failed to init search"));

        // Create config; shuffle disabled so catalog ordering is deterministic
        let config = Config {
            admin_psk: psk,
            db_path,
            index_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            shuffle_catalog: false,
        };

        let state = AppState {
            repo,
            search,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut admin_headers = reqwest::header::HeaderMap::new();
        admin_headers.insert("x-admin-key", TEST_ADMIN_KEY.parse().unwrap());

        TestFixture {
            client: Client::new(),
            admin: Client::builder()
                .default_headers(admin_headers)
                .build()
                .unwrap(),
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Submit a listing and return its id.
    async fn submit(&self, name: &str, category: &str, owner: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/listings"))
            .json(&json!({
                "name": name,
                "category": category,
                "description": format!("{name} description"),
                "ownerEmail": owner
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Approve listings through the admin batch endpoint.
    async fn approve(&self, ids: &[&str]) {
        let resp = self
            .admin
            .post(self.url("/api/admin/batch/approve"))
            .json(&json!({ "ids": ids }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_admin_routes_require_psk() {
    let fixture = TestFixture::new().await;

    // No key
    let resp = fixture
        .client
        .get(fixture.url("/api/admin/pending"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    // Wrong key
    let resp = fixture
        .client
        .get(fixture.url("/api/admin/pending"))
        .header("x-admin-key", "wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Right key
    let resp = fixture
        .admin
        .get(fixture.url("/api/admin/pending"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Public routes never need the key
    let resp = fixture
        .client
        .get(fixture.url("/api/catalog"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_submission_enters_pending_queue_not_catalog() {
    let fixture = TestFixture::new().await;

    let id = fixture
        .submit("Casa do Pão", "Alimentação", "owner@example.com")
        .await;

    // Not in the public catalog yet
    let resp = fixture
        .client
        .get(fixture.url("/api/catalog"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());

    // But visible in the admin pending queue
    let resp = fixture
        .admin
        .get(fixture.url("/api/admin/pending"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let pending = body["data"].as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["id"], id.as_str());
    assert_eq!(pending[0]["approved"], false);

    // Pending count matches
    let resp = fixture
        .admin
        .get(fixture.url("/api/admin/pending-count"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"], 1);
}

#[tokio::test]
async fn test_approve_makes_listing_public_and_searchable() {
    let fixture = TestFixture::new().await;

    let id = fixture
        .submit("Casa do Pão", "Alimentação", "owner@example.com")
        .await;
    fixture.approve(&[id.as_str()]).await;

    let resp = fixture
        .client
        .get(fixture.url("/api/catalog"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Wait for search index to update
    tokio::time::sleep(Duration::from_millis(200)).await;

    let resp = fixture
        .client
        .get(fixture.url("/api/search?q=p%C3%A3o"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let results = body["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], id.as_str());
}

#[tokio::test]
async fn test_batch_operations_are_idempotent() {
    let fixture = TestFixture::new().await;

    let id = fixture
        .submit("Casa do Pão", "Alimentação", "owner@example.com")
        .await;

    // First approval changes one row
    let resp = fixture
        .admin
        .post(fixture.url("/api/admin/batch/approve"))
        .json(&json!({ "ids": [id] }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["affected"], 1);

    // Re-approving is a no-op, not an error
    let resp = fixture
        .admin
        .post(fixture.url("/api/admin/batch/approve"))
        .json(&json!({ "ids": [id] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["affected"], 0);

    // Unknown ids are also no-ops
    let resp = fixture
        .admin
        .post(fixture.url("/api/admin/batch/restore"))
        .json(&json!({ "ids": ["does-not-exist"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["affected"], 0);

    // An empty batch is a validation error
    let resp = fixture
        .admin
        .post(fixture.url("/api/admin/batch/approve"))
        .json(&json!({ "ids": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_trash_lifecycle() {
    let fixture = TestFixture::new().await;

    let id = fixture
        .submit("Casa do Pão", "Alimentação", "owner@example.com")
        .await;
    fixture.approve(&[id.as_str()]).await;

    // Reject into the trash
    let resp = fixture
        .admin
        .post(fixture.url("/api/admin/batch/reject"))
        .json(&json!({ "ids": [id] }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["affected"], 1);

    // Gone from the catalog and from search; detail returns 404
    let resp = fixture
        .client
        .get(fixture.url("/api/catalog"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    let resp = fixture
        .client
        .get(fixture.url("/api/search?category=Alimenta%C3%A7%C3%A3o"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["results"].as_array().unwrap().is_empty());

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/listings/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Visible in the trash view
    let resp = fixture
        .admin
        .get(fixture.url("/api/admin/trash"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Restore brings it back to the catalog (it was approved)
    let resp = fixture
        .admin
        .post(fixture.url("/api/admin/batch/restore"))
        .json(&json!({ "ids": [id] }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["affected"], 1);

    let resp = fixture
        .client
        .get(fixture.url("/api/catalog"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_permanent_delete_only_from_trash() {
    let fixture = TestFixture::new().await;

    let id = fixture
        .submit("Casa do Pão", "Alimentação", "owner@example.com")
        .await;
    fixture.approve(&[id.as_str()]).await;

    // Deleting an active listing is refused as a no-op
    let resp = fixture
        .admin
        .post(fixture.url("/api/admin/batch/delete"))
        .json(&json!({ "ids": [id] }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["affected"], 0);

    // Reject first, then the delete goes through
    fixture
        .admin
        .post(fixture.url("/api/admin/batch/reject"))
        .json(&json!({ "ids": [id] }))
        .send()
        .await
        .unwrap();

    let resp = fixture
        .admin
        .post(fixture.url("/api/admin/batch/delete"))
        .json(&json!({ "ids": [id] }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["affected"], 1);

    let resp = fixture
        .admin
        .get(fixture.url("/api/admin/trash"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_composes_query_and_category() {
    let fixture = TestFixture::new().await;

    let a = fixture
        .submit("Casa do Pão", "Alimentação", "owner@example.com")
        .await;
    let b = fixture
        .submit("Doce Vida", "Alimentação", "owner@example.com")
        .await;
    let c = fixture
        .submit("Pixel Studio", "Design", "owner@example.com")
        .await;
    fixture.approve(&[a.as_str(), b.as_str(), c.as_str()]).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    // Category only
    let resp = fixture
        .client
        .get(fixture.url("/api/search?category=Alimenta%C3%A7%C3%A3o"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 2);

    // Query AND category must both hold
    let resp = fixture
        .client
        .get(fixture.url("/api/search?q=pixel&category=Alimenta%C3%A7%C3%A3o"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["results"].as_array().unwrap().is_empty());

    // Neither filter: the full active set
    let resp = fixture
        .client
        .get(fixture.url("/api/search"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["results"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_category_facets() {
    let fixture = TestFixture::new().await;

    let a = fixture
        .submit("Casa do Pão", "Alimentação", "owner@example.com")
        .await;
    let b = fixture
        .submit("Doce Vida", "Alimentação", "owner@example.com")
        .await;
    let c = fixture
        .submit("Pixel Studio", "Design", "owner@example.com")
        .await;
    // The unapproved submission below must not count
    fixture
        .submit("Vida Verde", "Jardinagem", "owner@example.com")
        .await;
    fixture.approve(&[a.as_str(), b.as_str(), c.as_str()]).await;

    let resp = fixture
        .client
        .get(fixture.url("/api/catalog/categories"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let facets = body["data"].as_array().unwrap();
    assert_eq!(facets.len(), 2);
    assert_eq!(facets[0]["name"], "Alimentação");
    assert_eq!(facets[0]["count"], 2);
    assert_eq!(facets[1]["name"], "Design");
    assert_eq!(facets[1]["count"], 1);
}

#[tokio::test]
async fn test_view_counter_gating() {
    let fixture = TestFixture::new().await;

    let id = fixture
        .submit("Casa do Pão", "Alimentação", "owner@example.com")
        .await;
    fixture.approve(&[id.as_str()]).await;

    // Visitor bumps the counter
    let resp = fixture
        .client
        .get(fixture.url(&format!(
            "/api/listings/{}?viewer=visitor@example.com",
            id
        )))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["views"], 1);

    // Owner visit does not
    let resp = fixture
        .client
        .get(fixture.url(&format!(
            "/api/listings/{}?viewer=owner@example.com",
            id
        )))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["views"], 1);

    // Nor does an administrator visit
    let resp = fixture
        .admin
        .get(fixture.url(&format!("/api/listings/{}", id)))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["views"], 1);
}

#[tokio::test]
async fn test_unapproved_listing_visible_only_to_owner_and_admin() {
    let fixture = TestFixture::new().await;

    let id = fixture
        .submit("Casa do Pão", "Alimentação", "owner@example.com")
        .await;

    let resp = fixture
        .client
        .get(fixture.url(&format!("/api/listings/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = fixture
        .client
        .get(fixture.url(&format!(
            "/api/listings/{}?viewer=owner@example.com",
            id
        )))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    // Owner preview of an unapproved listing never counts a view
    assert_eq!(body["data"]["views"], 0);

    let resp = fixture
        .admin
        .get(fixture.url(&format!("/api/listings/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_contact_event_notifies_owner() {
    let fixture = TestFixture::new().await;

    let id = fixture
        .submit("Casa do Pão", "Alimentação", "owner@example.com")
        .await;
    fixture.approve(&[id.as_str()]).await;

    let resp = fixture
        .client
        .post(fixture.url("/api/notifications"))
        .json(&json!({
            "listingId": id,
            "message": "Someone asked about Casa do Pão"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .get(fixture.url("/api/notifications?account=owner@example.com"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["unread"], 1);
    let feed = body["data"]["notifications"].as_array().unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["read"], false);

    // Mark read
    let resp = fixture
        .client
        .put(fixture.url("/api/notifications/read?account=owner@example.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = fixture
        .client
        .get(fixture.url("/api/notifications?account=owner@example.com"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["unread"], 0);
}

#[tokio::test]
async fn test_validation_errors() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/listings"))
        .json(&json!({
            "name": "",
            "category": "Alimentação",
            "ownerEmail": "owner@example.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let resp = fixture
        .client
        .post(fixture.url("/api/listings"))
        .json(&json!({
            "name": "Casa do Pão",
            "category": "  ",
            "ownerEmail": "owner@example.com"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_batch_increments_revision_once() {
    let fixture = TestFixture::new().await;

    let a = fixture
        .submit("Casa do Pão", "Alimentação", "owner@example.com")
        .await;
    let b = fixture
        .submit("Doce Vida", "Alimentação", "owner@example.com")
        .await;

    let resp = fixture
        .client
        .get(fixture.url("/api/catalog/revision"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    let before = body["data"]["revisionId"].as_i64().unwrap();

    let resp = fixture
        .admin
        .post(fixture.url("/api/admin/batch/approve"))
        .json(&json!({ "ids": [a, b] }))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["revisionId"].as_i64().unwrap(), before + 1);
}

#[tokio::test]
async fn test_account_erasure() {
    let fixture = TestFixture::new().await;

    let id = fixture
        .submit("Casa do Pão", "Alimentação", "gone@example.com")
        .await;
    fixture.approve(&[id.as_str()]).await;
    fixture
        .client
        .post(fixture.url("/api/notifications"))
        .json(&json!({ "listingId": id, "message": "hello" }))
        .send()
        .await
        .unwrap();

    let resp = fixture
        .admin
        .delete(fixture.url("/api/admin/account?email=gone@example.com"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["affected"], 1);

    let resp = fixture
        .client
        .get(fixture.url("/api/catalog"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"].as_array().unwrap().is_empty());

    let resp = fixture
        .client
        .get(fixture.url("/api/notifications?account=gone@example.com"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["unread"], 0);
    assert!(body["data"]["notifications"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_sync_engine_against_live_server() {
    let fixture = TestFixture::new().await;

    let a = fixture
        .submit("Casa do Pão", "Alimentação", "owner@example.com")
        .await;
    let b = fixture
        .submit("Doce Vida", "Alimentação", "owner@example.com")
        .await;
    let c = fixture
        .submit("Pixel Studio", "Design", "owner@example.com")
        .await;
    fixture.approve(&[a.as_str(), b.as_str(), c.as_str()]).await;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let remote = HttpRemote::new(fixture.base_url.clone(), None);
    let engine = CatalogSync::new(
        remote,
        SyncConfig {
            debounce: Duration::from_millis(30),
            request_timeout: Duration::from_secs(5),
            order_policy: OrderPolicy::ServerOrder,
        },
    );

    engine.load().await.unwrap();
    let snap = engine.snapshot();
    assert_eq!(snap.displayed.len(), 3);
    let master_ids: Vec<String> = snap.displayed.iter().map(|l| l.id.clone()).collect();

    // Category filter narrows through the live search endpoint, preserving
    // master-order positions
    engine.set_category(Some("Alimentação"));
    engine.settle().await;
    let snap = engine.snapshot();
    assert_eq!(snap.displayed.len(), 2);
    assert!(snap.error.is_none());
    let filtered_ids: Vec<String> = snap.displayed.iter().map(|l| l.id.clone()).collect();
    let expected: Vec<String> = master_ids
        .iter()
        .filter(|id| filtered_ids.contains(id))
        .cloned()
        .collect();
    assert_eq!(filtered_ids, expected);

    // Clearing the filter restores the master order exactly
    engine.set_category(None);
    engine.settle().await;
    let snap = engine.snapshot();
    let restored: Vec<String> = snap.displayed.iter().map(|l| l.id.clone()).collect();
    assert_eq!(restored, master_ids);
}

#[tokio::test]
async fn test_curation_workflow_against_live_server() {
    let fixture = TestFixture::new().await;

    fixture
        .submit("Casa do Pão", "Alimentação", "owner@example.com")
        .await;
    fixture
        .submit("Doce Vida", "Alimentação", "owner@example.com")
        .await;

    let remote = Arc::new(HttpRemote::new(
        fixture.base_url.clone(),
        Some(TEST_ADMIN_KEY.to_string()),
    ));
    let mut workflow = CurationWorkflow::new(remote, CurationQueue::Pending, true);

    workflow.load().await.unwrap();
    assert_eq!(workflow.items().len(), 2);

    workflow.toggle_select_all();
    assert!(workflow.request(CurationAction::Approve, None));
    assert!(workflow.confirm().await);

    // Approved submissions left the pending queue and the selection cleared
    assert!(workflow.items().is_empty());
    assert!(workflow.selection().is_empty());

    let resp = fixture
        .client
        .get(fixture.url("/api/catalog"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}
