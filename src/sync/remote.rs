//! The engine's remote boundary: trait and HTTP implementation.

use std::future::Future;

use serde::Deserialize;

use crate::models::Listing;

/// The four batch curation operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurationAction {
    Approve,
    Reject,
    Restore,
    Delete,
}

impl CurationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CurationAction::Approve => "approve",
            CurationAction::Reject => "reject",
            CurationAction::Restore => "restore",
            CurationAction::Delete => "delete",
        }
    }

    /// Destructive actions get the scarier confirmation dialog.
    pub fn is_destructive(&self) -> bool {
        matches!(self, CurationAction::Reject | CurationAction::Delete)
    }
}

/// The two curated collections an administrator works through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurationQueue {
    Pending,
    Trash,
}

/// A transient remote failure. Cancellation is not an error and never
/// surfaces through this type; the engine suppresses superseded responses
/// before they reach any error path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError(pub String);

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for RemoteError {}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError(err.to_string())
    }
}

/// Boundary contract the engine consumes. Implementations are external
/// collaborators; tests plug in an in-process mock.
pub trait RemoteCatalog: Send + Sync + 'static {
    /// The initial listing collection, the seed for a master order.
    fn fetch_catalog(&self) -> impl Future<Output = Result<Vec<Listing>, RemoteError>> + Send;

    /// Authoritative filtered search. The returned ordering is the server's
    /// own and is discarded by the reconciliation policy.
    fn search(
        &self,
        query: &str,
        category: Option<&str>,
    ) -> impl Future<Output = Result<Vec<Listing>, RemoteError>> + Send;

    /// One of the admin curation collections.
    fn fetch_queue(
        &self,
        queue: CurationQueue,
    ) -> impl Future<Output = Result<Vec<Listing>, RemoteError>> + Send;

    /// Execute a batch curation operation. Safe to retry on failure.
    fn batch(
        &self,
        action: CurationAction,
        ids: &[String],
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    results: Vec<Listing>,
}

/// [`RemoteCatalog`] over the crate's own REST surface.
#[derive(Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    admin_key: Option<String>,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, admin_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            admin_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_admin_key(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.admin_key {
            Some(key) => req.header(crate::auth::ADMIN_KEY_HEADER, key),
            None => req,
        }
    }

    async fn get_envelope<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, RemoteError> {
        let response = req.send().await?;
        if !response.status().is_success() {
            return Err(RemoteError(format!(
                "server responded with status {}",
                response.status()
            )));
        }
        let envelope: Envelope<T> = response.json().await?;
        if !envelope.success {
            return Err(RemoteError("server reported failure".to_string()));
        }
        Ok(envelope.data)
    }
}

impl RemoteCatalog for HttpRemote {
    async fn fetch_catalog(&self) -> Result<Vec<Listing>, RemoteError> {
        self.get_envelope(self.client.get(self.url("/api/catalog")))
            .await
    }

    async fn search(
        &self,
        query: &str,
        category: Option<&str>,
    ) -> Result<Vec<Listing>, RemoteError> {
        let mut params = vec![("q", query.to_string())];
        if let Some(cat) = category {
            params.push(("category", cat.to_string()));
        }
        let data: SearchData = self
            .get_envelope(self.client.get(self.url("/api/search")).query(&params))
            .await?;
        Ok(data.results)
    }

    async fn fetch_queue(&self, queue: CurationQueue) -> Result<Vec<Listing>, RemoteError> {
        let path = match queue {
            CurationQueue::Pending => "/api/admin/pending",
            CurationQueue::Trash => "/api/admin/trash",
        };
        self.get_envelope(self.with_admin_key(self.client.get(self.url(path))))
            .await
    }

    async fn batch(&self, action: CurationAction, ids: &[String]) -> Result<(), RemoteError> {
        let path = format!("/api/admin/batch/{}", action.as_str());
        let body = serde_json::json!({ "ids": ids });
        let _: serde_json::Value = self
            .get_envelope(
                self.with_admin_key(self.client.post(self.url(&path)))
                    .json(&body),
            )
            .await?;
        Ok(())
    }
}
