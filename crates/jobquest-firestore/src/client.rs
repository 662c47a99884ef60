//! Firestore REST API client.
//!
//! - Service-account tokens cached with a refresh margin
//! - One transparent re-auth when Firestore reports an expired token
//! - Exponential backoff with jitter on retryable failures
//! - A `firestore_request` span and request metrics per call
//!
//! Setting `FIRESTORE_EMULATOR_HOST` routes all traffic to a local emulator
//! over plain HTTP with the emulator's `owner` token.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Serialize;
use tracing::{debug, info_span, Instrument};

use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::{record_list_returned, record_request};
use crate::retry::{with_retry, RetryConfig};
use crate::token_cache::TokenCache;
use crate::types::{
    BatchGetDocumentsRequest, BatchGetDocumentsResponse, BatchWriteRequest, BatchWriteResponse,
    Document, ListDocumentsResponse, RunQueryRequest, RunQueryResponse, StructuredQuery, Value,
    Write,
};

/// Firestore caps a single batchWrite at 500 writes.
const MAX_BATCH_WRITES: usize = 500;

/// Firestore caps a single batchGet at 100 documents.
const MAX_BATCH_GET: usize = 100;

/// Page size used when draining a whole collection.
const LIST_PAGE_SIZE: u32 = 300;

/// Token the Firestore emulator accepts for admin access.
const EMULATOR_TOKEN: &str = "owner";

const NO_BODY: Option<&()> = None;

// =============================================================================
// Configuration
// =============================================================================

/// Firestore client configuration.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// GCP project ID
    pub project_id: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// `host:port` of a Firestore emulator, if one is used
    pub emulator_host: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// Retry configuration
    pub retry: RetryConfig,
}

impl FirestoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> FirestoreResult<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .or_else(|_| std::env::var("FIREBASE_PROJECT_ID"))
            .map_err(|_| {
                FirestoreError::auth_error(
                    "GCP_PROJECT_ID or FIREBASE_PROJECT_ID must be set to access Firestore",
                )
            })?;

        if project_id.trim().is_empty() {
            return Err(FirestoreError::auth_error(
                "GCP_PROJECT_ID or FIREBASE_PROJECT_ID cannot be empty",
            ));
        }

        let secs = |name: &str, default: u64| {
            std::env::var(name)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default)
        };

        Ok(Self {
            project_id,
            database_id: std::env::var("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            emulator_host: std::env::var("FIRESTORE_EMULATOR_HOST")
                .ok()
                .filter(|h| !h.trim().is_empty()),
            timeout: Duration::from_secs(secs("FIRESTORE_TIMEOUT_SECS", 30)),
            connect_timeout: Duration::from_secs(secs("FIRESTORE_CONNECT_TIMEOUT_SECS", 5)),
            retry: RetryConfig::from_env(),
        })
    }

    fn root_url(&self) -> String {
        match &self.emulator_host {
            Some(host) if host.starts_with("http://") || host.starts_with("https://") => {
                host.trim_end_matches('/').to_string()
            }
            Some(host) => format!("http://{}", host),
            None => "https://firestore.googleapis.com".to_string(),
        }
    }

    /// Resource prefix shared by every document name.
    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database_id
        )
    }
}

enum Credentials {
    Emulator,
    ServiceAccount(TokenCache),
}

// =============================================================================
// Client
// =============================================================================

/// Firestore REST API client.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    config: FirestoreConfig,
    base_url: String,
    credentials: Arc<Credentials>,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    pub async fn new(config: FirestoreConfig) -> FirestoreResult<Self> {
        let credentials = if config.emulator_host.is_some() {
            debug!("Using Firestore emulator at {}", config.root_url());
            Credentials::Emulator
        } else {
            Credentials::ServiceAccount(TokenCache::new(Self::create_auth_provider()?))
        };

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("jobquest-firestore/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FirestoreError::Network)?;

        let base_url = format!("{}/v1/{}", config.root_url(), config.documents_root());

        Ok(Self {
            http,
            config,
            base_url,
            credentials: Arc::new(credentials),
        })
    }

    fn create_auth_provider() -> FirestoreResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            FirestoreError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => Err(FirestoreError::auth_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    /// Create from environment variables.
    pub async fn from_env() -> FirestoreResult<Self> {
        let config = FirestoreConfig::from_env()?;
        Self::new(config).await
    }

    /// Build full document name for batch operations and preconditions.
    pub fn full_document_name(&self, collection: &str, doc_id: &str) -> String {
        format!("{}/{}/{}", self.config.documents_root(), collection, doc_id)
    }

    fn document_url(&self, collection: &str, doc_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            collection,
            urlencoding::encode(doc_id)
        )
    }

    // =========================================================================
    // Transport
    // =========================================================================

    async fn token(&self) -> FirestoreResult<String> {
        match self.credentials.as_ref() {
            Credentials::Emulator => Ok(EMULATOR_TOKEN.to_string()),
            Credentials::ServiceAccount(cache) => cache.get_token().await,
        }
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    /// Send an authorized request, re-authenticating once on an expired token.
    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> FirestoreResult<Response> {
        let build = |token: &str| {
            let request = self.http.request(method.clone(), url).bearer_auth(token);
            match body {
                Some(b) => request.json(b),
                None => request,
            }
        };

        let response = build(&self.token().await?).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let Credentials::ServiceAccount(cache) = self.credentials.as_ref() else {
            return Err(FirestoreError::from_http_status(401, format!("{} failed: {}", url, text)));
        };
        if !Self::is_access_token_expired(&text) {
            return Err(FirestoreError::from_http_status(401, format!("{} failed: {}", url, text)));
        }

        debug!("Access token rejected as expired, refreshing");
        cache.invalidate().await;
        Ok(build(&self.token().await?).send().await?)
    }

    /// Run one logical operation with retry, tracing and metrics.
    async fn execute_request<T, F, Fut>(
        &self,
        operation: &str,
        collection: &str,
        doc_id: Option<&str>,
        op: F,
    ) -> FirestoreResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = FirestoreResult<T>>,
    {
        let span = match doc_id {
            Some(id) => info_span!("firestore_request", operation = %operation, collection = %collection, doc_id = %id),
            None => info_span!("firestore_request", operation = %operation, collection = %collection),
        };

        let start = Instant::now();
        let result = with_retry(&self.config.retry, operation, op)
            .instrument(span)
            .await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn error_from(url: &str, response: Response) -> FirestoreError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        FirestoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }

    /// Read a JSON array body, as returned by the streaming RPCs.
    async fn json_array<T: serde::de::DeserializeOwned>(
        rpc: &str,
        response: Response,
    ) -> FirestoreResult<Vec<T>> {
        let body = response.text().await.unwrap_or_default();
        serde_json::from_str(&body).map_err(|e| {
            let prefix: String = body.chars().take(200).collect();
            FirestoreError::invalid_response(format!(
                "Failed to parse {} response: {} (body prefix: {})",
                rpc, e, prefix
            ))
        })
    }

    // =========================================================================
    // CRUD Operations
    // =========================================================================

    /// Get a document. Missing documents are `None`.
    pub async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> FirestoreResult<Option<Document>> {
        let url = self.document_url(collection, doc_id);
        let url = url.as_str();

        self.execute_request("get_document", collection, Some(doc_id), || async move {
            let response = self.send(Method::GET, url, NO_BODY).await?;
            match response.status() {
                StatusCode::OK => Ok(Some(response.json().await?)),
                StatusCode::NOT_FOUND => Ok(None),
                _ => Err(Self::error_from(url, response).await),
            }
        })
        .await
    }

    /// Create a document. Fails with `AlreadyExists` if the id is taken.
    pub async fn create_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
    ) -> FirestoreResult<Document> {
        let url = format!(
            "{}/{}?documentId={}",
            self.base_url,
            collection,
            urlencoding::encode(doc_id)
        );
        let body = &Document::new(fields);
        let url = url.as_str();

        self.execute_request("create_document", collection, Some(doc_id), || async move {
            let response = self.send(Method::POST, url, Some(body)).await?;
            match response.status() {
                StatusCode::OK | StatusCode::CREATED => Ok(response.json().await?),
                StatusCode::CONFLICT => Err(FirestoreError::AlreadyExists(format!(
                    "{}/{}",
                    collection, doc_id
                ))),
                _ => Err(Self::error_from(url, response).await),
            }
        })
        .await
    }

    /// Update a document. With a mask only the listed fields are touched.
    pub async fn update_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
        update_mask: Option<Vec<String>>,
    ) -> FirestoreResult<Document> {
        let mut params = vec!["currentDocument.exists=true".to_string()];
        for field in update_mask.iter().flatten() {
            params.push(format!("updateMask.fieldPaths={}", urlencoding::encode(field)));
        }
        let url = format!("{}?{}", self.document_url(collection, doc_id), params.join("&"));
        let body = &Document::new(fields);
        let url = url.as_str();

        self.execute_request("update_document", collection, Some(doc_id), || async move {
            let response = self.send(Method::PATCH, url, Some(body)).await?;
            match response.status() {
                StatusCode::OK => Ok(response.json().await?),
                // The exists precondition surfaces as 404 or 400 FAILED_PRECONDITION
                StatusCode::NOT_FOUND => Err(FirestoreError::not_found(format!(
                    "{}/{}",
                    collection, doc_id
                ))),
                _ => match Self::error_from(url, response).await {
                    FirestoreError::RequestFailed(msg) if msg.contains("FAILED_PRECONDITION") => {
                        Err(FirestoreError::not_found(format!("{}/{}", collection, doc_id)))
                    }
                    other => Err(other),
                },
            }
        })
        .await
    }

    /// List one page of documents in a collection.
    pub async fn list_documents(
        &self,
        collection: &str,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> FirestoreResult<ListDocumentsResponse> {
        let mut params = Vec::new();
        if let Some(size) = page_size {
            params.push(format!("pageSize={}", size));
        }
        if let Some(token) = page_token {
            params.push(format!("pageToken={}", urlencoding::encode(token)));
        }
        let url = if params.is_empty() {
            format!("{}/{}", self.base_url, collection)
        } else {
            format!("{}/{}?{}", self.base_url, collection, params.join("&"))
        };
        let url = url.as_str();

        self.execute_request("list_documents", collection, None, || async move {
            let response = self.send(Method::GET, url, NO_BODY).await?;
            match response.status() {
                StatusCode::OK => {
                    let list: ListDocumentsResponse = response.json().await?;
                    let returned = list.documents.as_ref().map_or(0, |d| d.len());
                    record_list_returned(collection, returned as u64);
                    Ok(list)
                }
                _ => Err(Self::error_from(url, response).await),
            }
        })
        .await
    }

    /// List every document of a collection, following page tokens.
    pub async fn list_all_documents(&self, collection: &str) -> FirestoreResult<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .list_documents(collection, Some(LIST_PAGE_SIZE), page_token.as_deref())
                .await?;
            documents.extend(page.documents.unwrap_or_default());

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => return Ok(documents),
            }
        }
    }

    /// Fetch many documents of one collection. Missing ids are omitted.
    pub async fn batch_get_documents(
        &self,
        collection: &str,
        doc_ids: &[String],
    ) -> FirestoreResult<Vec<Document>> {
        let mut documents = Vec::with_capacity(doc_ids.len());

        for chunk in doc_ids.chunks(MAX_BATCH_GET) {
            let url = format!("{}:batchGet", self.base_url);
            let request = BatchGetDocumentsRequest {
                documents: chunk
                    .iter()
                    .map(|id| self.full_document_name(collection, id))
                    .collect(),
                mask: None,
            };
            let (url, request) = (url.as_str(), &request);

            let found = self
                .execute_request("batch_get_documents", collection, None, || async move {
                    let response = self.send(Method::POST, url, Some(request)).await?;
                    match response.status() {
                        StatusCode::OK => {
                            let responses: Vec<BatchGetDocumentsResponse> =
                                Self::json_array("batchGet", response).await?;
                            Ok(responses.into_iter().filter_map(|r| r.found).collect::<Vec<_>>())
                        }
                        _ => Err(Self::error_from(url, response).await),
                    }
                })
                .await?;
            documents.extend(found);
        }

        Ok(documents)
    }

    // =========================================================================
    // Batch Operations
    // =========================================================================

    /// Apply writes atomically: all succeed or none do.
    pub async fn batch_write(&self, writes: Vec<Write>) -> FirestoreResult<BatchWriteResponse> {
        if writes.is_empty() {
            return Ok(BatchWriteResponse::empty());
        }
        if writes.len() > MAX_BATCH_WRITES {
            return Err(FirestoreError::request_failed(format!(
                "Batch write exceeds {} document limit",
                MAX_BATCH_WRITES
            )));
        }

        let url = format!("{}:commit", self.base_url);
        let request = &BatchWriteRequest { writes };
        let url = url.as_str();

        self.execute_request("batch_write", "batch", None, || async move {
            let response = self.send(Method::POST, url, Some(request)).await?;
            match response.status() {
                StatusCode::OK => {
                    let batch_response: BatchWriteResponse = response.json().await?;
                    batch_response.check_for_errors()?;
                    Ok(batch_response)
                }
                StatusCode::CONFLICT => Err(FirestoreError::AlreadyExists(
                    "Batch write conflict".to_string(),
                )),
                StatusCode::PRECONDITION_FAILED => Err(FirestoreError::PreconditionFailed(
                    "Batch precondition failed".to_string(),
                )),
                _ => match Self::error_from(url, response).await {
                    FirestoreError::RequestFailed(msg) if msg.contains("ALREADY_EXISTS") => {
                        Err(FirestoreError::AlreadyExists(msg))
                    }
                    FirestoreError::RequestFailed(msg) if msg.contains("FAILED_PRECONDITION") => {
                        Err(FirestoreError::PreconditionFailed(msg))
                    }
                    other => Err(other),
                },
            }
        })
        .await
    }

    // =========================================================================
    // Query Operations
    // =========================================================================

    /// Run a structured query.
    ///
    /// `parent_path` is the document containing the collection, e.g.
    /// `users/USER_ID` for a subcollection. `None` queries a root collection.
    pub async fn run_query(
        &self,
        parent_path: Option<&str>,
        query: StructuredQuery,
    ) -> FirestoreResult<Vec<Document>> {
        let url = match parent_path {
            Some(parent) => format!("{}/{}:runQuery", self.base_url, parent),
            None => format!("{}:runQuery", self.base_url),
        };
        let collection = query
            .from
            .first()
            .map(|c| c.collection_id.clone())
            .unwrap_or_default();
        let request = RunQueryRequest {
            structured_query: query,
        };
        let (url, request) = (url.as_str(), &request);

        self.execute_request("run_query", &collection, None, || async move {
            let response = self.send(Method::POST, url, Some(request)).await?;
            match response.status() {
                StatusCode::OK => {
                    let responses: Vec<RunQueryResponse> =
                        Self::json_array("runQuery", response).await?;
                    Ok(responses.into_iter().filter_map(|r| r.document).collect())
                }
                _ => Err(Self::error_from(url, response).await),
            }
        })
        .await
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_config_from_env_validates_project_id() {
        std::env::remove_var("GCP_PROJECT_ID");
        std::env::remove_var("FIREBASE_PROJECT_ID");
        let result = FirestoreConfig::from_env();
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_config_default_values() {
        std::env::set_var("GCP_PROJECT_ID", "test-project");
        std::env::remove_var("FIRESTORE_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("FIRESTORE_EMULATOR_HOST");
        let config = FirestoreConfig::from_env().unwrap();
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.database_id, "(default)");
        assert!(config.emulator_host.is_none());
        std::env::remove_var("GCP_PROJECT_ID");
    }

    #[test]
    fn test_emulator_root_url() {
        let mut config = crate::client_tests::test_config("http://127.0.0.1:8080/");
        assert_eq!(config.root_url(), "http://127.0.0.1:8080");
        config.emulator_host = Some("localhost:8080".into());
        assert_eq!(config.root_url(), "http://localhost:8080");
        config.emulator_host = None;
        assert_eq!(config.root_url(), "https://firestore.googleapis.com");
    }
}
