//! Client and repository tests against a mocked Firestore endpoint.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use jobquest_models::{JobId, JobStatus, Profile, User, UserId};

use crate::client::{FirestoreClient, FirestoreConfig};
use crate::codec::user_to_fields;
use crate::error::FirestoreError;
use crate::retry::RetryConfig;
use crate::store::{JobStore, StoreError, UserStore};
use crate::types::{Document, StructuredQuery, ToFirestoreValue};
use crate::FirestoreStore;

// =============================================================================
// Test Helpers
// =============================================================================

pub(crate) fn test_config(emulator: &str) -> FirestoreConfig {
    FirestoreConfig {
        project_id: "test-project".to_string(),
        database_id: "(default)".to_string(),
        emulator_host: Some(emulator.to_string()),
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        retry: RetryConfig {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 5,
        },
    }
}

async fn client_for(server: &MockServer) -> FirestoreClient {
    FirestoreClient::new(test_config(&server.uri())).await.unwrap()
}

fn user_document(user: &User) -> serde_json::Value {
    let doc = Document::named(
        format!(
            "projects/test-project/databases/(default)/documents/users/{}",
            user.id
        ),
        user_to_fields(user),
    );
    serde_json::to_value(doc).unwrap()
}

fn seeker() -> User {
    User::new(
        "ada@example.com",
        "hash",
        "Ada",
        "555-0100",
        Profile::JobSeeker { resume: None },
    )
}

// =============================================================================
// Error Classification
// =============================================================================

#[test]
fn test_error_from_http_status() {
    assert!(matches!(
        FirestoreError::from_http_status(429, "rate limited"),
        FirestoreError::RateLimited(_)
    ));
    assert!(matches!(
        FirestoreError::from_http_status(503, "unavailable"),
        FirestoreError::ServerError(503, _)
    ));
    assert!(matches!(
        FirestoreError::from_http_status(409, "conflict"),
        FirestoreError::AlreadyExists(_)
    ));
    assert!(matches!(
        FirestoreError::from_http_status(400, "bad request"),
        FirestoreError::RequestFailed(_)
    ));
}

#[test]
fn test_retryable_classification() {
    assert!(FirestoreError::from_http_status(500, "boom").is_retryable());
    assert!(FirestoreError::RateLimited(2000).is_retryable());
    assert!(!FirestoreError::from_http_status(404, "missing").is_retryable());
    assert!(!FirestoreError::from_http_status(401, "denied").is_retryable());
    assert_eq!(FirestoreError::RateLimited(2000).retry_after_ms(), Some(2000));
}

#[test]
fn test_store_error_mapping() {
    assert!(matches!(
        StoreError::from(FirestoreError::AlreadyExists("x".into())),
        StoreError::Conflict(_)
    ));
    assert!(matches!(
        StoreError::from(FirestoreError::PreconditionFailed("x".into())),
        StoreError::Conflict(_)
    ));
    assert!(matches!(
        StoreError::from(FirestoreError::NotFound("x".into())),
        StoreError::NotFound(_)
    ));
    assert!(matches!(
        StoreError::from(FirestoreError::ServerError(500, "x".into())),
        StoreError::Firestore(_)
    ));
}

// =============================================================================
// Transport
// =============================================================================

#[tokio::test]
async fn test_get_missing_document_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"/documents/jobs/missing$"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": {"code": 404}})))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    assert!(client.get_document("jobs", "missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_conflict_is_already_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"/documents/applications$"))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let mut fields = HashMap::new();
    fields.insert("status".to_string(), "Pending".to_firestore_value());
    let err = client
        .create_document("applications", "s1_j1", fields)
        .await
        .unwrap_err();
    assert!(matches!(err, FirestoreError::AlreadyExists(_)));
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"/documents/users/u1$"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let mut user = seeker();
    user.id = UserId::from_string("u1");
    Mock::given(method("GET"))
        .and(path_regex(r"/documents/users/u1$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_document(&user)))
        .mount(&server)
        .await;

    let store = FirestoreStore::new(client_for(&server).await);
    let fetched = store.get_user(&UserId::from_string("u1")).await.unwrap().unwrap();
    assert_eq!(fetched.email, "ada@example.com");
}

#[tokio::test]
async fn test_run_query_skips_read_time_only_rows() {
    let server = MockServer::start().await;
    let user = seeker();
    Mock::given(method("POST"))
        .and(path_regex(r"/documents:runQuery$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"document": user_document(&user), "readTime": "2024-01-01T00:00:00Z"},
            {"readTime": "2024-01-01T00:00:00Z"}
        ])))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let query = StructuredQuery::collection("users")
        .where_eq("role", "Job Seeker".to_firestore_value());
    let docs = client.run_query(None, query).await.unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].id(), Some(user.id.as_str()));
}

// =============================================================================
// Repositories
// =============================================================================

#[tokio::test]
async fn test_signup_with_taken_email_is_conflict() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"/documents:commit$"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {"code": 409, "status": "ALREADY_EXISTS"}
        })))
        .mount(&server)
        .await;

    let store = FirestoreStore::new(client_for(&server).await);
    let err = store.create_user(&seeker()).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[tokio::test]
async fn test_find_by_email_follows_index() {
    let server = MockServer::start().await;
    let mut user = seeker();
    user.id = UserId::from_string("u42");
    user.save_job(JobId::from_string("j7"));

    Mock::given(method("GET"))
        .and(path_regex(r"/documents/user_emails/ada(@|%40)example\.com$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/test-project/databases/(default)/documents/user_emails/ada@example.com",
            "fields": {"user_id": {"stringValue": "u42"}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"/documents/users/u42$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_document(&user)))
        .mount(&server)
        .await;

    let store = FirestoreStore::new(client_for(&server).await);
    let found = store
        .find_user_by_email("  ADA@example.com ")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(found.saved_jobs, vec![JobId::from_string("j7")]);
}

#[tokio::test]
async fn test_recent_jobs_are_ordered_and_limited_server_side() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"/documents:runQuery$"))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "orderBy": [{"field": {"fieldPath": "created_at"}, "direction": "DESCENDING"}],
                "limit": 3
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = FirestoreStore::new(client_for(&server).await);
    assert!(store.recent_jobs(3).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_job_status_change_masks_two_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"/documents:commit$"))
        .and(body_partial_json(json!({
            "writes": [{
                "updateMask": {"fieldPaths": ["status", "updated_at"]},
                "currentDocument": {"exists": true}
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"writeResults": [{}]})))
        .expect(1)
        .mount(&server)
        .await;

    let store = FirestoreStore::new(client_for(&server).await);
    store
        .set_jobs_status(
            &[JobId::from_string("j1")],
            JobStatus::Inactive,
            chrono::Utc::now(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_deleting_missing_job_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"/documents:runQuery$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"/documents:commit$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "writeResults": [{}],
            "status": [{"code": 9, "message": "no entity to delete"}]
        })))
        .mount(&server)
        .await;

    let store = FirestoreStore::new(client_for(&server).await);
    let err = store.delete_job(&JobId::from_string("ghost")).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}
