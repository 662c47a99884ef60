//! Request extractors whose rejections render as [`ApiError`] bodies.

use axum::extract::{FromRequest, FromRequestParts, Multipart, Request};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::ApiError;
use crate::form::FormData;

/// JSON body extractor and response.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query string extractor.
#[derive(Debug, Clone, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);

#[axum::async_trait]
impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state).await?;
        FormData::read(multipart).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, StatusCode};
    use axum::routing::{get, post};
    use axum::Router;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Serialize)]
    struct Echo {
        name: String,
    }

    #[derive(Deserialize)]
    struct Paging {
        page: u32,
    }

    fn app() -> Router {
        Router::new()
            .route("/echo", post(|Json(echo): Json<Echo>| async move { Json(echo) }))
            .route(
                "/page",
                get(|Query(paging): Query<Paging>| async move { paging.page.to_string() }),
            )
            .route(
                "/form",
                post(|form: FormData| async move { form.text("name").unwrap_or_default() }),
            )
    }

    async fn call(request: Request) -> (StatusCode, Option<String>, serde_json::Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, content_type, body)
    }

    #[tokio::test]
    async fn test_json_round_trips() {
        let request = Request::builder()
            .method("POST")
            .uri("/echo")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"sam"}"#))
            .unwrap();
        let (status, _, body) = call(request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "sam");
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error_object() {
        let request = Request::builder()
            .method("POST")
            .uri("/echo")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name": "#))
            .unwrap();
        let (status, content_type, body) = call(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert!(body["message"].as_str().unwrap().contains("JSON"));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_an_error_object() {
        let request = Request::builder()
            .method("POST")
            .uri("/echo")
            .body(Body::from(r#"{"name":"sam"}"#))
            .unwrap();
        let (status, _, body) = call(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_bad_query_is_an_error_object() {
        let request = Request::builder()
            .uri("/page?page=first")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = call(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_form_requires_multipart() {
        let request = Request::builder()
            .method("POST")
            .uri("/form")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, _, body) = call(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }
}
