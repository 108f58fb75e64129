//! JSON REST API for Strand.
//!
//! Exposes an axum [`Router`] backed by an [`IdentityResolver`] over any
//! [`ContactStore`]. TLS, request tracing, and process lifecycle are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = strand_api::api_router(Arc::new(IdentityResolver::new(store)));
//! ```

pub mod error;
pub mod health;
pub mod identify;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use strand_core::{resolver::IdentityResolver, store::ContactStore};

pub use error::ApiError;

/// Build the API router for `resolver`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(resolver: Arc<IdentityResolver<S>>) -> Router<()>
where
  S: ContactStore + 'static,
{
  Router::new()
    .route("/identify", post(identify::handler::<S>))
    .route("/health", get(health::handler))
    .with_state(resolver)
}

#[cfg(test)]
mod tests {
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use strand_core::memory::MemoryStore;
  use tower::ServiceExt as _;

  use super::*;

  fn app() -> (Router, Arc<IdentityResolver<MemoryStore>>) {
    let resolver = Arc::new(IdentityResolver::new(Arc::new(MemoryStore::new())));
    (api_router(resolver.clone()), resolver)
  }

  async fn post_json(app: Router, body: &str) -> (StatusCode, Value) {
    let req = Request::builder()
      .method("POST")
      .uri("/identify")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(body.to_string()))
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  // ── POST /identify ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn identify_new_contact_returns_primary() {
    let (app, _) = app();
    let (status, body) = post_json(app, r#"{"email":"doc@hillvalley.edu"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      body,
      json!({
        "contact": {
          "primaryContactId": 1,
          "emails": ["doc@hillvalley.edu"],
          "phoneNumbers": [],
          "secondaryContactIds": []
        }
      })
    );
  }

  #[tokio::test]
  async fn identify_links_new_phone_as_secondary() {
    let (app, resolver) = app();
    post_json(app.clone(), r#"{"email":"a@x.com","phoneNumber":"123"}"#).await;
    let (status, body) =
      post_json(app, r#"{"email":"a@x.com","phoneNumber":"456"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contact"]["primaryContactId"], 1);
    assert_eq!(body["contact"]["phoneNumbers"], json!(["123", "456"]));
    assert_eq!(body["contact"]["secondaryContactIds"], json!([2]));
    assert_eq!(resolver.store().contacts().len(), 2);
  }

  #[tokio::test]
  async fn identify_accepts_null_fields() {
    let (app, _) = app();
    let (status, body) =
      post_json(app, r#"{"email":null,"phoneNumber":"123456"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contact"]["phoneNumbers"], json!(["123456"]));
    assert_eq!(body["contact"]["emails"], json!([]));
  }

  #[tokio::test]
  async fn identify_empty_body_returns_400() {
    let (app, resolver) = app();
    let (status, body) = post_json(app, "{}").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
    assert_eq!(body["field"], Value::Null);
    assert!(resolver.store().contacts().is_empty());
  }

  #[tokio::test]
  async fn identify_bad_email_names_field() {
    let (app, _) = app();
    let (status, body) = post_json(app, r#"{"email":"not-an-email"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "email");
  }

  #[tokio::test]
  async fn identify_bad_phone_names_field() {
    let (app, _) = app();
    let (status, body) = post_json(app, r#"{"phoneNumber":"0800"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "phoneNumber");
  }

  #[tokio::test]
  async fn identify_numeric_phone_names_field() {
    let (app, resolver) = app();
    let (status, body) = post_json(app, r#"{"phoneNumber":123456}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
    assert_eq!(body["field"], "phoneNumber");
    assert_eq!(body["message"], "Phone number must be a string");
    assert!(resolver.store().contacts().is_empty());
  }

  #[tokio::test]
  async fn identify_numeric_email_names_field() {
    let (app, _) = app();
    let (status, body) =
      post_json(app, r#"{"email":42,"phoneNumber":"123456"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "email");
    assert_eq!(body["message"], "Email must be a string");
  }

  #[tokio::test]
  async fn identify_non_object_body_returns_400() {
    let (app, _) = app();
    let (status, body) = post_json(app, r#"["a@x.com"]"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation Error");
  }

  // ── GET /health ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_reports_healthy() {
    let (app, _) = app();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
  }
}
