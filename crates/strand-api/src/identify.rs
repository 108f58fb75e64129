//! Handler for `POST /identify`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/identify` | Body: `{"email"?: string, "phoneNumber"?: string}`; 400 on validation failure |

use std::sync::Arc;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use strand_core::{
  identity::IdentifyResponse,
  request::IdentifyRequest,
  resolver::IdentityResolver,
  store::ContactStore,
};

use crate::error::ApiError;

/// `POST /identify`
pub async fn handler<S>(
  State(resolver): State<Arc<IdentityResolver<S>>>,
  body: Result<Json<IdentifyRequest>, JsonRejection>,
) -> Result<Json<IdentifyResponse>, ApiError>
where
  S: ContactStore + 'static,
{
  let Json(request) = body.map_err(|e| ApiError::MalformedBody(e.body_text()))?;
  let identity = resolver.identify(&request).await?;
  Ok(Json(identity.into()))
}
