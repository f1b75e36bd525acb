//! Per-request identity: resolve the bearer token into an explicit `RequestContext`.
//!
//! A missing, malformed, unknown or unverifiable token yields an anonymous
//! context; operations that need a user reject it themselves with 401.

use std::{convert::Infallible, sync::Arc};

use axum::{
  async_trait,
  extract::FromRequestParts,
  http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, warn};

use crate::domain::RequestContext;
use crate::state::AppState;
use crate::util::bearer_token;

/// Raw bearer token, if the request carried one.
pub fn token_from_parts(parts: &Parts) -> Option<String> {
  parts
    .headers
    .get(AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(bearer_token)
    .map(str::to_string)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequestContext {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
    let Some(token) = token_from_parts(parts) else {
      return Ok(RequestContext::anonymous());
    };
    match state.identity.current_user(&token).await {
      Ok(Some(identity)) => {
        debug!(target: "auth", user_id = %identity.user_id, "Request authenticated");
        Ok(RequestContext::for_user(identity))
      }
      Ok(None) => Ok(RequestContext::anonymous()),
      Err(e) => {
        warn!(target: "auth", error = %e, "Session lookup failed; treating request as anonymous");
        Ok(RequestContext::anonymous())
      }
    }
  }
}

/// Bearer token of a request, for endpoints that act on the session itself.
pub struct BearerToken(pub Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    Ok(BearerToken(token_from_parts(parts)))
  }
}
