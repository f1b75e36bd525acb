//! HTTP error boundary. Every domain error becomes a status code plus a short
//! `{ "error": ... }` body; the cause is only written to the log.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{error, warn};

use crate::auth::AuthError;
use crate::catalog::CatalogError;
use crate::evaluation::EvalError;
use crate::progress::ProgressError;
use crate::protocol::ErrorOut;

pub const MSG_INTERNAL: &str = "Internal server error";
pub const MSG_UNAUTHORIZED: &str = "Unauthorized";

#[derive(Debug)]
pub struct ApiError {
  pub status: StatusCode,
  pub message: String,
}

impl ApiError {
  pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
    Self { status, message: message.into() }
  }

  pub fn unauthorized() -> Self {
    Self::new(StatusCode::UNAUTHORIZED, MSG_UNAUTHORIZED)
  }

  pub fn internal() -> Self {
    Self::new(StatusCode::INTERNAL_SERVER_ERROR, MSG_INTERNAL)
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    (self.status, Json(ErrorOut { error: self.message })).into_response()
  }
}

impl From<EvalError> for ApiError {
  fn from(e: EvalError) -> Self {
    match e {
      EvalError::NotFound => Self::new(StatusCode::NOT_FOUND, "Challenge not found"),
      EvalError::Unauthorized => Self::unauthorized(),
      EvalError::AttemptCreate(cause) => {
        error!(target: "submission", error = %cause, "Attempt insert rejected");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create attempt")
      }
      EvalError::Store(cause) => {
        error!(target: "submission", error = %cause, "Submission failed on store call");
        Self::internal()
      }
    }
  }
}

impl From<CatalogError> for ApiError {
  fn from(e: CatalogError) -> Self {
    match e {
      CatalogError::NotFound => Self::new(StatusCode::NOT_FOUND, "Not found"),
      CatalogError::Unauthorized => Self::unauthorized(),
      CatalogError::Store(cause) => {
        error!(target: "catalog", error = %cause, "Catalog store call failed");
        Self::internal()
      }
    }
  }
}

impl From<ProgressError> for ApiError {
  fn from(e: ProgressError) -> Self {
    match e {
      ProgressError::Unauthorized => Self::unauthorized(),
      ProgressError::Store(cause) => {
        error!(target: "progress", error = %cause, "History read failed");
        Self::internal()
      }
    }
  }
}

impl From<AuthError> for ApiError {
  fn from(e: AuthError) -> Self {
    match e {
      AuthError::InvalidCredentials => Self::new(StatusCode::UNAUTHORIZED, "Invalid email or password"),
      AuthError::InvalidInput(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
      AuthError::AlreadyRegistered => Self::new(StatusCode::CONFLICT, "Email already registered"),
      AuthError::Unauthenticated => Self::unauthorized(),
      AuthError::Backend(cause) => {
        warn!(target: "auth", error = %cause, "Identity provider call failed");
        Self::internal()
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::StoreError;

  #[test]
  fn evaluation_errors_map_to_fixed_messages() {
    let cases = [
      (EvalError::NotFound, StatusCode::NOT_FOUND, "Challenge not found"),
      (EvalError::Unauthorized, StatusCode::UNAUTHORIZED, "Unauthorized"),
      (EvalError::AttemptCreate(StoreError::Write("x".into())), StatusCode::INTERNAL_SERVER_ERROR, "Failed to create attempt"),
      (EvalError::Store(StoreError::Transport("x".into())), StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
    ];
    for (err, status, msg) in cases {
      let api = ApiError::from(err);
      assert_eq!(api.status, status);
      assert_eq!(api.message, msg);
    }
  }

  #[test]
  fn store_details_never_reach_the_client() {
    let api = ApiError::from(CatalogError::Store(StoreError::Read("secret table detail".into())));
    assert_eq!(api.message, MSG_INTERNAL);
  }
}
