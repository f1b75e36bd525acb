//! Identity provider seam: email+password credentials, opaque bearer sessions.
//!
//! - `MemoryIdentity`: argon2-hashed passwords and UUID tokens kept in process
//! - `RestIdentity`: the managed backend's token-issuing auth API (`/auth/v1/...`)
//!
//! Handlers never read a global session; the bearer token of each request is
//! resolved into an explicit `RequestContext` (see `routes::extract`).

use std::{collections::HashMap, sync::Arc, time::Duration};

use argon2::{
  password_hash::{PasswordHasher, SaltString},
  Argon2, PasswordHash, PasswordVerifier,
};
use async_trait::async_trait;
use chrono::Utc;
use rand_core::OsRng;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::StoreCfg;
use crate::domain::{Identity, Profile, Session};
use crate::store::ContentStore;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Error)]
pub enum AuthError {
  #[error("invalid email or password")]
  InvalidCredentials,
  #[error("invalid input: {0}")]
  InvalidInput(String),
  #[error("email already registered")]
  AlreadyRegistered,
  #[error("no active session")]
  Unauthenticated,
  #[error("auth backend error: {0}")]
  Backend(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
  async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError>;
  async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;
  /// `Ok(None)` for unknown or expired tokens.
  async fn current_user(&self, token: &str) -> Result<Option<Identity>, AuthError>;
  async fn sign_out(&self, token: &str) -> Result<(), AuthError>;
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
  if !email.contains('@') || email.trim() != email {
    return Err(AuthError::InvalidInput("email must be a valid address".into()));
  }
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(AuthError::InvalidInput(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }
  Ok(())
}

/// Create the identity, then its profile row (as two independent writes).
/// A failed profile insert is logged and does not undo the sign-up.
#[instrument(level = "info", skip(idp, store, password), fields(%email))]
pub async fn register(
  idp: &dyn IdentityProvider,
  store: &dyn ContentStore,
  email: &str,
  password: &str,
) -> Result<Session, AuthError> {
  validate_credentials(email, password)?;
  let session = idp.sign_up(email, password).await?;
  let profile = Profile {
    id: session.identity.user_id.clone(),
    email: session.identity.email.clone(),
    created_at: Some(Utc::now()),
  };
  if let Err(e) = store.insert_profile(profile).await {
    warn!(target: "auth", user_id = %session.identity.user_id, error = %e, "Profile insert failed after sign-up");
  }
  info!(target: "auth", user_id = %session.identity.user_id, "User registered");
  Ok(session)
}

struct Account {
  user_id: String,
  password_hash: String,
}

#[derive(Clone, Default)]
pub struct MemoryIdentity {
  accounts: Arc<RwLock<HashMap<String, Account>>>,
  sessions: Arc<RwLock<HashMap<String, Identity>>>,
}

impl MemoryIdentity {
  pub fn new() -> Self {
    Self::default()
  }

  async fn open_session(&self, identity: Identity) -> Session {
    let token = Uuid::new_v4().to_string();
    self.sessions.write().await.insert(token.clone(), identity.clone());
    Session { access_token: token, identity }
  }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
  #[instrument(level = "debug", skip(self, password))]
  async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
    validate_credentials(email, password)?;
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| AuthError::Backend(e.to_string()))?
      .to_string();

    let user_id = {
      let mut accounts = self.accounts.write().await;
      if accounts.contains_key(email) {
        return Err(AuthError::AlreadyRegistered);
      }
      let user_id = Uuid::new_v4().to_string();
      accounts.insert(email.to_string(), Account { user_id: user_id.clone(), password_hash });
      user_id
    };
    Ok(self.open_session(Identity { user_id, email: email.to_string() }).await)
  }

  #[instrument(level = "debug", skip(self, password))]
  async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
    let (user_id, stored) = {
      let accounts = self.accounts.read().await;
      let acc = accounts.get(email).ok_or(AuthError::InvalidCredentials)?;
      (acc.user_id.clone(), acc.password_hash.clone())
    };
    let parsed = PasswordHash::new(&stored).map_err(|e| AuthError::Backend(e.to_string()))?;
    if Argon2::default().verify_password(password.as_bytes(), &parsed).is_err() {
      return Err(AuthError::InvalidCredentials);
    }
    Ok(self.open_session(Identity { user_id, email: email.to_string() }).await)
  }

  async fn current_user(&self, token: &str) -> Result<Option<Identity>, AuthError> {
    Ok(self.sessions.read().await.get(token).cloned())
  }

  async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
    match self.sessions.write().await.remove(token) {
      Some(_) => Ok(()),
      None => Err(AuthError::Unauthenticated),
    }
  }
}

/// Client for the managed backend's auth API.
#[derive(Clone)]
pub struct RestIdentity {
  client: reqwest::Client,
  base_url: String,
  api_key: String,
}

#[derive(Serialize)]
struct CredentialsBody<'a> {
  email: &'a str,
  password: &'a str,
}

#[derive(Deserialize)]
struct AuthUser {
  id: String,
  #[serde(default)]
  email: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
  access_token: String,
  user: AuthUser,
}

impl AuthUser {
  fn into_identity(self, fallback_email: &str) -> Identity {
    Identity { user_id: self.id, email: self.email.unwrap_or_else(|| fallback_email.to_string()) }
  }
}

impl RestIdentity {
  pub fn from_cfg(cfg: &StoreCfg) -> Option<Self> {
    let base_url = cfg.url.clone()?.trim_end_matches('/').to_string();
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_secs))
      .build()
      .map_err(|e| error!(target: "auth", error = %e, "Failed to build HTTP client"))
      .ok()?;
    Some(Self { client, base_url, api_key: cfg.api_key.clone().unwrap_or_default() })
  }

  fn post(&self, path: &str) -> reqwest::RequestBuilder {
    self
      .client
      .post(format!("{}/auth/v1/{}", self.base_url, path))
      .header(USER_AGENT, "code-practice-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header("apikey", &self.api_key)
  }
}

#[async_trait]
impl IdentityProvider for RestIdentity {
  #[instrument(level = "debug", skip(self, password))]
  async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
    let res = self
      .post("signup")
      .json(&CredentialsBody { email, password })
      .send()
      .await
      .map_err(|e| AuthError::Backend(e.to_string()))?;
    match res.status() {
      s if s.is_success() => {}
      StatusCode::UNPROCESSABLE_ENTITY => return Err(AuthError::AlreadyRegistered),
      s => {
        let body = res.text().await.unwrap_or_default();
        return Err(AuthError::Backend(format!("signup HTTP {s}: {body}")));
      }
    }
    // Signup may not return a session (e.g. pending confirmation); a password grant always does.
    self.sign_in(email, password).await
  }

  #[instrument(level = "debug", skip(self, password))]
  async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
    let res = self
      .post("token")
      .query(&[("grant_type", "password")])
      .json(&CredentialsBody { email, password })
      .send()
      .await
      .map_err(|e| AuthError::Backend(e.to_string()))?;
    match res.status() {
      s if s.is_success() => {}
      StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => return Err(AuthError::InvalidCredentials),
      s => return Err(AuthError::Backend(format!("token HTTP {s}"))),
    }
    let body: TokenResponse = res.json().await.map_err(|e| AuthError::Backend(e.to_string()))?;
    Ok(Session { access_token: body.access_token, identity: body.user.into_identity(email) })
  }

  async fn current_user(&self, token: &str) -> Result<Option<Identity>, AuthError> {
    let res = self
      .client
      .get(format!("{}/auth/v1/user", self.base_url))
      .header(USER_AGENT, "code-practice-backend/0.1")
      .header("apikey", &self.api_key)
      .header(AUTHORIZATION, format!("Bearer {token}"))
      .send()
      .await
      .map_err(|e| AuthError::Backend(e.to_string()))?;
    match res.status() {
      s if s.is_success() => {
        let user: AuthUser = res.json().await.map_err(|e| AuthError::Backend(e.to_string()))?;
        Ok(Some(user.into_identity("")))
      }
      StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
      s => Err(AuthError::Backend(format!("user HTTP {s}"))),
    }
  }

  async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
    let res = self
      .post("logout")
      .header(AUTHORIZATION, format!("Bearer {token}"))
      .send()
      .await
      .map_err(|e| AuthError::Backend(e.to_string()))?;
    match res.status() {
      s if s.is_success() => Ok(()),
      StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::Unauthenticated),
      s => Err(AuthError::Backend(format!("logout HTTP {s}"))),
    }
  }
}
