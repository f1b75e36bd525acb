//! Content store backed by the managed backend's PostgREST-style API.
//!
//! Tables live under `{url}/rest/v1/{table}`; filters are `column=eq.value`
//! query pairs, inserts ask for `Prefer: return=representation` so the row
//! comes back with its server-assigned id and timestamps.
//!
//! NOTE: the service key is never logged. Request/response bodies are not
//! logged either; only table, status and row counts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{ChallengeFilter, ContentStore, StoreError, StoreResult};
use crate::config::StoreCfg;
use crate::domain::{
  AttemptStatus, Challenge, ChallengeAttempt, CompletedChallenge, CompletionRow, Definition,
  NewAttempt, Profile, ReadRow,
};

const UA: &str = "code-practice-backend/0.1";

#[derive(Clone)]
pub struct RestStore {
  pub client: reqwest::Client,
  pub base_url: String,
  api_key: String,
}

impl RestStore {
  /// Build the client from `[store]` config; `None` when no URL is configured.
  pub fn from_cfg(cfg: &StoreCfg) -> Option<Self> {
    let base_url = cfg.url.clone()?.trim_end_matches('/').to_string();
    let api_key = cfg.api_key.clone().unwrap_or_default();
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_secs))
      .build()
      .map_err(|e| error!(target: "store", error = %e, "Failed to build HTTP client"))
      .ok()?;
    Some(Self { client, base_url, api_key })
  }

  fn request(&self, method: Method, table: &str) -> RequestBuilder {
    let url = format!("{}/rest/v1/{}", self.base_url, table);
    self
      .client
      .request(method, url)
      .header(USER_AGENT, UA)
      .header("apikey", &self.api_key)
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
  }

  async fn fetch<T: DeserializeOwned>(&self, table: &str, query: &[(&str, String)]) -> StoreResult<Vec<T>> {
    let res = self
      .request(Method::GET, table)
      .query(query)
      .send()
      .await
      .map_err(|e| StoreError::Transport(e.to_string()))?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      return Err(StoreError::Read(format!("{table}: HTTP {status}: {body}")));
    }
    let rows: Vec<T> = res.json().await.map_err(|e| StoreError::Read(format!("{table}: {e}")))?;
    debug!(target: "store", %table, rows = rows.len(), "Fetched rows");
    Ok(rows)
  }

  /// Send a write and return the representation the backend echoes back.
  async fn write<B: Serialize + ?Sized, T: DeserializeOwned>(
    &self,
    method: Method,
    table: &str,
    query: &[(&str, String)],
    body: Option<&B>,
  ) -> StoreResult<Vec<T>> {
    let mut req = self
      .request(method, table)
      .query(query)
      .header(CONTENT_TYPE, "application/json")
      .header("Prefer", "return=representation");
    if let Some(b) = body {
      req = req.json(b);
    }
    let res = req.send().await.map_err(|e| StoreError::Transport(e.to_string()))?;

    let status = res.status();
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      return Err(StoreError::Write(format!("{table}: HTTP {status}: {body}")));
    }
    res.json().await.map_err(|e| StoreError::Write(format!("{table}: {e}")))
  }
}

fn eq(v: &str) -> String {
  format!("eq.{v}")
}

#[derive(Serialize)]
struct StatusPatch {
  status: AttemptStatus,
}

#[derive(Serialize)]
struct UserChallenge<'a> {
  user_id: &'a str,
  challenge_id: &'a str,
}

#[derive(Serialize)]
struct UserDefinition<'a> {
  user_id: &'a str,
  definition_id: &'a str,
}

#[derive(Deserialize)]
struct DefinitionIdRow {
  definition_id: String,
}

#[async_trait]
impl ContentStore for RestStore {
  fn backend(&self) -> &'static str {
    "rest"
  }

  #[instrument(level = "debug", skip(self))]
  async fn get_challenge(&self, id: &str) -> StoreResult<Option<Challenge>> {
    let rows: Vec<Challenge> = self
      .fetch("challenges", &[("select", "*".into()), ("id", eq(id)), ("limit", "1".into())])
      .await?;
    Ok(rows.into_iter().next())
  }

  #[instrument(level = "debug", skip(self))]
  async fn list_challenges(&self, filter: &ChallengeFilter) -> StoreResult<Vec<Challenge>> {
    let mut q = vec![("select", "*".to_string()), ("order", "created_at.desc".to_string())];
    if let Some(l) = &filter.language {
      q.push(("jezyk_pro", eq(l)));
    }
    if let Some(t) = &filter.topic {
      q.push(("topic_pro", eq(t)));
    }
    if let Some(d) = &filter.difficulty {
      q.push(("difficulty", eq(d)));
    }
    self.fetch("challenges", &q).await
  }

  #[instrument(level = "debug", skip(self, attempt), fields(challenge_id = %attempt.challenge_id, code_len = attempt.code.len()))]
  async fn insert_attempt(&self, attempt: NewAttempt) -> StoreResult<ChallengeAttempt> {
    let rows: Vec<ChallengeAttempt> = self
      .write(Method::POST, "challenge_attempts", &[], Some(&attempt))
      .await?;
    rows
      .into_iter()
      .next()
      .ok_or_else(|| StoreError::Write("challenge_attempts: empty representation".into()))
  }

  #[instrument(level = "debug", skip(self))]
  async fn update_attempt_status(&self, attempt_id: &str, status: AttemptStatus) -> StoreResult<()> {
    let rows: Vec<ChallengeAttempt> = self
      .write(
        Method::PATCH,
        "challenge_attempts",
        &[("id", eq(attempt_id))],
        Some(&StatusPatch { status }),
      )
      .await?;
    if rows.is_empty() {
      return Err(StoreError::NotFound);
    }
    Ok(())
  }

  #[instrument(level = "debug", skip(self))]
  async fn list_attempts(&self, user_id: &str, challenge_id: &str) -> StoreResult<Vec<ChallengeAttempt>> {
    self
      .fetch(
        "challenge_attempts",
        &[
          ("select", "*".into()),
          ("user_id", eq(user_id)),
          ("challenge_id", eq(challenge_id)),
          ("order", "created_at.desc".into()),
        ],
      )
      .await
  }

  #[instrument(level = "debug", skip(self))]
  async fn insert_completion(&self, user_id: &str, challenge_id: &str) -> StoreResult<CompletedChallenge> {
    let rows: Vec<CompletedChallenge> = self
      .write(
        Method::POST,
        "user_completed_challenges",
        &[],
        Some(&UserChallenge { user_id, challenge_id }),
      )
      .await?;
    rows
      .into_iter()
      .next()
      .ok_or_else(|| StoreError::Write("user_completed_challenges: empty representation".into()))
  }

  #[instrument(level = "debug", skip(self))]
  async fn list_completions(&self, user_id: &str) -> StoreResult<Vec<CompletionRow>> {
    self
      .fetch(
        "user_completed_challenges",
        &[
          ("select", "completed_at,challenges(title,jezyk_pro)".into()),
          ("user_id", eq(user_id)),
        ],
      )
      .await
  }

  #[instrument(level = "debug", skip(self))]
  async fn get_definition(&self, id: &str) -> StoreResult<Option<Definition>> {
    let rows: Vec<Definition> = self
      .fetch("definitions", &[("select", "*".into()), ("id", eq(id)), ("limit", "1".into())])
      .await?;
    Ok(rows.into_iter().next())
  }

  #[instrument(level = "debug", skip(self))]
  async fn list_definitions(&self, language: Option<&str>) -> StoreResult<Vec<Definition>> {
    let mut q = vec![("select", "*".to_string()), ("order", "title.asc".to_string())];
    if let Some(l) = language {
      q.push(("language", eq(l)));
    }
    self.fetch("definitions", &q).await
  }

  #[instrument(level = "debug", skip(self))]
  async fn insert_read(&self, user_id: &str, definition_id: &str) -> StoreResult<()> {
    let _: Vec<serde_json::Value> = self
      .write(
        Method::POST,
        "user_read_definitions",
        &[],
        Some(&UserDefinition { user_id, definition_id }),
      )
      .await?;
    Ok(())
  }

  #[instrument(level = "debug", skip(self))]
  async fn delete_read(&self, user_id: &str, definition_id: &str) -> StoreResult<usize> {
    let rows: Vec<serde_json::Value> = self
      .write::<(), _>(
        Method::DELETE,
        "user_read_definitions",
        &[("user_id", eq(user_id)), ("definition_id", eq(definition_id))],
        None,
      )
      .await?;
    Ok(rows.len())
  }

  #[instrument(level = "debug", skip(self))]
  async fn read_definition_ids(&self, user_id: &str) -> StoreResult<Vec<String>> {
    let rows: Vec<DefinitionIdRow> = self
      .fetch(
        "user_read_definitions",
        &[("select", "definition_id".into()), ("user_id", eq(user_id))],
      )
      .await?;
    Ok(rows.into_iter().map(|r| r.definition_id).collect())
  }

  #[instrument(level = "debug", skip(self))]
  async fn list_reads(&self, user_id: &str) -> StoreResult<Vec<ReadRow>> {
    self
      .fetch(
        "user_read_definitions",
        &[
          ("select", "read_at,definitions(title,language)".into()),
          ("user_id", eq(user_id)),
        ],
      )
      .await
  }

  #[instrument(level = "debug", skip(self, profile), fields(id = %profile.id))]
  async fn insert_profile(&self, profile: Profile) -> StoreResult<()> {
    let _: Vec<serde_json::Value> = self
      .write(Method::POST, "profiles", &[], Some(&profile))
      .await?;
    Ok(())
  }
}
