//! Domain models consumed from the content store: challenges, attempts,
//! completions, definitions, read marks, profiles, and caller identity.
//!
//! The store owns every one of these rows; the service only keeps transient
//! copies for the duration of a request.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Store timestamps come as RFC 3339 (`timestamptz`) or without an offset
/// (`timestamp`); the latter are read as UTC. A value that parses as neither
/// becomes `None`, so the row is kept and counted under the unknown date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
  let raw = raw.trim();
  if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
    return Some(ts.with_timezone(&Utc));
  }
  ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    .map(|naive| Utc.from_utc_datetime(&naive))
}

fn lenient_timestamp<'de, D>(de: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
  D: Deserializer<'de>,
{
  let raw: Option<String> = Option::deserialize(de)?;
  Ok(raw.as_deref().and_then(parse_timestamp))
}

/// How hard is a challenge?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

/// A coding exercise. `solution` is the only ground truth for grading.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Challenge {
  pub id: String,
  pub title: String,
  #[serde(default)]
  pub description: String,
  pub difficulty: Difficulty,
  /// Programming language tag (store column `jezyk_pro`).
  #[serde(rename = "jezyk_pro")]
  pub language: String,
  /// Topic tag (store column `topic_pro`).
  #[serde(rename = "topic_pro", default)]
  pub topic: String,
  #[serde(default)]
  pub starter_code: String,
  #[serde(default)]
  pub solution: String,
  /// Opaque; never executed.
  #[serde(default)]
  pub test_cases: serde_json::Value,
  #[serde(default, deserialize_with = "lenient_timestamp")]
  pub created_at: Option<DateTime<Utc>>,
}

/// Lifecycle of a single submission.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
  InProgress,
  Success,
  Failed,
}

impl AttemptStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      AttemptStatus::InProgress => "in_progress",
      AttemptStatus::Success => "success",
      AttemptStatus::Failed => "failed",
    }
  }
}

/// One recorded submission. Inserted as `in_progress`, updated once.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChallengeAttempt {
  pub id: String,
  pub user_id: String,
  pub challenge_id: String,
  pub code: String,
  pub status: AttemptStatus,
  #[serde(default, deserialize_with = "lenient_timestamp")]
  pub created_at: Option<DateTime<Utc>>,
}

/// Attempt row before the store assigned an id.
#[derive(Clone, Debug, Serialize)]
pub struct NewAttempt {
  pub user_id: String,
  pub challenge_id: String,
  pub code: String,
  pub status: AttemptStatus,
}

/// Join row written when an attempt is judged correct. Not unique per pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletedChallenge {
  pub user_id: String,
  pub challenge_id: String,
  #[serde(default, deserialize_with = "lenient_timestamp")]
  pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChallengeRef {
  pub title: String,
  #[serde(rename = "jezyk_pro")]
  pub language: String,
}

/// Completion joined with the challenge it refers to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompletionRow {
  #[serde(default, deserialize_with = "lenient_timestamp")]
  pub completed_at: Option<DateTime<Utc>>,
  #[serde(default, rename = "challenges")]
  pub challenge: Option<ChallengeRef>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Definition {
  pub id: String,
  pub title: String,
  pub language: String,
  #[serde(default)]
  pub difficulty: Option<String>,
  #[serde(default)]
  pub definition_content: String,
  #[serde(default)]
  pub comparison: Option<String>,
  #[serde(default)]
  pub code_example: Option<String>,
}

/// Join row for "mark as read". The only row type that is ever deleted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadDefinition {
  pub user_id: String,
  pub definition_id: String,
  #[serde(default, deserialize_with = "lenient_timestamp")]
  pub read_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DefinitionRef {
  pub title: String,
  pub language: String,
}

/// Read mark joined with its definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadRow {
  #[serde(default, deserialize_with = "lenient_timestamp")]
  pub read_at: Option<DateTime<Utc>>,
  #[serde(default, rename = "definitions")]
  pub definition: Option<DefinitionRef>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Profile {
  pub id: String,
  pub email: String,
  #[serde(default, deserialize_with = "lenient_timestamp")]
  pub created_at: Option<DateTime<Utc>>,
}

/// Authenticated caller, as resolved by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
  pub user_id: String,
  pub email: String,
}

#[derive(Clone, Debug)]
pub struct Session {
  pub access_token: String,
  pub identity: Identity,
}

/// Explicit per-request context. Every evaluator, aggregator and catalog call
/// receives one instead of reading a process-wide session.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
  pub identity: Option<Identity>,
}

impl RequestContext {
  pub fn anonymous() -> Self {
    Self { identity: None }
  }

  pub fn for_user(identity: Identity) -> Self {
    Self { identity: Some(identity) }
  }

  pub fn user_id(&self) -> Option<&str> {
    self.identity.as_ref().map(|i| i.user_id.as_str())
  }
}
