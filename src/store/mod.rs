//! Content store seam: every row the service reads or writes goes through
//! [`ContentStore`].
//!
//! Two backends:
//!   - [`memory::MemoryStore`]: in-process maps, seeded from built-in content and the TOML bank
//!   - [`rest::RestStore`]: PostgREST-style HTTP API of the managed backend
//!
//! Calls are independent round trips. Nothing here is transactional.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
  AttemptStatus, Challenge, ChallengeAttempt, CompletedChallenge, CompletionRow, Definition,
  NewAttempt, Profile, ReadRow,
};

pub mod memory;
pub mod rest;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("row not found")]
  NotFound,
  #[error("read failed: {0}")]
  Read(String),
  #[error("write failed: {0}")]
  Write(String),
  #[error("transport error: {0}")]
  Transport(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Equality filters for the challenge list. `None` means "any".
#[derive(Clone, Debug, Default)]
pub struct ChallengeFilter {
  pub language: Option<String>,
  pub topic: Option<String>,
  pub difficulty: Option<String>,
}

impl ChallengeFilter {
  pub fn matches(&self, c: &Challenge) -> bool {
    self.language.as_deref().map_or(true, |l| c.language == l)
      && self.topic.as_deref().map_or(true, |t| c.topic == t)
      && self.difficulty.as_deref().map_or(true, |d| c.difficulty.as_str() == d)
  }
}

#[async_trait]
pub trait ContentStore: Send + Sync {
  /// Short backend name for logs.
  fn backend(&self) -> &'static str;

  async fn get_challenge(&self, id: &str) -> StoreResult<Option<Challenge>>;
  /// Newest first.
  async fn list_challenges(&self, filter: &ChallengeFilter) -> StoreResult<Vec<Challenge>>;

  async fn insert_attempt(&self, attempt: NewAttempt) -> StoreResult<ChallengeAttempt>;
  async fn update_attempt_status(&self, attempt_id: &str, status: AttemptStatus) -> StoreResult<()>;
  /// Newest first.
  async fn list_attempts(&self, user_id: &str, challenge_id: &str) -> StoreResult<Vec<ChallengeAttempt>>;

  /// Always appends. No uniqueness on (user, challenge).
  async fn insert_completion(&self, user_id: &str, challenge_id: &str) -> StoreResult<CompletedChallenge>;
  async fn list_completions(&self, user_id: &str) -> StoreResult<Vec<CompletionRow>>;

  async fn get_definition(&self, id: &str) -> StoreResult<Option<Definition>>;
  async fn list_definitions(&self, language: Option<&str>) -> StoreResult<Vec<Definition>>;

  async fn insert_read(&self, user_id: &str, definition_id: &str) -> StoreResult<()>;
  /// Returns the number of rows removed.
  async fn delete_read(&self, user_id: &str, definition_id: &str) -> StoreResult<usize>;
  /// Definition ids the user has marked as read.
  async fn read_definition_ids(&self, user_id: &str) -> StoreResult<Vec<String>>;
  async fn list_reads(&self, user_id: &str) -> StoreResult<Vec<ReadRow>>;

  async fn insert_profile(&self, profile: Profile) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Difficulty;

  fn sample(language: &str, topic: &str, difficulty: Difficulty) -> Challenge {
    Challenge {
      id: "x".into(),
      title: "x".into(),
      description: String::new(),
      difficulty,
      language: language.into(),
      topic: topic.into(),
      starter_code: String::new(),
      solution: String::new(),
      test_cases: serde_json::Value::Null,
      created_at: None,
    }
  }

  #[test]
  fn empty_filter_matches_everything() {
    let f = ChallengeFilter::default();
    assert!(f.matches(&sample("python", "loops", Difficulty::Hard)));
  }

  #[test]
  fn filter_fields_combine_with_and() {
    let f = ChallengeFilter {
      language: Some("python".into()),
      topic: None,
      difficulty: Some("easy".into()),
    };
    assert!(f.matches(&sample("python", "loops", Difficulty::Easy)));
    assert!(!f.matches(&sample("python", "loops", Difficulty::Medium)));
    assert!(!f.matches(&sample("rust", "loops", Difficulty::Easy)));
  }
}
