//! In-process content store.
//!
//! Owns:
//!   - challenges and definitions by id (seeded at startup, never mutated here)
//!   - append-only attempt, completion and read-mark tables
//!   - profiles by id
//!
//! Each method takes at most one lock at a time, so the write sequence of a
//! submission interleaves with other requests exactly like separate round
//! trips to a remote backend would.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{ChallengeFilter, ContentStore, StoreError, StoreResult};
use crate::domain::{
  AttemptStatus, Challenge, ChallengeAttempt, ChallengeRef, CompletedChallenge, CompletionRow,
  Definition, DefinitionRef, NewAttempt, Profile, ReadDefinition, ReadRow,
};

#[derive(Clone, Default)]
pub struct MemoryStore {
  challenges: Arc<RwLock<HashMap<String, Challenge>>>,
  definitions: Arc<RwLock<HashMap<String, Definition>>>,
  attempts: Arc<RwLock<Vec<ChallengeAttempt>>>,
  completions: Arc<RwLock<Vec<CompletedChallenge>>>,
  reads: Arc<RwLock<Vec<ReadDefinition>>>,
  profiles: Arc<RwLock<HashMap<String, Profile>>>,
}

impl MemoryStore {
  /// Build from content lists. Later duplicates of an id are ignored.
  pub fn with_content(challenges: Vec<Challenge>, definitions: Vec<Definition>) -> Self {
    let mut by_id = HashMap::new();
    for c in challenges {
      by_id.entry(c.id.clone()).or_insert(c);
    }
    let mut defs = HashMap::new();
    for d in definitions {
      defs.entry(d.id.clone()).or_insert(d);
    }
    Self {
      challenges: Arc::new(RwLock::new(by_id)),
      definitions: Arc::new(RwLock::new(defs)),
      ..Self::default()
    }
  }

  #[cfg(test)]
  pub async fn attempts(&self) -> Vec<ChallengeAttempt> {
    self.attempts.read().await.clone()
  }

  #[cfg(test)]
  pub async fn completions(&self) -> Vec<CompletedChallenge> {
    self.completions.read().await.clone()
  }

  #[cfg(test)]
  pub async fn profile(&self, id: &str) -> Option<Profile> {
    self.profiles.read().await.get(id).cloned()
  }

  /// Test helper for rows whose timestamp the store never filled in.
  #[cfg(test)]
  pub async fn push_completion(&self, row: CompletedChallenge) {
    self.completions.write().await.push(row);
  }
}

#[async_trait]
impl ContentStore for MemoryStore {
  fn backend(&self) -> &'static str {
    "memory"
  }

  #[instrument(level = "debug", skip(self))]
  async fn get_challenge(&self, id: &str) -> StoreResult<Option<Challenge>> {
    Ok(self.challenges.read().await.get(id).cloned())
  }

  #[instrument(level = "debug", skip(self))]
  async fn list_challenges(&self, filter: &ChallengeFilter) -> StoreResult<Vec<Challenge>> {
    let mut out: Vec<Challenge> = self
      .challenges
      .read()
      .await
      .values()
      .filter(|c| filter.matches(c))
      .cloned()
      .collect();
    // Newest first; rows without a timestamp last, then by id for a stable order.
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(out)
  }

  #[instrument(level = "debug", skip(self, attempt), fields(challenge_id = %attempt.challenge_id, code_len = attempt.code.len()))]
  async fn insert_attempt(&self, attempt: NewAttempt) -> StoreResult<ChallengeAttempt> {
    let row = ChallengeAttempt {
      id: Uuid::new_v4().to_string(),
      user_id: attempt.user_id,
      challenge_id: attempt.challenge_id,
      code: attempt.code,
      status: attempt.status,
      created_at: Some(Utc::now()),
    };
    self.attempts.write().await.push(row.clone());
    debug!(target: "store", attempt_id = %row.id, "Attempt inserted");
    Ok(row)
  }

  #[instrument(level = "debug", skip(self))]
  async fn update_attempt_status(&self, attempt_id: &str, status: AttemptStatus) -> StoreResult<()> {
    let mut attempts = self.attempts.write().await;
    match attempts.iter_mut().find(|a| a.id == attempt_id) {
      Some(a) => {
        a.status = status;
        Ok(())
      }
      None => Err(StoreError::NotFound),
    }
  }

  #[instrument(level = "debug", skip(self))]
  async fn list_attempts(&self, user_id: &str, challenge_id: &str) -> StoreResult<Vec<ChallengeAttempt>> {
    let attempts = self.attempts.read().await;
    // Insertion order is chronological; reverse for newest first.
    Ok(
      attempts
        .iter()
        .rev()
        .filter(|a| a.user_id == user_id && a.challenge_id == challenge_id)
        .cloned()
        .collect(),
    )
  }

  #[instrument(level = "debug", skip(self))]
  async fn insert_completion(&self, user_id: &str, challenge_id: &str) -> StoreResult<CompletedChallenge> {
    let row = CompletedChallenge {
      user_id: user_id.to_string(),
      challenge_id: challenge_id.to_string(),
      completed_at: Some(Utc::now()),
    };
    self.completions.write().await.push(row.clone());
    Ok(row)
  }

  #[instrument(level = "debug", skip(self))]
  async fn list_completions(&self, user_id: &str) -> StoreResult<Vec<CompletionRow>> {
    let rows: Vec<CompletedChallenge> = {
      self
        .completions
        .read()
        .await
        .iter()
        .filter(|c| c.user_id == user_id)
        .cloned()
        .collect()
    };
    let challenges = self.challenges.read().await;
    Ok(
      rows
        .into_iter()
        .map(|c| CompletionRow {
          completed_at: c.completed_at,
          challenge: challenges.get(&c.challenge_id).map(|ch| ChallengeRef {
            title: ch.title.clone(),
            language: ch.language.clone(),
          }),
        })
        .collect(),
    )
  }

  #[instrument(level = "debug", skip(self))]
  async fn get_definition(&self, id: &str) -> StoreResult<Option<Definition>> {
    Ok(self.definitions.read().await.get(id).cloned())
  }

  #[instrument(level = "debug", skip(self))]
  async fn list_definitions(&self, language: Option<&str>) -> StoreResult<Vec<Definition>> {
    let mut out: Vec<Definition> = self
      .definitions
      .read()
      .await
      .values()
      .filter(|d| language.map_or(true, |l| d.language == l))
      .cloned()
      .collect();
    out.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
    Ok(out)
  }

  #[instrument(level = "debug", skip(self))]
  async fn insert_read(&self, user_id: &str, definition_id: &str) -> StoreResult<()> {
    self.reads.write().await.push(ReadDefinition {
      user_id: user_id.to_string(),
      definition_id: definition_id.to_string(),
      read_at: Some(Utc::now()),
    });
    Ok(())
  }

  #[instrument(level = "debug", skip(self))]
  async fn delete_read(&self, user_id: &str, definition_id: &str) -> StoreResult<usize> {
    let mut reads = self.reads.write().await;
    let before = reads.len();
    reads.retain(|r| !(r.user_id == user_id && r.definition_id == definition_id));
    Ok(before - reads.len())
  }

  #[instrument(level = "debug", skip(self))]
  async fn read_definition_ids(&self, user_id: &str) -> StoreResult<Vec<String>> {
    Ok(
      self
        .reads
        .read()
        .await
        .iter()
        .filter(|r| r.user_id == user_id)
        .map(|r| r.definition_id.clone())
        .collect(),
    )
  }

  #[instrument(level = "debug", skip(self))]
  async fn list_reads(&self, user_id: &str) -> StoreResult<Vec<ReadRow>> {
    let rows: Vec<ReadDefinition> = {
      self.reads.read().await.iter().filter(|r| r.user_id == user_id).cloned().collect()
    };
    let definitions = self.definitions.read().await;
    Ok(
      rows
        .into_iter()
        .map(|r| ReadRow {
          read_at: r.read_at,
          definition: definitions.get(&r.definition_id).map(|d| DefinitionRef {
            title: d.title.clone(),
            language: d.language.clone(),
          }),
        })
        .collect(),
    )
  }

  #[instrument(level = "debug", skip(self, profile), fields(id = %profile.id))]
  async fn insert_profile(&self, profile: Profile) -> StoreResult<()> {
    let mut profiles = self.profiles.write().await;
    if profiles.contains_key(&profile.id) {
      return Err(StoreError::Write(format!("profile {} already exists", profile.id)));
    }
    profiles.insert(profile.id.clone(), profile);
    Ok(())
  }
}
