//! Challenge and definition browsing, plus the read-mark toggle.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::{Challenge, Definition, RequestContext};
use crate::store::{ChallengeFilter, ContentStore, StoreError};

#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("not found")]
  NotFound,
  #[error("no authenticated user")]
  Unauthorized,
  #[error("store failure: {0}")]
  Store(#[from] StoreError),
}

/// Read-status filter for the definition list.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReadStatus {
  #[default]
  All,
  Read,
  Unread,
}

impl ReadStatus {
  fn keep(self, is_read: bool) -> bool {
    match self {
      ReadStatus::All => true,
      ReadStatus::Read => is_read,
      ReadStatus::Unread => !is_read,
    }
  }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct FilterOptions {
  pub languages: Vec<String>,
  pub topics: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct DefinitionView {
  pub definition: Definition,
  pub is_read: bool,
}

#[derive(Clone)]
pub struct Catalog {
  store: Arc<dyn ContentStore>,
}

impl Catalog {
  pub fn new(store: Arc<dyn ContentStore>) -> Self {
    Self { store }
  }

  #[instrument(level = "info", skip(self))]
  pub async fn list_challenges(&self, filter: &ChallengeFilter) -> Result<Vec<Challenge>, CatalogError> {
    Ok(self.store.list_challenges(filter).await?)
  }

  /// Distinct languages and topics across all challenges, sorted.
  #[instrument(level = "info", skip(self))]
  pub async fn challenge_filters(&self) -> Result<FilterOptions, CatalogError> {
    let all = self.store.list_challenges(&ChallengeFilter::default()).await?;
    let languages: BTreeSet<String> = all.iter().map(|c| c.language.clone()).collect();
    let topics: BTreeSet<String> = all.iter().map(|c| c.topic.clone()).filter(|t| !t.is_empty()).collect();
    Ok(FilterOptions { languages: languages.into_iter().collect(), topics: topics.into_iter().collect() })
  }

  #[instrument(level = "info", skip(self))]
  pub async fn get_challenge(&self, id: &str) -> Result<Challenge, CatalogError> {
    self.store.get_challenge(id).await?.ok_or(CatalogError::NotFound)
  }

  async fn read_ids(&self, ctx: &RequestContext) -> Result<HashSet<String>, CatalogError> {
    match ctx.user_id() {
      Some(uid) => Ok(self.store.read_definition_ids(uid).await?.into_iter().collect()),
      None => Ok(HashSet::new()),
    }
  }

  /// Anonymous callers see every definition as unread.
  #[instrument(level = "info", skip(self, ctx))]
  pub async fn list_definitions(
    &self,
    ctx: &RequestContext,
    language: Option<&str>,
    status: ReadStatus,
  ) -> Result<Vec<DefinitionView>, CatalogError> {
    let defs = self.store.list_definitions(language).await?;
    let read = self.read_ids(ctx).await?;
    Ok(
      defs
        .into_iter()
        .map(|d| {
          let is_read = read.contains(&d.id);
          DefinitionView { definition: d, is_read }
        })
        .filter(|v| status.keep(v.is_read))
        .collect(),
    )
  }

  #[instrument(level = "info", skip(self, ctx))]
  pub async fn get_definition(&self, ctx: &RequestContext, id: &str) -> Result<DefinitionView, CatalogError> {
    let definition = self.store.get_definition(id).await?.ok_or(CatalogError::NotFound)?;
    let is_read = self.read_ids(ctx).await?.contains(id);
    Ok(DefinitionView { definition, is_read })
  }

  /// Idempotent: an already-read definition gets no second row.
  #[instrument(level = "info", skip(self, ctx))]
  pub async fn mark_read(&self, ctx: &RequestContext, id: &str) -> Result<(), CatalogError> {
    let user_id = ctx.user_id().ok_or(CatalogError::Unauthorized)?;
    if self.store.get_definition(id).await?.is_none() {
      return Err(CatalogError::NotFound);
    }
    if self.store.read_definition_ids(user_id).await?.iter().any(|d| d == id) {
      return Ok(());
    }
    self.store.insert_read(user_id, id).await?;
    info!(target: "catalog", %user_id, definition_id = %id, "Definition marked as read");
    Ok(())
  }

  #[instrument(level = "info", skip(self, ctx))]
  pub async fn unmark_read(&self, ctx: &RequestContext, id: &str) -> Result<(), CatalogError> {
    let user_id = ctx.user_id().ok_or(CatalogError::Unauthorized)?;
    if self.store.get_definition(id).await?.is_none() {
      return Err(CatalogError::NotFound);
    }
    let removed = self.store.delete_read(user_id, id).await?;
    info!(target: "catalog", %user_id, definition_id = %id, removed, "Definition unmarked");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Identity;
  use crate::seeds::{seed_challenges, seed_definitions};
  use crate::store::memory::MemoryStore;

  fn catalog() -> (MemoryStore, Catalog) {
    let store = MemoryStore::with_content(seed_challenges(), seed_definitions());
    (store.clone(), Catalog::new(Arc::new(store)))
  }

  fn ctx(uid: &str) -> RequestContext {
    RequestContext::for_user(Identity { user_id: uid.into(), email: format!("{uid}@example.com") })
  }

  #[tokio::test]
  async fn filter_options_are_distinct_and_sorted() {
    let (_, cat) = catalog();
    let opts = cat.challenge_filters().await.unwrap();
    assert_eq!(opts.languages, vec!["python"]);
    assert_eq!(opts.topics, vec!["loops", "math", "strings"]);
  }

  #[tokio::test]
  async fn unknown_challenge_is_not_found() {
    let (_, cat) = catalog();
    assert!(matches!(cat.get_challenge("nope").await, Err(CatalogError::NotFound)));
  }

  #[tokio::test]
  async fn mark_read_twice_writes_one_row() {
    let (store, cat) = catalog();
    cat.mark_read(&ctx("u1"), "closures").await.unwrap();
    cat.mark_read(&ctx("u1"), "closures").await.unwrap();
    assert_eq!(store.read_definition_ids("u1").await.unwrap().len(), 1);
    assert!(cat.get_definition(&ctx("u1"), "closures").await.unwrap().is_read);
    assert!(!cat.get_definition(&ctx("u2"), "closures").await.unwrap().is_read);
  }

  #[tokio::test]
  async fn unmark_toggles_back_to_unread() {
    let (_, cat) = catalog();
    cat.mark_read(&ctx("u1"), "closures").await.unwrap();
    cat.unmark_read(&ctx("u1"), "closures").await.unwrap();
    assert!(!cat.get_definition(&ctx("u1"), "closures").await.unwrap().is_read);
  }

  #[tokio::test]
  async fn read_status_partitions_the_list() {
    let (_, cat) = catalog();
    let me = ctx("u1");
    cat.mark_read(&me, "ownership").await.unwrap();

    let read = cat.list_definitions(&me, None, ReadStatus::Read).await.unwrap();
    let unread = cat.list_definitions(&me, None, ReadStatus::Unread).await.unwrap();
    let all = cat.list_definitions(&me, None, ReadStatus::All).await.unwrap();
    assert_eq!(read.len(), 1);
    assert_eq!(read[0].definition.id, "ownership");
    assert_eq!(read.len() + unread.len(), all.len());

    let python = cat.list_definitions(&me, Some("python"), ReadStatus::All).await.unwrap();
    assert!(python.iter().all(|v| v.definition.language == "python" && !v.is_read));
  }

  #[tokio::test]
  async fn toggling_requires_identity_and_known_definition() {
    let (_, cat) = catalog();
    assert!(matches!(cat.mark_read(&RequestContext::anonymous(), "closures").await, Err(CatalogError::Unauthorized)));
    assert!(matches!(cat.mark_read(&ctx("u1"), "nope").await, Err(CatalogError::NotFound)));
    assert!(matches!(cat.unmark_read(&RequestContext::anonymous(), "closures").await, Err(CatalogError::Unauthorized)));
  }
}
