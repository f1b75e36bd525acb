//! Progress aggregation: turn a user's read/completion history into
//! date-bucketed series for the profile charts.
//!
//! Buckets are UTC calendar dates (`YYYY-MM-DD`). Rows without a timestamp
//! are counted under [`UNKNOWN_DATE`], never dropped. Output is sorted by
//! date with the unknown bucket last. The whole history is loaded on every
//! call; there is no paging or time window.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::domain::{CompletionRow, ReadRow, RequestContext};
use crate::store::{ContentStore, StoreError};

pub const UNKNOWN_DATE: &str = "Unknown Date";

/// A history row that may carry a timestamp.
pub trait Timestamped {
  fn timestamp(&self) -> Option<DateTime<Utc>>;
}

impl Timestamped for CompletionRow {
  fn timestamp(&self) -> Option<DateTime<Utc>> {
    self.completed_at
  }
}

impl Timestamped for ReadRow {
  fn timestamp(&self) -> Option<DateTime<Utc>> {
    self.read_at
  }
}

impl Timestamped for Option<DateTime<Utc>> {
  fn timestamp(&self) -> Option<DateTime<Utc>> {
    *self
  }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct DateBucket {
  pub date: String,
  pub count: usize,
}

pub fn bucket_by_date<T: Timestamped>(rows: &[T]) -> Vec<DateBucket> {
  let mut dated: BTreeMap<String, usize> = BTreeMap::new();
  let mut unknown = 0usize;
  for row in rows {
    match row.timestamp() {
      Some(ts) => *dated.entry(ts.format("%Y-%m-%d").to_string()).or_insert(0) += 1,
      None => unknown += 1,
    }
  }

  let mut out: Vec<DateBucket> = dated
    .into_iter()
    .map(|(date, count)| DateBucket { date, count })
    .collect();
  if unknown > 0 {
    out.push(DateBucket { date: UNKNOWN_DATE.into(), count: unknown });
  }
  out
}

#[derive(Debug, Error)]
pub enum ProgressError {
  #[error("no authenticated user")]
  Unauthorized,
  #[error("history read failed: {0}")]
  Store(#[from] StoreError),
}

#[derive(Clone, Debug, Serialize)]
pub struct ProgressReport {
  pub definitions: Vec<DateBucket>,
  pub challenges: Vec<DateBucket>,
}

#[derive(Clone)]
pub struct ProgressAggregator {
  store: Arc<dyn ContentStore>,
}

impl ProgressAggregator {
  pub fn new(store: Arc<dyn ContentStore>) -> Self {
    Self { store }
  }

  #[instrument(level = "info", skip(self, ctx))]
  pub async fn report(&self, ctx: &RequestContext) -> Result<ProgressReport, ProgressError> {
    let user_id = ctx.user_id().ok_or(ProgressError::Unauthorized)?;
    let reads = self.store.list_reads(user_id).await?;
    let completions = self.store.list_completions(user_id).await?;
    info!(target: "progress", %user_id, reads = reads.len(), completions = completions.len(), "History loaded");
    Ok(ProgressReport {
      definitions: bucket_by_date(&reads),
      challenges: bucket_by_date(&completions),
    })
  }
}
