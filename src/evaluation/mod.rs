//! Submission evaluation: grade candidate code against a challenge and persist
//! the outcome.
//!
//! The write sequence is a saga of independent store calls:
//!
//! ```text
//!   resolve challenge ─► check identity ─► insert attempt (in_progress)   Pending
//!                                      ─► grade with the oracle           Evaluated
//!                                      ─► update attempt status
//!                                      ─► insert completion (success)     Recorded
//! ```
//!
//! Nothing is written before both checks pass. Once the attempt row exists
//! it is never removed, whatever happens afterwards. A failed completion
//! insert leaves the attempt at `success` and the outcome at `Evaluated`.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::{AttemptStatus, ChallengeAttempt, Challenge, NewAttempt, RequestContext};
use crate::store::{ContentStore, StoreError};
use crate::util::trunc_for_log;

pub mod canned;

pub const MSG_CORRECT: &str = "Solution is correct!";
pub const MSG_INCORRECT: &str = "Solution is incorrect. Try again!";

#[derive(Debug, Error)]
pub enum EvalError {
  #[error("challenge not found")]
  NotFound,
  #[error("no authenticated user")]
  Unauthorized,
  #[error("failed to create attempt: {0}")]
  AttemptCreate(#[source] StoreError),
  #[error("store failure: {0}")]
  Store(#[source] StoreError),
}

/// Decision of an oracle for one submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
  Correct,
  Incorrect,
}

impl Verdict {
  pub fn passed(self) -> bool {
    matches!(self, Verdict::Correct)
  }

  pub fn status(self) -> AttemptStatus {
    match self {
      Verdict::Correct => AttemptStatus::Success,
      Verdict::Incorrect => AttemptStatus::Failed,
    }
  }
}

/// Grading strategy. A sandboxed executor would implement this too.
pub trait Oracle: Send + Sync {
  fn name(&self) -> &'static str;
  fn grade(&self, challenge: &Challenge, code: &str) -> Verdict;
}

/// Exact text match after trimming surrounding whitespace on both sides.
/// Semantically equivalent but textually different code is rejected.
#[derive(Clone, Copy, Debug, Default)]
pub struct TrivialOracle;

impl Oracle for TrivialOracle {
  fn name(&self) -> &'static str {
    "trivial"
  }

  fn grade(&self, challenge: &Challenge, code: &str) -> Verdict {
    if code.trim() == challenge.solution.trim() {
      Verdict::Correct
    } else {
      Verdict::Incorrect
    }
  }
}

/// Resolve an oracle by its configured name.
pub fn oracle_by_name(name: &str) -> Option<Arc<dyn Oracle>> {
  match name {
    "trivial" => Some(Arc::new(TrivialOracle)),
    _ => None,
  }
}

/// Furthest step of the write sequence that completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SagaStage {
  /// Attempt row exists with `in_progress`.
  Pending,
  /// Attempt carries its terminal status; no completion row was written.
  Evaluated,
  /// Completion row written.
  Recorded,
}

#[derive(Clone, Debug)]
pub struct SubmissionOutcome {
  pub attempt_id: String,
  pub verdict: Verdict,
  pub stage: SagaStage,
}

impl SubmissionOutcome {
  pub fn success(&self) -> bool {
    self.verdict.passed()
  }

  pub fn message(&self) -> &'static str {
    if self.success() { MSG_CORRECT } else { MSG_INCORRECT }
  }

  /// Whether a completion row was written for this call.
  pub fn completion_recorded(&self) -> bool {
    self.stage == SagaStage::Recorded
  }
}

#[derive(Clone)]
pub struct SubmissionEvaluator {
  store: Arc<dyn ContentStore>,
  oracle: Arc<dyn Oracle>,
}

impl SubmissionEvaluator {
  pub fn new(store: Arc<dyn ContentStore>, oracle: Arc<dyn Oracle>) -> Self {
    Self { store, oracle }
  }

  pub fn oracle_name(&self) -> &'static str {
    self.oracle.name()
  }

  /// Grade `code` against `challenge_id` for the caller in `ctx`.
  #[instrument(level = "info", skip(self, ctx, code), fields(%challenge_id, code_len = code.len(), oracle = self.oracle.name()))]
  pub async fn submit(
    &self,
    ctx: &RequestContext,
    challenge_id: &str,
    code: &str,
  ) -> Result<SubmissionOutcome, EvalError> {
    let challenge = self
      .store
      .get_challenge(challenge_id)
      .await
      .map_err(|e| {
        error!(target: "submission", %challenge_id, error = %e, "Challenge lookup failed");
        EvalError::Store(e)
      })?
      .ok_or(EvalError::NotFound)?;

    let identity = ctx.identity.as_ref().ok_or(EvalError::Unauthorized)?;
    debug!(target: "submission", user_id = %identity.user_id, preview = %trunc_for_log(code, 80), "Submission received");

    let attempt = self
      .store
      .insert_attempt(NewAttempt {
        user_id: identity.user_id.clone(),
        challenge_id: challenge.id.clone(),
        code: code.to_string(),
        status: AttemptStatus::InProgress,
      })
      .await
      .map_err(EvalError::AttemptCreate)?;

    let verdict = self.oracle.grade(&challenge, code);

    self
      .store
      .update_attempt_status(&attempt.id, verdict.status())
      .await
      .map_err(|e| {
        error!(target: "submission", attempt_id = %attempt.id, error = %e, "Attempt left in_progress");
        EvalError::Store(e)
      })?;

    let mut stage = SagaStage::Evaluated;
    if verdict.passed() {
      match self.store.insert_completion(&identity.user_id, &challenge.id).await {
        Ok(_) => stage = SagaStage::Recorded,
        Err(e) => {
          warn!(target: "submission", attempt_id = %attempt.id, error = %e, "Completion not recorded; attempt stays success");
        }
      }
    }

    info!(target: "submission", attempt_id = %attempt.id, user_id = %identity.user_id, passed = verdict.passed(), ?stage, "Submission evaluated");
    Ok(SubmissionOutcome { attempt_id: attempt.id, verdict, stage })
  }

  /// The caller's attempts for one challenge, newest first.
  #[instrument(level = "info", skip(self, ctx), fields(%challenge_id))]
  pub async fn list_attempts(
    &self,
    ctx: &RequestContext,
    challenge_id: &str,
  ) -> Result<Vec<ChallengeAttempt>, EvalError> {
    let user_id = ctx.user_id().ok_or(EvalError::Unauthorized)?;
    if self.store.get_challenge(challenge_id).await.map_err(EvalError::Store)?.is_none() {
      return Err(EvalError::NotFound);
    }
    self.store.list_attempts(user_id, challenge_id).await.map_err(EvalError::Store)
  }
}
