//! HTTP endpoint handlers. These are thin wrappers that forward to the services in `AppState`.
//! Each handler is instrumented and logs parameters and basic result info (never submitted code).

use std::sync::Arc;
use axum::{
  extract::{rejection::JsonRejection, Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument, warn};

use crate::auth::register;
use crate::domain::RequestContext;
use crate::error::ApiError;
use crate::evaluation::canned::simulate_execution;
use crate::progress::ProgressReport;
use crate::protocol::*;
use crate::routes::extract::BearerToken;
use crate::state::AppState;
use crate::store::ChallengeFilter;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

/// Canned execution: same response for any well-formed body, nothing written.
#[instrument(level = "info", skip(body))]
pub async fn http_post_execute(body: Result<Json<RunCodeIn>, JsonRejection>) -> Response {
  match body {
    Ok(Json(body)) => Json(simulate_execution(&body.code, &body.challenge_id)).into_response(),
    Err(rej) => {
      warn!(target: "submission", error = %rej.body_text(), "Execute request rejected");
      (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ExecuteErrorOut { success: false, error: rej.body_text() }),
      )
        .into_response()
    }
  }
}

/// Real evaluation: trivial-oracle grading plus attempt/completion writes.
#[instrument(level = "info", skip(state, ctx, body))]
pub async fn http_post_run_code(
  State(state): State<Arc<AppState>>,
  ctx: RequestContext,
  body: Result<Json<RunCodeIn>, JsonRejection>,
) -> ApiResult<RunCodeOut> {
  let Json(body) = body.map_err(|rej| {
    warn!(target: "submission", error = %rej.body_text(), "Run-code request rejected");
    ApiError::internal()
  })?;
  let outcome = state.evaluator.submit(&ctx, &body.challenge_id, &body.code).await?;
  info!(
    target: "submission",
    id = %body.challenge_id,
    attempt_id = %outcome.attempt_id,
    success = outcome.success(),
    completion_recorded = outcome.completion_recorded(),
    "HTTP run-code evaluated"
  );
  Ok(Json(RunCodeOut { success: outcome.success(), message: outcome.message().to_string() }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_challenges(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ChallengeQuery>,
) -> ApiResult<Vec<ChallengeSummaryOut>> {
  let filter = ChallengeFilter { language: q.language, topic: q.topic, difficulty: q.difficulty };
  let list = state.catalog.list_challenges(&filter).await?;
  Ok(Json(list.iter().map(to_summary).collect()))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_challenge_filters(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  state.catalog.challenge_filters().await.map(Json).map_err(ApiError::from)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_challenge(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> ApiResult<ChallengeDetailOut> {
  let ch = state.catalog.get_challenge(&id).await?;
  Ok(Json(to_detail(ch)))
}

#[instrument(level = "info", skip(state, ctx))]
pub async fn http_get_attempts(
  State(state): State<Arc<AppState>>,
  ctx: RequestContext,
  Path(id): Path<String>,
) -> ApiResult<Vec<AttemptOut>> {
  let attempts = state.evaluator.list_attempts(&ctx, &id).await?;
  Ok(Json(attempts.into_iter().map(to_attempt_out).collect()))
}

#[instrument(level = "info", skip(state, ctx))]
pub async fn http_get_definitions(
  State(state): State<Arc<AppState>>,
  ctx: RequestContext,
  Query(q): Query<DefinitionQuery>,
) -> ApiResult<Vec<DefinitionSummaryOut>> {
  let views = state.catalog.list_definitions(&ctx, q.language.as_deref(), q.status).await?;
  Ok(Json(views.into_iter().map(to_definition_summary).collect()))
}

#[instrument(level = "info", skip(state, ctx))]
pub async fn http_get_definition(
  State(state): State<Arc<AppState>>,
  ctx: RequestContext,
  Path(id): Path<String>,
) -> ApiResult<DefinitionDetailOut> {
  let view = state.catalog.get_definition(&ctx, &id).await?;
  Ok(Json(to_definition_detail(view)))
}

#[instrument(level = "info", skip(state, ctx))]
pub async fn http_post_mark_read(
  State(state): State<Arc<AppState>>,
  ctx: RequestContext,
  Path(id): Path<String>,
) -> ApiResult<ReadStateOut> {
  state.catalog.mark_read(&ctx, &id).await?;
  Ok(Json(ReadStateOut { is_read: true }))
}

#[instrument(level = "info", skip(state, ctx))]
pub async fn http_delete_mark_read(
  State(state): State<Arc<AppState>>,
  ctx: RequestContext,
  Path(id): Path<String>,
) -> ApiResult<ReadStateOut> {
  state.catalog.unmark_read(&ctx, &id).await?;
  Ok(Json(ReadStateOut { is_read: false }))
}

#[instrument(level = "info", skip(state, ctx))]
pub async fn http_get_progress(
  State(state): State<Arc<AppState>>,
  ctx: RequestContext,
) -> ApiResult<ProgressReport> {
  Ok(Json(state.progress.report(&ctx).await?))
}

/// Credentials body, with rejections in the same `{ "error": ... }` shape as every other failure.
fn credentials(body: Result<Json<CredentialsIn>, JsonRejection>) -> Result<CredentialsIn, ApiError> {
  body.map(|Json(c)| c).map_err(|rej| {
    warn!(target: "auth", error = %rej.body_text(), "Credentials body rejected");
    ApiError::new(StatusCode::BAD_REQUEST, "Invalid request body")
  })
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_signup(
  State(state): State<Arc<AppState>>,
  body: Result<Json<CredentialsIn>, JsonRejection>,
) -> ApiResult<SessionOut> {
  let body = credentials(body)?;
  let session = register(state.identity.as_ref(), state.store.as_ref(), &body.email, &body.password).await?;
  Ok(Json(session.into()))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_signin(
  State(state): State<Arc<AppState>>,
  body: Result<Json<CredentialsIn>, JsonRejection>,
) -> ApiResult<SessionOut> {
  let body = credentials(body)?;
  let session = state.identity.sign_in(&body.email, &body.password).await?;
  info!(target: "auth", user_id = %session.identity.user_id, "Signed in");
  Ok(Json(session.into()))
}

#[instrument(level = "info", skip(state, token))]
pub async fn http_post_signout(
  State(state): State<Arc<AppState>>,
  BearerToken(token): BearerToken,
) -> ApiResult<HealthOut> {
  let token = token.ok_or_else(ApiError::unauthorized)?;
  state.identity.sign_out(&token).await?;
  Ok(Json(HealthOut { ok: true }))
}

#[instrument(level = "info", skip(ctx))]
pub async fn http_get_me(ctx: RequestContext) -> ApiResult<UserOut> {
  let identity = ctx.identity.ok_or_else(ApiError::unauthorized)?;
  Ok(Json(identity.into()))
}
