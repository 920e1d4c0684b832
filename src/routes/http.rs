//! HTTP endpoint handlers. These are thin wrappers that forward to `AppState`.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;
use axum::{
  extract::{rejection::JsonRejection, Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument, warn};

use crate::error::{QuizError, SessionError, SubmissionError};
use crate::protocol::*;
use crate::state::AppState;

fn error_response(status: StatusCode, message: String) -> Response {
  (status, Json(ErrorOut { error: message })).into_response()
}

impl IntoResponse for SessionError {
  fn into_response(self) -> Response {
    let status = match &self {
      SessionError::EmptyName => StatusCode::BAD_REQUEST,
      SessionError::NotFound(_) => StatusCode::NOT_FOUND,
      SessionError::AlreadySubmitted(_) => StatusCode::CONFLICT,
      SessionError::Quiz(QuizError::InvalidState { .. }) => StatusCode::CONFLICT,
      SessionError::Quiz(QuizError::Configuration(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, self.to_string())
  }
}

/// Submission failures still answer with `{success: false, message}` so the
/// client can carry on to the certificate.
impl IntoResponse for SubmissionError {
  fn into_response(self) -> Response {
    let status = match &self {
      SubmissionError::MissingField(_) | SubmissionError::InvalidEmail => StatusCode::BAD_REQUEST,
      SubmissionError::Session(SessionError::NotFound(_)) => StatusCode::NOT_FOUND,
      SubmissionError::Session(SessionError::Quiz(QuizError::Configuration(_))) => StatusCode::INTERNAL_SERVER_ERROR,
      SubmissionError::Session(_) => StatusCode::CONFLICT,
      SubmissionError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
      SubmissionError::Upstream(_) => StatusCode::BAD_GATEWAY,
    };
    (status, Json(SubmitOut { success: false, message: self.to_string() })).into_response()
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_blocks(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(catalog_out(&state.catalog))
}

#[instrument(level = "info", skip(state, body), fields(seeded = body.seed.is_some()))]
pub async fn http_post_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<StartIn>,
) -> Result<impl IntoResponse, SessionError> {
  let (id, name, snap) = state.start_session(&body.name, body.seed).await?;
  info!(target: "quiz", session = %id, "HTTP session started");
  Ok((StatusCode::CREATED, Json(session_out(&id, &name, &snap))))
}

#[instrument(level = "info", skip_all, fields(%session_id))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<String>,
) -> Result<impl IntoResponse, SessionError> {
  let (name, snap) = state.session_snapshot(&session_id).await?;
  Ok(Json(session_out(&session_id, &name, &snap)))
}

#[instrument(level = "info", skip_all, fields(%session_id))]
pub async fn http_delete_session(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<String>,
) -> Result<impl IntoResponse, SessionError> {
  state.abandon_session(&session_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[instrument(level = "info", skip_all, fields(%session_id, block_id = %body.block_id))]
pub async fn http_post_attempt(
  State(state): State<Arc<AppState>>,
  Path(session_id): Path<String>,
  Json(body): Json<AttemptIn>,
) -> Result<impl IntoResponse, SessionError> {
  let (result, name, snap) = state.submit_attempt(&session_id, &body.block_id).await?;
  Ok(Json(attempt_out(&result, session_out(&session_id, &name, &snap))))
}

/// Body errors (bad JSON, negative or fractional score) answer in the same
/// `{success, message}` shape as every other submission failure.
#[instrument(level = "info", skip_all)]
pub async fn http_post_submit(
  State(state): State<Arc<AppState>>,
  body: Result<Json<SubmitIn>, JsonRejection>,
) -> Response {
  let Json(body) = match body {
    Ok(body) => body,
    Err(rejection) => {
      warn!(target: "submission", status = %rejection.status(), "HTTP submission body rejected");
      return (rejection.status(), Json(SubmitOut { success: false, message: rejection.body_text() })).into_response();
    }
  };
  match state.submit_record(body).await {
    Ok(rec) => {
      info!(target: "submission", id = %rec.id, score = rec.score, "HTTP submission stored");
      Json(SubmitOut { success: true, message: "Submission saved".into() }).into_response()
    }
    Err(e) => {
      warn!(target: "submission", error = %e, "HTTP submission rejected");
      e.into_response()
    }
  }
}
