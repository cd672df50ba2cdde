//! Check-in session endpoints.
//!
//! Flow Overview:
//! 1) `POST /v1/checkins` opens a session from an objective.
//! 2) `PATCH /v1/checkins/{id}` records a confidence level per key result.
//! 3) `POST /v1/checkins/{id}/submit` returns the merged objective; the
//!    caller owns persistence.
//! 4) `POST /v1/checkins/{id}/suggestions` asks the external service for
//!    improvement suggestions against the current, unsaved form.
//! 5) `DELETE /v1/checkins/{id}` discards the session.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};
use ulid::Ulid;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{AppState, CheckIn};
use crate::atingi::{
    checkin::{CheckInForm, FormEntry},
    model::{Confidence, Objective},
};

#[derive(ToSchema, Serialize, Debug)]
pub struct CheckInOpened {
    pub id: String,
    pub entries: Vec<FormEntry>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct ConfidenceUpdate {
    pub key_result_id: Uuid,
    pub confidence: Confidence,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct SuggestionList {
    pub suggestions: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/v1/checkins",
    request_body = Objective,
    responses(
        (status = 201, description = "Check-in opened", body = CheckInOpened),
        (status = 400, description = "Missing or malformed objective"),
    ),
    tag = "checkins"
)]
#[instrument(skip(state, payload))]
pub async fn open(
    state: Extension<AppState>,
    payload: Option<Json<Objective>>,
) -> impl IntoResponse {
    // No objective, nothing to initialize.
    let Some(Json(objective)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing objective".to_string()).into_response();
    };

    let id = Ulid::new();
    let form = CheckInForm::open(&objective);
    let entries = form.entries().to_vec();

    debug!("opened check-in {id} for objective {}", objective.id);

    state
        .checkins()
        .lock()
        .await
        .insert(id, CheckIn { objective, form });

    (
        StatusCode::CREATED,
        Json(CheckInOpened {
            id: id.to_string(),
            entries,
        }),
    )
        .into_response()
}

#[utoipa::path(
    patch,
    path = "/v1/checkins/{id}",
    params(("id" = String, Path, description = "Check-in id")),
    request_body = ConfidenceUpdate,
    responses(
        (status = 200, description = "Confidence recorded", body = [FormEntry]),
        (status = 400, description = "Invalid check-in id"),
        (status = 404, description = "No such check-in"),
        (status = 422, description = "Unknown key result"),
    ),
    tag = "checkins"
)]
#[instrument(skip(state))]
pub async fn update(
    Path(id): Path<String>,
    state: Extension<AppState>,
    payload: Option<Json<ConfidenceUpdate>>,
) -> impl IntoResponse {
    let Ok(id) = Ulid::from_string(id.trim()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    let Some(Json(update)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let mut checkins = state.checkins().lock().await;
    let Some(checkin) = checkins.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if !checkin
        .form
        .set_confidence(update.key_result_id, update.confidence)
    {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("No key result {} in this check-in", update.key_result_id),
        )
            .into_response();
    }

    (StatusCode::OK, Json(checkin.form.entries().to_vec())).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/checkins/{id}/submit",
    params(("id" = String, Path, description = "Check-in id")),
    responses(
        (status = 200, description = "Merged objective; persistence is up to the caller", body = Objective),
        (status = 400, description = "Invalid check-in id"),
        (status = 404, description = "No such check-in"),
    ),
    tag = "checkins"
)]
#[instrument(skip(state))]
pub async fn submit(Path(id): Path<String>, state: Extension<AppState>) -> impl IntoResponse {
    let Ok(id) = Ulid::from_string(id.trim()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let checkins = state.checkins().lock().await;
    let Some(checkin) = checkins.get(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let merged = checkin.form.merged(&checkin.objective);

    (StatusCode::OK, Json(merged)).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/checkins/{id}/suggestions",
    params(("id" = String, Path, description = "Check-in id")),
    responses(
        (status = 200, description = "Suggestions, or a single fallback message", body = SuggestionList),
        (status = 400, description = "Invalid check-in id"),
        (status = 404, description = "No such check-in, or it closed while fetching"),
    ),
    tag = "checkins"
)]
#[instrument(skip(state))]
pub async fn suggestions(Path(id): Path<String>, state: Extension<AppState>) -> impl IntoResponse {
    let Ok(id) = Ulid::from_string(id.trim()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    // Snapshot under the lock, call out without it.
    let snapshot = {
        let checkins = state.checkins().lock().await;
        let Some(checkin) = checkins.get(&id) else {
            return StatusCode::NOT_FOUND.into_response();
        };
        checkin.form.snapshot(&checkin.objective)
    };

    let outcome = state.suggest().improvements(&snapshot).await;
    if let Err(err) = &outcome {
        error!("Suggestion request for check-in {id} failed: {err}");
    }

    // The id is minted per open: if the session is gone the check-in was
    // closed (or reopened under a new id) mid-flight, and the result must
    // not be applied to stale state.
    let mut checkins = state.checkins().lock().await;
    let Some(checkin) = checkins.get_mut(&id) else {
        debug!("check-in {id} closed while fetching suggestions, dropping result");
        return StatusCode::NOT_FOUND.into_response();
    };

    if let Some(event) = checkin.form.apply_suggestions(snapshot.id, outcome) {
        state.emit(event);
    }

    (
        StatusCode::OK,
        Json(SuggestionList {
            suggestions: checkin.form.suggestions().to_vec(),
        }),
    )
        .into_response()
}

#[utoipa::path(
    delete,
    path = "/v1/checkins/{id}",
    params(("id" = String, Path, description = "Check-in id")),
    responses(
        (status = 204, description = "Check-in closed, form state discarded"),
        (status = 400, description = "Invalid check-in id"),
        (status = 404, description = "No such check-in"),
    ),
    tag = "checkins"
)]
#[instrument(skip(state))]
pub async fn close(Path(id): Path<String>, state: Extension<AppState>) -> impl IntoResponse {
    let Ok(id) = Ulid::from_string(id.trim()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    match state.checkins().lock().await.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
