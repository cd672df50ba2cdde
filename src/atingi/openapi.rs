//! OpenAPI document for the documented routes.

use axum::response::Json;
use utoipa::OpenApi;

use crate::atingi::{
    checkin::FormEntry,
    handlers::{checkin, health},
    model::{Assignee, Confidence, Initiative, KeyResult, Objective, Risk, Task},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        checkin::open,
        checkin::update,
        checkin::submit,
        checkin::suggestions,
        checkin::close,
    ),
    components(schemas(
        Objective,
        KeyResult,
        Initiative,
        Task,
        Risk,
        Assignee,
        Confidence,
        FormEntry,
        checkin::CheckInOpened,
        checkin::ConfidenceUpdate,
        checkin::SuggestionList,
    )),
    tags(
        (name = "checkins", description = "Objective check-in sessions"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
