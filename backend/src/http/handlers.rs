//! HTTP handlers for the REST API.
//!
//! Each handler maps the request onto `services::meetings` and the result
//! back onto JSON.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};

use super::dto::{
    CreateMeetingRequest, DeleteMeetingResponse, HealthResponse, MeetingDetail,
    MeetingListResponse, PreviewRequest, PreviewResponse,
};
use super::error::AppError;
use super::identity::Caller;
use super::state::AppState;
use crate::models::MeetingId;
use crate::services::meetings;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn meeting_id(path: Result<Path<i64>, PathRejection>) -> Result<MeetingId, AppError> {
    path.map(|Path(id)| MeetingId::new(id))
        .map_err(|_| AppError::BadRequest("meeting id must be an integer".to_string()))
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let database = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database,
    }))
}

/// GET /v1/meetings
pub async fn list_meetings(
    State(state): State<AppState>,
    Caller(user): Caller,
) -> HandlerResult<MeetingListResponse> {
    let meetings = meetings::list_meetings(state.repository.as_ref(), &user).await?;
    Ok(Json(meetings.into()))
}

/// POST /v1/meetings
///
/// On refusal the error body names the failing slot and echoes the form.
pub async fn create_meeting(
    State(state): State<AppState>,
    Caller(user): Caller,
    payload: Result<Json<CreateMeetingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MeetingDetail>), AppError> {
    let submission = body(payload)?;
    let now = state.now();

    let created = meetings::create_meeting(
        state.repository.as_ref(),
        &state.submission,
        &user,
        &submission,
        now,
    )
    .await;
    let detail = created.map_err(|e| AppError::from(e).with_form(submission))?;

    tracing::info!(
        meeting_id = %detail.meeting.meeting_id,
        slots = detail.slots.len(),
        "meeting created"
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /v1/meetings/{meeting_id}
pub async fn get_meeting(
    State(state): State<AppState>,
    Caller(_user): Caller,
    path: Result<Path<i64>, PathRejection>,
) -> HandlerResult<MeetingDetail> {
    let meeting_id = meeting_id(path)?;
    let detail = meetings::get_meeting_detail(state.repository.as_ref(), meeting_id).await?;
    Ok(Json(detail))
}

/// DELETE /v1/meetings/{meeting_id}
pub async fn delete_meeting(
    State(state): State<AppState>,
    Caller(user): Caller,
    path: Result<Path<i64>, PathRejection>,
) -> HandlerResult<DeleteMeetingResponse> {
    let meeting_id = meeting_id(path)?;
    let deleted = meetings::delete_meeting(state.repository.as_ref(), &user, meeting_id).await?;
    Ok(Json(DeleteMeetingResponse { deleted }))
}

/// POST /v1/slots/preview
///
/// Always 200; the verdict is in the body.
pub async fn preview_slot(
    State(state): State<AppState>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> HandlerResult<PreviewResponse> {
    let request = body(payload)?;
    let result = meetings::preview_slot(&state.preview, &request.start, &request.end, state.now());
    Ok(Json(result.into()))
}
