//! Meeting roster handler.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::MeetingRosterResponse;
use crate::app_state::AppState;
use crate::domain::MeetingId;
use crate::error::{ErrorResponse, RelayError};

/// `GET /meetings/{meeting_id}/participants` — Current members of a meeting.
///
/// An unknown meeting is simply empty.
///
/// # Errors
///
/// Returns [`RelayError::InvalidField`] for a blank meeting id.
#[utoipa::path(
    get,
    path = "/api/v1/meetings/{meeting_id}/participants",
    tag = "Meetings",
    summary = "List meeting participants",
    description = "Returns the participants currently joined to the meeting, in join order.",
    params(
        ("meeting_id" = String, Path, description = "Meeting identifier"),
    ),
    responses(
        (status = 200, description = "Current roster", body = MeetingRosterResponse),
        (status = 400, description = "Blank meeting id", body = ErrorResponse),
    )
)]
pub async fn list_participants(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
) -> Result<impl IntoResponse, RelayError> {
    if meeting_id.trim().is_empty() {
        return Err(RelayError::InvalidField(
            "meeting_id must not be empty".to_string(),
        ));
    }
    let meeting_id = MeetingId::new(meeting_id);
    let participants = state
        .relay_service
        .registry()
        .list_by_meeting(&meeting_id)
        .await;

    Ok((
        StatusCode::OK,
        Json(MeetingRosterResponse::new(meeting_id, participants)),
    ))
}

/// Meeting routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/meetings/{meeting_id}/participants",
        get(list_participants),
    )
}
