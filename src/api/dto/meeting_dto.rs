//! Meeting roster DTOs.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{MeetingId, Participant};

/// `GET /api/v1/meetings/{meeting_id}/participants` response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MeetingRosterResponse {
    /// Meeting that was looked up.
    pub meeting_id: MeetingId,
    /// Current members in join order.
    pub participants: Vec<Participant>,
    /// Number of members.
    pub count: usize,
}

impl MeetingRosterResponse {
    /// Builds the response from a registry snapshot.
    #[must_use]
    pub fn new(meeting_id: MeetingId, participants: Vec<Participant>) -> Self {
        let count = participants.len();
        Self {
            meeting_id,
            participants,
            count,
        }
    }
}
