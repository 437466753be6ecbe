//! Data Transfer Objects for the HTTP API.
//!
//! Stored entities (`Meeting`, `MeetingDetail`) serialize as they are; the
//! types here cover the envelopes around them.

use serde::{Deserialize, Serialize};

pub use crate::models::{Meeting, MeetingDetail, Slot, TimeInterval};
pub use crate::services::slot_validator::SlotSubmission as CreateMeetingRequest;
use crate::services::slot_validator::ValidationResult;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// "connected", "disconnected" or the error seen
    pub database: String,
}

/// Meetings owned by the caller, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingListResponse {
    pub meetings: Vec<Meeting>,
    pub total: usize,
}

impl From<Vec<Meeting>> for MeetingListResponse {
    fn from(meetings: Vec<Meeting>) -> Self {
        let total = meetings.len();
        Self { meetings, total }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteMeetingResponse {
    pub deleted: u64,
}

/// One slot as typed into the form, as local wall-clock strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

/// Advisory verdict on a single slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The slot normalized to universal time, when accepted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<TimeInterval>,
}

impl From<ValidationResult> for PreviewResponse {
    fn from(result: ValidationResult) -> Self {
        match result {
            ValidationResult::Accepted(interval) => Self {
                valid: true,
                code: None,
                message: None,
                slot: Some(interval),
            },
            ValidationResult::Rejected(rejection) => Self {
                valid: false,
                code: Some(rejection.reason.code().to_string()),
                message: Some(rejection.message),
                slot: None,
            },
        }
    }
}
