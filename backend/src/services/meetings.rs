//! Meeting workflow on top of a [`MeetingRepository`].
//!
//! These functions hold the request-independent half of each endpoint: role
//! and ownership checks, slot validation, and the calls into storage. The
//! HTTP layer only maps inputs and errors.

use chrono::{DateTime, Utc};

use crate::db::repository::{MeetingRepository, RepositoryError};
use crate::models::{Actor, Meeting, MeetingDetail, MeetingId, NewMeeting};
use crate::services::slot_validator::{
    SlotSubmission, SlotValidator, SubmissionRejection, ValidationResult,
};

pub type MeetingServiceResult<T> = Result<T, MeetingServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum MeetingServiceError {
    #[error("{0}")]
    Rejected(#[from] SubmissionRejection),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("meeting {0} not found")]
    NotFound(MeetingId),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Validate a submission and store the meeting with all of its slots.
///
/// Nothing is written unless every slot passes; storage then commits the
/// meeting and its slots as one unit.
pub async fn create_meeting(
    repo: &dyn MeetingRepository,
    validator: &SlotValidator,
    organizer: &Actor,
    submission: &SlotSubmission,
    now: DateTime<Utc>,
) -> MeetingServiceResult<MeetingDetail> {
    if !organizer.is_organizer() {
        return Err(MeetingServiceError::Forbidden(
            "only organizers can create meetings".to_string(),
        ));
    }

    let slots = validator.check_submission(submission, now)?;

    let meeting = NewMeeting::new(
        organizer.user_id,
        submission.title.trim(),
        submission.description.as_deref(),
    );
    let detail = repo.create_meeting_with_slots(&meeting, &slots).await?;

    log::info!(
        "meeting {} created by user {} with {} slot(s)",
        detail.meeting.meeting_id,
        organizer.user_id,
        detail.slots.len()
    );
    Ok(detail)
}

pub async fn get_meeting_detail(
    repo: &dyn MeetingRepository,
    meeting_id: MeetingId,
) -> MeetingServiceResult<MeetingDetail> {
    let meeting = repo
        .get_meeting(meeting_id)
        .await?
        .ok_or(MeetingServiceError::NotFound(meeting_id))?;
    let slots = repo.list_slots(meeting_id).await?;
    Ok(MeetingDetail { meeting, slots })
}

/// Meetings visible to `user`, newest first.
///
/// Participants have no invitations yet, so they always see an empty list.
pub async fn list_meetings(
    repo: &dyn MeetingRepository,
    user: &Actor,
) -> MeetingServiceResult<Vec<Meeting>> {
    if !user.is_organizer() {
        return Ok(Vec::new());
    }
    Ok(repo.list_meetings_by_owner(user.user_id).await?)
}

/// Delete a meeting and its slots. Only the organizer who owns it may do so.
pub async fn delete_meeting(
    repo: &dyn MeetingRepository,
    user: &Actor,
    meeting_id: MeetingId,
) -> MeetingServiceResult<u64> {
    let meeting = repo
        .get_meeting(meeting_id)
        .await?
        .ok_or(MeetingServiceError::NotFound(meeting_id))?;

    if !user.is_organizer() || meeting.organizer_id != user.user_id {
        log::warn!(
            "user {} ({}) tried to delete meeting {} owned by {}",
            user.user_id,
            user.role,
            meeting_id,
            meeting.organizer_id
        );
        return Err(MeetingServiceError::Forbidden(format!(
            "meeting {} belongs to another organizer",
            meeting_id
        )));
    }

    let deleted = repo.delete_meeting(meeting_id).await?;
    log::info!("meeting {} deleted by user {}", meeting_id, user.user_id);
    Ok(deleted)
}

/// Advisory check of one slot while the form is being filled in.
pub fn preview_slot(
    validator: &SlotValidator,
    start: &str,
    end: &str,
    now: DateTime<Utc>,
) -> ValidationResult {
    validator.check(start, end, now)
}
