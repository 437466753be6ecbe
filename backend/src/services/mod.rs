//! Slot rules and the meeting workflow built on them.

pub mod meetings;
pub mod slot_validator;

pub use meetings::{
    create_meeting, delete_meeting, get_meeting_detail, list_meetings, preview_slot,
    MeetingServiceError, MeetingServiceResult,
};
pub use slot_validator::{
    NowPrecision, PolicyError, Rejection, RejectionReason, SlotSubmission, SlotValidator,
    SubmissionRejection, ValidationPolicy, ValidationResult,
};
