//! Application state for the HTTP server.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::db::repository::MeetingRepository;
use crate::services::slot_validator::SlotValidator;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Meeting store
    pub repository: Arc<dyn MeetingRepository>,
    /// Rules for `POST /v1/meetings`
    pub submission: SlotValidator,
    /// Rules for `POST /v1/slots/preview`
    pub preview: SlotValidator,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn MeetingRepository>,
        submission: SlotValidator,
        preview: SlotValidator,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            submission,
            preview,
            clock,
        }
    }

    /// Default rules in UTC against the system clock.
    pub fn with_defaults(repository: Arc<dyn MeetingRepository>) -> Self {
        Self::new(
            repository,
            SlotValidator::submission(chrono_tz::UTC),
            SlotValidator::preview(chrono_tz::UTC),
            Arc::new(SystemClock),
        )
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
