//! Meeting and slot records as held by the meeting store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::time::{canonical_instant, TimeInterval};
use crate::define_id_type;

define_id_type!(i64, UserId);
define_id_type!(i64, MeetingId);
define_id_type!(i64, SlotId);

/// Kind of account acting on the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Organizer,
    Participant,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Organizer => "organizer",
            UserRole::Participant => "participant",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "organizer" => Ok(Self::Organizer),
            "participant" => Ok(Self::Participant),
            other => Err(format!("Unknown user role: {}", other)),
        }
    }
}

/// The caller on whose behalf a meeting operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: UserId, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub fn organizer(user_id: i64) -> Self {
        Self::new(UserId(user_id), UserRole::Organizer)
    }

    pub fn participant(user_id: i64) -> Self {
        Self::new(UserId(user_id), UserRole::Participant)
    }

    pub fn is_organizer(&self) -> bool {
        self.role == UserRole::Organizer
    }
}

/// A stored meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub meeting_id: MeetingId,
    pub organizer_id: UserId,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "canonical_instant")]
    pub created_at: DateTime<Utc>,
}

/// A stored proposed slot belonging to a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub slot_id: SlotId,
    pub meeting_id: MeetingId,
    #[serde(with = "canonical_instant")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "canonical_instant")]
    pub end_time: DateTime<Utc>,
}

impl Slot {
    pub fn interval(&self) -> TimeInterval {
        TimeInterval::new(self.start_time, self.end_time)
    }
}

/// Fields needed to insert a meeting; the store assigns id and creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMeeting {
    pub organizer_id: UserId,
    pub title: String,
    pub description: Option<String>,
}

impl NewMeeting {
    /// Blank descriptions are stored as absent.
    pub fn new(
        organizer_id: UserId,
        title: impl Into<String>,
        description: Option<impl Into<String>>,
    ) -> Self {
        let description = description
            .map(Into::into)
            .filter(|d: &String| !d.trim().is_empty());
        Self {
            organizer_id,
            title: title.into(),
            description,
        }
    }
}

/// A meeting together with its slots, ordered by start time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingDetail {
    pub meeting: Meeting,
    pub slots: Vec<Slot>,
}
