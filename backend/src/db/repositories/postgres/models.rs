use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{meeting_slots, meetings};
use crate::models::{Meeting, MeetingId, NewMeeting, Slot, SlotId, TimeInterval, UserId};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = meetings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MeetingRow {
    pub meeting_id: i64,
    pub organizer_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<MeetingRow> for Meeting {
    fn from(row: MeetingRow) -> Self {
        Meeting {
            meeting_id: MeetingId(row.meeting_id),
            organizer_id: UserId(row.organizer_id),
            title: row.title,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = meetings)]
pub struct NewMeetingRow {
    pub organizer_id: i64,
    pub title: String,
    pub description: Option<String>,
}

impl From<&NewMeeting> for NewMeetingRow {
    fn from(meeting: &NewMeeting) -> Self {
        NewMeetingRow {
            organizer_id: meeting.organizer_id.value(),
            title: meeting.title.clone(),
            description: meeting.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = meeting_slots)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SlotRow {
    pub slot_id: i64,
    pub meeting_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl From<SlotRow> for Slot {
    fn from(row: SlotRow) -> Self {
        Slot {
            slot_id: SlotId(row.slot_id),
            meeting_id: MeetingId(row.meeting_id),
            start_time: row.start_time,
            end_time: row.end_time,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = meeting_slots)]
pub struct NewSlotRow {
    pub meeting_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl NewSlotRow {
    pub fn new(meeting_id: MeetingId, interval: &TimeInterval) -> Self {
        NewSlotRow {
            meeting_id: meeting_id.value(),
            start_time: interval.start,
            end_time: interval.end,
        }
    }
}
