//! In-memory meeting store for unit testing and local development.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::db::repository::{ErrorContext, MeetingRepository, RepositoryError, RepositoryResult};
use crate::models::{
    Meeting, MeetingDetail, MeetingId, NewMeeting, Slot, SlotId, TimeInterval, UserId,
};

#[derive(Debug, Default)]
struct LocalState {
    meetings: BTreeMap<MeetingId, Meeting>,
    slots: BTreeMap<SlotId, Slot>,
    last_meeting_id: i64,
    last_slot_id: i64,
}

impl LocalState {
    fn insert_meeting(&mut self, meeting: &NewMeeting) -> Meeting {
        self.last_meeting_id += 1;
        let stored = Meeting {
            meeting_id: MeetingId(self.last_meeting_id),
            organizer_id: meeting.organizer_id,
            title: meeting.title.clone(),
            description: meeting.description.clone(),
            created_at: Utc::now(),
        };
        self.meetings.insert(stored.meeting_id, stored.clone());
        stored
    }

    fn insert_slot(&mut self, meeting_id: MeetingId, interval: &TimeInterval) -> Slot {
        self.last_slot_id += 1;
        let slot = Slot {
            slot_id: SlotId(self.last_slot_id),
            meeting_id,
            start_time: interval.start,
            end_time: interval.end,
        };
        self.slots.insert(slot.slot_id, slot.clone());
        slot
    }

    fn slots_of(&self, meeting_id: MeetingId) -> Vec<Slot> {
        let mut slots: Vec<Slot> = self
            .slots
            .values()
            .filter(|s| s.meeting_id == meeting_id)
            .cloned()
            .collect();
        slots.sort_by_key(|s| (s.start_time, s.slot_id));
        slots
    }
}

/// Meeting store kept entirely in process memory.
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct LocalRepository {
    state: Arc<RwLock<LocalState>>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn meeting_count(&self) -> usize {
        self.state.read().meetings.len()
    }

    pub fn slot_count(&self) -> usize {
        self.state.read().slots.len()
    }
}

#[async_trait]
impl MeetingRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }

    async fn create_meeting(&self, meeting: &NewMeeting) -> RepositoryResult<Meeting> {
        Ok(self.state.write().insert_meeting(meeting))
    }

    async fn add_slot(
        &self,
        meeting_id: MeetingId,
        interval: &TimeInterval,
    ) -> RepositoryResult<Slot> {
        let mut state = self.state.write();
        if !state.meetings.contains_key(&meeting_id) {
            return Err(RepositoryError::not_found_with_context(
                format!("meeting {} does not exist", meeting_id),
                ErrorContext::new("add_slot")
                    .with_entity("meeting")
                    .with_entity_id(meeting_id),
            ));
        }
        Ok(state.insert_slot(meeting_id, interval))
    }

    async fn get_meeting(&self, meeting_id: MeetingId) -> RepositoryResult<Option<Meeting>> {
        Ok(self.state.read().meetings.get(&meeting_id).cloned())
    }

    async fn list_slots(&self, meeting_id: MeetingId) -> RepositoryResult<Vec<Slot>> {
        Ok(self.state.read().slots_of(meeting_id))
    }

    async fn list_meetings_by_owner(&self, owner: UserId) -> RepositoryResult<Vec<Meeting>> {
        let mut meetings: Vec<Meeting> = self
            .state
            .read()
            .meetings
            .values()
            .filter(|m| m.organizer_id == owner)
            .cloned()
            .collect();
        meetings.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.meeting_id.cmp(&a.meeting_id))
        });
        Ok(meetings)
    }

    async fn delete_meeting(&self, meeting_id: MeetingId) -> RepositoryResult<u64> {
        let mut state = self.state.write();
        if state.meetings.remove(&meeting_id).is_none() {
            return Ok(0);
        }
        state.slots.retain(|_, slot| slot.meeting_id != meeting_id);
        Ok(1)
    }

    async fn create_meeting_with_slots(
        &self,
        meeting: &NewMeeting,
        slots: &[TimeInterval],
    ) -> RepositoryResult<MeetingDetail> {
        // One write lock for the whole batch: readers never see a partial meeting.
        let mut state = self.state.write();
        let created = state.insert_meeting(meeting);
        for interval in slots {
            state.insert_slot(created.meeting_id, interval);
        }
        let slots = state.slots_of(created.meeting_id);
        Ok(MeetingDetail {
            meeting: created,
            slots,
        })
    }
}
