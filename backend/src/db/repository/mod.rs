//! Meeting store abstraction.
//!
//! The HTTP layer and the meeting service talk to storage only through
//! [`MeetingRepository`], so the in-memory and Postgres backends are
//! interchangeable at runtime.

pub mod error;

use async_trait::async_trait;
use futures::future::try_join_all;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use crate::models::{Meeting, MeetingDetail, MeetingId, NewMeeting, Slot, TimeInterval, UserId};

/// Repository trait for meetings and their proposed slots.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; a single instance is shared by all
/// in-flight requests.
#[async_trait]
pub trait MeetingRepository: Send + Sync {
    /// Check that the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Insert a meeting and return it with its generated id.
    async fn create_meeting(&self, meeting: &NewMeeting) -> RepositoryResult<Meeting>;

    /// Attach one slot to an existing meeting.
    ///
    /// # Errors
    /// `NotFound` when the meeting does not exist.
    async fn add_slot(&self, meeting_id: MeetingId, interval: &TimeInterval)
        -> RepositoryResult<Slot>;

    async fn get_meeting(&self, meeting_id: MeetingId) -> RepositoryResult<Option<Meeting>>;

    /// Slots of a meeting ordered by start time ascending.
    async fn list_slots(&self, meeting_id: MeetingId) -> RepositoryResult<Vec<Slot>>;

    /// Meetings created by `owner`, most recent first.
    async fn list_meetings_by_owner(&self, owner: UserId) -> RepositoryResult<Vec<Meeting>>;

    /// Delete a meeting and its slots. Returns the number of meetings removed (0 or 1).
    async fn delete_meeting(&self, meeting_id: MeetingId) -> RepositoryResult<u64>;

    /// Create a meeting together with all of its slots, all or nothing.
    ///
    /// The default implementation inserts the meeting, then the slots
    /// concurrently, and deletes the meeting again if any slot insert fails.
    /// Backends with real transactions should override it.
    async fn create_meeting_with_slots(
        &self,
        meeting: &NewMeeting,
        slots: &[TimeInterval],
    ) -> RepositoryResult<MeetingDetail> {
        let created = self.create_meeting(meeting).await?;
        let meeting_id = created.meeting_id;

        match try_join_all(slots.iter().map(|interval| self.add_slot(meeting_id, interval))).await
        {
            Ok(mut stored) => {
                stored.sort_by_key(|slot| slot.start_time);
                Ok(MeetingDetail {
                    meeting: created,
                    slots: stored,
                })
            }
            Err(err) => {
                if let Err(cleanup) = self.delete_meeting(meeting_id).await {
                    log::error!(
                        "failed to remove meeting {} after slot insert error: {}",
                        meeting_id,
                        cleanup
                    );
                }
                Err(RepositoryError::transaction_with_context(
                    err.to_string(),
                    ErrorContext::new("create_meeting_with_slots")
                        .with_entity("meeting")
                        .with_entity_id(meeting_id),
                ))
            }
        }
    }
}
