//! Repository contracts.
//!
//! Reads live on [`Store`] and need no transactional guarantees; writes live
//! on [`StoreTx`] and commit together or not at all. The engine's pattern is
//! read → validate → `begin()` → write → `commit()`; implementations may
//! serialize the write scope (the in-memory store holds its lock for the
//! lifetime of the handle), so all reads belong before `begin()`.

use rv_core::entities::{
    Assignment, Attachment, AttachmentResult, Event, Participation, User, Vote, VotingConfig,
    VotingResults,
};
use rv_core::ids::{AttachmentId, EventId, UserId};
use rv_core::stage::Stage;

use crate::StoreResult;

/// Pagination window for listings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// The whole collection.
    pub fn all() -> Self {
        Self {
            offset: 0,
            limit: usize::MAX,
        }
    }

    /// Apply the window to an already-ordered collection.
    pub fn clip<T: Clone>(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .skip(self.offset)
            .take(self.limit)
            .cloned()
            .collect()
    }
}

/// Read surface plus the transaction entry point.
///
/// Listings return id-sorted rows so iteration order is canonical without a
/// further sort at the call site.
pub trait Store {
    type Tx<'a>: StoreTx
    where
        Self: 'a;

    /// Open the atomic write scope. Dropping the handle without `commit()`
    /// rolls every write back.
    fn begin(&self) -> StoreResult<Self::Tx<'_>>;

    // Events
    fn event(&self, id: &EventId) -> StoreResult<Event>;
    fn events(&self, page: Page) -> StoreResult<Vec<Event>>;
    fn events_by_author(&self, author: &UserId) -> StoreResult<Vec<Event>>;
    fn events_by_participant(&self, user: &UserId) -> StoreResult<Vec<Event>>;

    // Users & participations
    fn user(&self, id: &UserId) -> StoreResult<User>;
    fn user_by_email(&self, email: &str) -> StoreResult<User>;
    fn users(&self, page: Page) -> StoreResult<Vec<User>>;
    fn users_by_event(&self, event: &EventId) -> StoreResult<Vec<User>>;
    fn participations(&self, event: &EventId) -> StoreResult<Vec<Participation>>;
    fn is_participant(&self, event: &EventId, user: &UserId) -> StoreResult<bool>;

    // Attachments
    fn attachment(&self, id: &AttachmentId) -> StoreResult<Attachment>;
    fn attachments_by_event(&self, event: &EventId) -> StoreResult<Vec<Attachment>>;
    fn attachments_by_participant(&self, user: &UserId) -> StoreResult<Vec<Attachment>>;

    // Votes
    fn votes_by_event(&self, event: &EventId) -> StoreResult<Vec<Vote>>;
    fn votes_by_voter(&self, event: &EventId, voter: &UserId) -> StoreResult<Vec<Vote>>;
    fn votes_by_attachment(&self, attachment: &AttachmentId) -> StoreResult<Vec<Vote>>;
    fn has_voted(&self, event: &EventId, voter: &UserId) -> StoreResult<bool>;

    // Assignments
    fn assignments_by_event(&self, event: &EventId) -> StoreResult<Vec<Assignment>>;
    fn assignment_for(&self, event: &EventId, participant: &UserId) -> StoreResult<Assignment>;

    // Configuration
    fn config(&self, event: &EventId) -> StoreResult<VotingConfig>;

    // Results
    fn results(&self, event: &EventId) -> StoreResult<VotingResults>;
    fn ranking(&self, event: &EventId) -> StoreResult<Vec<AttachmentResult>>;
}

/// Atomic write scope. Implementations enforce the uniqueness keys
/// (user email, (event, user) participation, one configuration and one
/// results row per event, one assignment per (event, participant)) and the
/// defense-in-depth check constraints (rank ≥ 1, m ∈ [1, 50], quality
/// threshold ordering, end ≥ start).
pub trait StoreTx {
    fn create_user(&mut self, user: User) -> StoreResult<()>;
    fn create_event(&mut self, event: Event) -> StoreResult<()>;
    fn update_stage(&mut self, event: &EventId, stage: Stage) -> StoreResult<()>;
    fn add_participant(&mut self, participation: Participation) -> StoreResult<()>;
    fn remove_participant(&mut self, event: &EventId, user: &UserId) -> StoreResult<()>;
    fn create_attachment(&mut self, attachment: Attachment) -> StoreResult<()>;
    fn delete_attachment(&mut self, id: &AttachmentId) -> StoreResult<()>;
    fn update_vote_count(&mut self, id: &AttachmentId, vote_count: u32) -> StoreResult<()>;
    fn upsert_config(&mut self, config: VotingConfig) -> StoreResult<()>;
    fn delete_config(&mut self, event: &EventId) -> StoreResult<()>;
    fn create_assignment(&mut self, assignment: Assignment) -> StoreResult<()>;
    fn update_assignment(&mut self, assignment: Assignment) -> StoreResult<()>;
    fn create_vote(&mut self, vote: Vote) -> StoreResult<()>;
    fn upsert_results(&mut self, results: VotingResults) -> StoreResult<()>;

    /// Publish every write in this scope.
    fn commit(self) -> StoreResult<()>
    where
        Self: Sized;
}
