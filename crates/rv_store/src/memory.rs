//! Reference in-memory store.
//!
//! State lives in `BTreeMap`s keyed by id, so every listing is id-sorted for
//! free. The transaction handle holds the store mutex for its lifetime and
//! keeps a snapshot of the pre-transaction state; `commit()` keeps the
//! mutated state, dropping the handle without committing restores the
//! snapshot. That gives the all-or-nothing write scope the engine relies on
//! without a journal, at the cost it already pays elsewhere: one writer at a
//! time.

use std::collections::BTreeMap;

use parking_lot::{Mutex, MutexGuard};

use rv_core::entities::{
    email_key, Assignment, Attachment, AttachmentResult, Event, Participation, User, Vote,
    VotingConfig, VotingResults,
};
use rv_core::ids::{AssignmentId, AttachmentId, EventId, UserId, VoteId};
use rv_core::stage::Stage;

use crate::contracts::{Page, Store, StoreTx};
use crate::{StoreError, StoreResult};

#[derive(Clone, Debug, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    events: BTreeMap<EventId, Event>,
    participations: BTreeMap<(EventId, UserId), Participation>,
    attachments: BTreeMap<AttachmentId, Attachment>,
    configs: BTreeMap<EventId, VotingConfig>,
    assignments: BTreeMap<AssignmentId, Assignment>,
    votes: BTreeMap<VoteId, Vote>,
    results: BTreeMap<EventId, VotingResults>,
}

/// In-memory store; cheap to construct, one per test or CLI run.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(entity: &'static str, id: impl ToString) -> StoreError {
    StoreError::NotFound {
        entity,
        id: id.to_string(),
    }
}

impl Store for MemoryStore {
    type Tx<'a>
        = MemoryTx<'a>
    where
        Self: 'a;

    fn begin(&self) -> StoreResult<MemoryTx<'_>> {
        let guard = self.inner.lock();
        let backup = guard.clone();
        Ok(MemoryTx {
            guard,
            backup: Some(backup),
            committed: false,
        })
    }

    fn event(&self, id: &EventId) -> StoreResult<Event> {
        self.inner
            .lock()
            .events
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("event", id))
    }

    fn events(&self, page: Page) -> StoreResult<Vec<Event>> {
        let all: Vec<Event> = self.inner.lock().events.values().cloned().collect();
        Ok(page.clip(&all))
    }

    fn events_by_author(&self, author: &UserId) -> StoreResult<Vec<Event>> {
        Ok(self
            .inner
            .lock()
            .events
            .values()
            .filter(|e| &e.author == author)
            .cloned()
            .collect())
    }

    fn events_by_participant(&self, user: &UserId) -> StoreResult<Vec<Event>> {
        let state = self.inner.lock();
        Ok(state
            .participations
            .keys()
            .filter(|(_, u)| u == user)
            .filter_map(|(e, _)| state.events.get(e).cloned())
            .collect())
    }

    fn user(&self, id: &UserId) -> StoreResult<User> {
        self.inner
            .lock()
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("user", id))
    }

    fn user_by_email(&self, email: &str) -> StoreResult<User> {
        let key = email_key(email);
        self.inner
            .lock()
            .users
            .values()
            .find(|u| u.email_key() == key)
            .cloned()
            .ok_or_else(|| not_found("user", email))
    }

    fn users(&self, page: Page) -> StoreResult<Vec<User>> {
        let all: Vec<User> = self.inner.lock().users.values().cloned().collect();
        Ok(page.clip(&all))
    }

    fn users_by_event(&self, event: &EventId) -> StoreResult<Vec<User>> {
        let state = self.inner.lock();
        Ok(state
            .participations
            .keys()
            .filter(|(e, _)| e == event)
            .filter_map(|(_, u)| state.users.get(u).cloned())
            .collect())
    }

    fn participations(&self, event: &EventId) -> StoreResult<Vec<Participation>> {
        Ok(self
            .inner
            .lock()
            .participations
            .iter()
            .filter(|((e, _), _)| e == event)
            .map(|(_, p)| p.clone())
            .collect())
    }

    fn is_participant(&self, event: &EventId, user: &UserId) -> StoreResult<bool> {
        Ok(self
            .inner
            .lock()
            .participations
            .contains_key(&(event.clone(), user.clone())))
    }

    fn attachment(&self, id: &AttachmentId) -> StoreResult<Attachment> {
        self.inner
            .lock()
            .attachments
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("attachment", id))
    }

    fn attachments_by_event(&self, event: &EventId) -> StoreResult<Vec<Attachment>> {
        Ok(self
            .inner
            .lock()
            .attachments
            .values()
            .filter(|a| &a.event == event)
            .cloned()
            .collect())
    }

    fn attachments_by_participant(&self, user: &UserId) -> StoreResult<Vec<Attachment>> {
        Ok(self
            .inner
            .lock()
            .attachments
            .values()
            .filter(|a| &a.owner == user)
            .cloned()
            .collect())
    }

    fn votes_by_event(&self, event: &EventId) -> StoreResult<Vec<Vote>> {
        Ok(self
            .inner
            .lock()
            .votes
            .values()
            .filter(|v| &v.event == event)
            .cloned()
            .collect())
    }

    fn votes_by_voter(&self, event: &EventId, voter: &UserId) -> StoreResult<Vec<Vote>> {
        Ok(self
            .inner
            .lock()
            .votes
            .values()
            .filter(|v| &v.event == event && &v.voter == voter)
            .cloned()
            .collect())
    }

    fn votes_by_attachment(&self, attachment: &AttachmentId) -> StoreResult<Vec<Vote>> {
        Ok(self
            .inner
            .lock()
            .votes
            .values()
            .filter(|v| &v.attachment == attachment)
            .cloned()
            .collect())
    }

    fn has_voted(&self, event: &EventId, voter: &UserId) -> StoreResult<bool> {
        Ok(self
            .inner
            .lock()
            .votes
            .values()
            .any(|v| &v.event == event && &v.voter == voter))
    }

    fn assignments_by_event(&self, event: &EventId) -> StoreResult<Vec<Assignment>> {
        Ok(self
            .inner
            .lock()
            .assignments
            .values()
            .filter(|a| &a.event == event)
            .cloned()
            .collect())
    }

    fn assignment_for(&self, event: &EventId, participant: &UserId) -> StoreResult<Assignment> {
        self.inner
            .lock()
            .assignments
            .values()
            .find(|a| &a.event == event && &a.participant == participant)
            .cloned()
            .ok_or_else(|| not_found("assignment", format!("{event}/{participant}")))
    }

    fn config(&self, event: &EventId) -> StoreResult<VotingConfig> {
        self.inner
            .lock()
            .configs
            .get(event)
            .cloned()
            .ok_or_else(|| not_found("voting configuration", event))
    }

    fn results(&self, event: &EventId) -> StoreResult<VotingResults> {
        self.inner
            .lock()
            .results
            .get(event)
            .cloned()
            .ok_or_else(|| not_found("voting results", event))
    }

    fn ranking(&self, event: &EventId) -> StoreResult<Vec<AttachmentResult>> {
        Ok(self.results(event)?.global_ranking)
    }
}

/// Snapshot-rollback transaction over the locked state.
pub struct MemoryTx<'a> {
    guard: MutexGuard<'a, State>,
    backup: Option<State>,
    committed: bool,
}

impl StoreTx for MemoryTx<'_> {
    fn create_user(&mut self, user: User) -> StoreResult<()> {
        if self.guard.users.contains_key(&user.id) {
            return Err(StoreError::Unique(format!("user id {}", user.id)));
        }
        let key = user.email_key();
        if self.guard.users.values().any(|u| u.email_key() == key) {
            return Err(StoreError::Unique(format!("user email {key}")));
        }
        self.guard.users.insert(user.id.clone(), user);
        Ok(())
    }

    fn create_event(&mut self, event: Event) -> StoreResult<()> {
        if self.guard.events.contains_key(&event.id) {
            return Err(StoreError::Unique(format!("event id {}", event.id)));
        }
        if !self.guard.users.contains_key(&event.author) {
            return Err(not_found("user", &event.author));
        }
        if event.end_date < event.start_date {
            return Err(StoreError::Check("event end date precedes start date".into()));
        }
        self.guard.events.insert(event.id.clone(), event);
        Ok(())
    }

    fn update_stage(&mut self, event: &EventId, stage: Stage) -> StoreResult<()> {
        let e = self
            .guard
            .events
            .get_mut(event)
            .ok_or_else(|| not_found("event", event))?;
        e.stage = stage;
        Ok(())
    }

    fn add_participant(&mut self, participation: Participation) -> StoreResult<()> {
        if !self.guard.events.contains_key(&participation.event) {
            return Err(not_found("event", &participation.event));
        }
        if !self.guard.users.contains_key(&participation.user) {
            return Err(not_found("user", &participation.user));
        }
        let key = (participation.event.clone(), participation.user.clone());
        if self.guard.participations.contains_key(&key) {
            return Err(StoreError::Unique(format!(
                "participation {}/{}",
                key.0, key.1
            )));
        }
        self.guard.participations.insert(key, participation);
        Ok(())
    }

    fn remove_participant(&mut self, event: &EventId, user: &UserId) -> StoreResult<()> {
        self.guard
            .participations
            .remove(&(event.clone(), user.clone()))
            .map(|_| ())
            .ok_or_else(|| not_found("participation", format!("{event}/{user}")))
    }

    fn create_attachment(&mut self, attachment: Attachment) -> StoreResult<()> {
        if self.guard.attachments.contains_key(&attachment.id) {
            return Err(StoreError::Unique(format!("attachment id {}", attachment.id)));
        }
        if !self.guard.events.contains_key(&attachment.event) {
            return Err(not_found("event", &attachment.event));
        }
        if !self.guard.users.contains_key(&attachment.owner) {
            return Err(not_found("user", &attachment.owner));
        }
        if attachment.size_bytes == 0 {
            return Err(StoreError::Check("attachment size must be positive".into()));
        }
        self.guard.attachments.insert(attachment.id.clone(), attachment);
        Ok(())
    }

    fn delete_attachment(&mut self, id: &AttachmentId) -> StoreResult<()> {
        self.guard
            .attachments
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("attachment", id))
    }

    fn update_vote_count(&mut self, id: &AttachmentId, vote_count: u32) -> StoreResult<()> {
        let a = self
            .guard
            .attachments
            .get_mut(id)
            .ok_or_else(|| not_found("attachment", id))?;
        a.vote_count = vote_count;
        Ok(())
    }

    fn upsert_config(&mut self, config: VotingConfig) -> StoreResult<()> {
        if !self.guard.events.contains_key(&config.event) {
            return Err(not_found("event", &config.event));
        }
        if !(1..=50).contains(&config.attachments_per_evaluator) {
            return Err(StoreError::Check(format!(
                "m = {} outside [1, 50]",
                config.attachments_per_evaluator
            )));
        }
        if config.quality_good <= config.quality_bad {
            return Err(StoreError::Check(
                "q_good must exceed q_bad".into(),
            ));
        }
        self.guard.configs.insert(config.event.clone(), config);
        Ok(())
    }

    fn delete_config(&mut self, event: &EventId) -> StoreResult<()> {
        self.guard
            .configs
            .remove(event)
            .map(|_| ())
            .ok_or_else(|| not_found("voting configuration", event))
    }

    fn create_assignment(&mut self, assignment: Assignment) -> StoreResult<()> {
        if self.guard.assignments.contains_key(&assignment.id) {
            return Err(StoreError::Unique(format!("assignment id {}", assignment.id)));
        }
        if !self.guard.events.contains_key(&assignment.event) {
            return Err(not_found("event", &assignment.event));
        }
        let duplicate = self
            .guard
            .assignments
            .values()
            .any(|a| a.event == assignment.event && a.participant == assignment.participant);
        if duplicate {
            return Err(StoreError::Unique(format!(
                "assignment {}/{}",
                assignment.event, assignment.participant
            )));
        }
        self.guard.assignments.insert(assignment.id.clone(), assignment);
        Ok(())
    }

    fn update_assignment(&mut self, assignment: Assignment) -> StoreResult<()> {
        if !self.guard.assignments.contains_key(&assignment.id) {
            return Err(not_found("assignment", &assignment.id));
        }
        self.guard.assignments.insert(assignment.id.clone(), assignment);
        Ok(())
    }

    fn create_vote(&mut self, vote: Vote) -> StoreResult<()> {
        if self.guard.votes.contains_key(&vote.id) {
            return Err(StoreError::Unique(format!("vote id {}", vote.id)));
        }
        if !self.guard.assignments.contains_key(&vote.assignment) {
            return Err(not_found("assignment", &vote.assignment));
        }
        if !self.guard.attachments.contains_key(&vote.attachment) {
            return Err(not_found("attachment", &vote.attachment));
        }
        if vote.rank_position == 0 {
            return Err(StoreError::Check("rank_position must be positive".into()));
        }
        let duplicate = self
            .guard
            .votes
            .values()
            .any(|v| v.assignment == vote.assignment && v.attachment == vote.attachment);
        if duplicate {
            return Err(StoreError::Unique(format!(
                "vote {}/{}",
                vote.assignment, vote.attachment
            )));
        }
        self.guard.votes.insert(vote.id.clone(), vote);
        Ok(())
    }

    fn upsert_results(&mut self, results: VotingResults) -> StoreResult<()> {
        if !self.guard.events.contains_key(&results.event) {
            return Err(not_found("event", &results.event));
        }
        // Replace in place; one results row per event.
        self.guard.results.insert(results.event.clone(), results);
        Ok(())
    }

    fn commit(mut self) -> StoreResult<()> {
        self.committed = true;
        Ok(())
    }
}

impl Drop for MemoryTx<'_> {
    fn drop(&mut self) {
        if !self.committed {
            if let Some(backup) = self.backup.take() {
                *self.guard = backup;
            }
        }
    }
}
