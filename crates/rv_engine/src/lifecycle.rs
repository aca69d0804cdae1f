//! Event lifecycle: creation, stage transitions, registration.

use chrono::{DateTime, Utc};
use tracing::info;

use rv_core::entities::{Event, Participation, User};
use rv_core::errors::{Error, Result};
use rv_core::ids::{EventId, UserId};
use rv_core::stage::Stage;
use rv_store::{Store, StoreTx};

use crate::VotingService;

impl<S: Store> VotingService<S> {
    /// Register a user record. Email uniqueness (case-insensitive) is
    /// enforced by the store.
    pub fn create_user(&self, user: User) -> Result<User> {
        let mut tx = self.store.begin()?;
        tx.create_user(user.clone())?;
        tx.commit()?;
        Ok(user)
    }

    /// Create an event. The stage always starts at `creation`, whatever the
    /// caller put in the record.
    pub fn create_event(&self, mut event: Event) -> Result<Event> {
        event.stage = Stage::Creation;
        let mut tx = self.store.begin()?;
        tx.create_event(event.clone())?;
        tx.commit()?;
        info!(event = %event.id, "event created");
        Ok(event)
    }

    /// Advance the event to `target`. Admin-gated, strictly linear. The
    /// `voting → results` transition additionally requires every assignment
    /// to be complete, unless `force` closes the vote early.
    pub fn advance_stage(
        &self,
        actor: &UserId,
        event_id: &EventId,
        target: Stage,
        force: bool,
    ) -> Result<Event> {
        let handle = self.locks.handle(event_id);
        let _guard = handle.lock();

        let mut event = self.load_event(event_id)?;
        let actor = self.store.user(actor)?;
        Self::require_admin(&actor, &event)?;

        if !event.stage.can_advance_to(target) {
            return Err(Error::WrongStage {
                current: event.stage,
            });
        }

        if target == Stage::Results && !force {
            let open = self
                .store
                .assignments_by_event(event_id)?
                .iter()
                .filter(|a| !a.completed)
                .count();
            if open > 0 {
                return Err(Error::WrongStage {
                    current: event.stage,
                });
            }
        }

        let mut tx = self.store.begin()?;
        tx.update_stage(event_id, target)?;
        tx.commit()?;
        event.stage = target;
        info!(event = %event.id, stage = %target, force, "stage advanced");
        Ok(event)
    }

    /// Join an event; only during `registration`.
    pub fn register_participant(
        &self,
        event_id: &EventId,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Participation> {
        let handle = self.locks.handle(event_id);
        let _guard = handle.lock();

        let event = self.load_event(event_id)?;
        Self::expect_stage(&event, Stage::Registration)?;
        self.store.user(user_id)?;
        if self.store.is_participant(event_id, user_id)? {
            return Err(Error::AlreadyRegistered {
                user: user_id.to_string(),
                event: event_id.to_string(),
            });
        }

        let participation = Participation {
            event: event_id.clone(),
            user: user_id.clone(),
            joined_at: now,
        };
        let mut tx = self.store.begin()?;
        tx.add_participant(participation.clone())?;
        tx.commit()?;
        Ok(participation)
    }

    /// Leave an event; only during `registration`.
    pub fn withdraw_participant(&self, event_id: &EventId, user_id: &UserId) -> Result<()> {
        let handle = self.locks.handle(event_id);
        let _guard = handle.lock();

        let event = self.load_event(event_id)?;
        Self::expect_stage(&event, Stage::Registration)?;
        if !self.store.is_participant(event_id, user_id)? {
            return Err(Error::NotRegistered {
                user: user_id.to_string(),
                event: event_id.to_string(),
            });
        }
        let mut tx = self.store.begin()?;
        tx.remove_participant(event_id, user_id)?;
        tx.commit()?;
        Ok(())
    }
}
