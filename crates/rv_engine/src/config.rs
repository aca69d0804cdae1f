//! Voting configuration: create, update, delete, preview.
//!
//! Create/update run during `registration`, before any proposal exists, so
//! only the population-independent checks can bind there; the population
//! checks run in `preview_config` and again — authoritatively — at
//! assignment generation.

use tracing::warn;

use rv_algo::{validate_config, validate_ranges, ConfigWarning};
use rv_core::entities::VotingConfig;
use rv_core::errors::{Error, Result};
use rv_core::ids::{EventId, UserId};
use rv_core::stage::Stage;
use rv_store::{Store, StoreError, StoreTx};

use crate::VotingService;

/// Outcome of a dry-run validation against the current population.
#[derive(Clone, Debug)]
pub struct ConfigPreview {
    pub attachments: u32,
    pub participants: u32,
    pub warnings: Vec<ConfigWarning>,
}

impl<S: Store> VotingService<S> {
    fn population(&self, event_id: &EventId) -> Result<(u32, u32)> {
        let k = self.store.attachments_by_event(event_id)?.len() as u32;
        let n = self.store.users_by_event(event_id)?.len() as u32;
        Ok((k, n))
    }

    /// Create the event's configuration; fails with `config_exists` when one
    /// is already present.
    pub fn create_config(
        &self,
        actor: &UserId,
        cfg: VotingConfig,
    ) -> Result<Vec<ConfigWarning>> {
        let handle = self.locks.handle(&cfg.event);
        let _guard = handle.lock();

        let event = self.load_event(&cfg.event)?;
        Self::expect_stage(&event, Stage::Registration)?;
        let actor = self.store.user(actor)?;
        Self::require_admin(&actor, &event)?;

        match self.store.config(&cfg.event) {
            Ok(_) => {
                return Err(Error::ConfigExists {
                    event: cfg.event.to_string(),
                })
            }
            Err(StoreError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        let warnings = validate_ranges(&cfg)?;
        for w in &warnings {
            warn!(event = %cfg.event, warning = %w, "configuration warning");
        }
        let mut tx = self.store.begin()?;
        tx.upsert_config(cfg)?;
        tx.commit()?;
        Ok(warnings)
    }

    /// Replace the existing configuration; `not_found` when none exists yet.
    pub fn update_config(
        &self,
        actor: &UserId,
        cfg: VotingConfig,
    ) -> Result<Vec<ConfigWarning>> {
        let handle = self.locks.handle(&cfg.event);
        let _guard = handle.lock();

        let event = self.load_event(&cfg.event)?;
        Self::expect_stage(&event, Stage::Registration)?;
        let actor = self.store.user(actor)?;
        Self::require_admin(&actor, &event)?;

        self.store.config(&cfg.event)?;
        let warnings = validate_ranges(&cfg)?;
        let mut tx = self.store.begin()?;
        tx.upsert_config(cfg)?;
        tx.commit()?;
        Ok(warnings)
    }

    /// Remove the configuration; `registration` stage only.
    pub fn delete_config(&self, actor: &UserId, event_id: &EventId) -> Result<()> {
        let handle = self.locks.handle(event_id);
        let _guard = handle.lock();

        let event = self.load_event(event_id)?;
        Self::expect_stage(&event, Stage::Registration)?;
        let actor = self.store.user(actor)?;
        Self::require_admin(&actor, &event)?;

        let mut tx = self.store.begin()?;
        tx.delete_config(event_id)?;
        tx.commit()?;
        Ok(())
    }

    /// Dry-run the full validation (ranges + population feasibility) against
    /// the event as it stands. Mutates nothing; callable in any stage.
    pub fn preview_config(
        &self,
        event_id: &EventId,
        cfg: &VotingConfig,
        strict: bool,
    ) -> Result<ConfigPreview> {
        self.load_event(event_id)?;
        let (k, n) = self.population(event_id)?;
        let warnings = validate_config(cfg, k, n, strict)?;
        Ok(ConfigPreview {
            attachments: k,
            participants: n,
            warnings,
        })
    }
}
