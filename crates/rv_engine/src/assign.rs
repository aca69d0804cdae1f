//! Assignment generation: runs once per event, inside the event lock,
//! during `voting`.
//!
//! The configuration is re-validated against the population as it stands —
//! registration and uploads are closed by now, so these are the counts the
//! ballots will actually run on. The effective seed is persisted back onto
//! the configuration so an audit can replay the accepted draft.

use tracing::{info, warn};

use rv_algo::{generate_assignments, validate_config, AssignInput};
use rv_core::entities::Assignment;
use rv_core::errors::{Error, Result};
use rv_core::ids::{EventId, UserId};
use rv_core::rng::fresh_seed;
use rv_core::stage::Stage;
use rv_store::{Store, StoreTx};

use crate::{derive_id, VotingService};

impl<S: Store> VotingService<S> {
    /// Generate one assignment per participant.
    ///
    /// `seed` pins the draw for reproducible runs; when absent a fresh seed
    /// is taken from OS entropy and persisted.
    pub fn generate_assignments(
        &self,
        actor: &UserId,
        event_id: &EventId,
        seed: Option<u64>,
    ) -> Result<Vec<Assignment>> {
        let handle = self.locks.handle(event_id);
        let _guard = handle.lock();

        let event = self.load_event(event_id)?;
        Self::expect_stage(&event, Stage::Voting)?;
        let actor = self.store.user(actor)?;
        Self::require_admin(&actor, &event)?;

        if !self.store.assignments_by_event(event_id)?.is_empty() {
            return Err(Error::AssignmentsExist {
                event: event_id.to_string(),
            });
        }

        let mut cfg = self.store.config(event_id)?;
        let participants = self.store.users_by_event(event_id)?;
        let attachments = self.store.attachments_by_event(event_id)?;

        let warnings = validate_config(
            &cfg,
            attachments.len() as u32,
            participants.len() as u32,
            false,
        )?;
        for w in &warnings {
            warn!(event = %event_id, warning = %w, "generating against a flagged configuration");
        }

        // Store listings are id-sorted already; the generator requires it.
        let participant_ids: Vec<UserId> = participants.into_iter().map(|u| u.id).collect();
        let pairs: Vec<_> = attachments
            .into_iter()
            .map(|a| (a.id, a.owner))
            .collect();

        let input = AssignInput {
            participants: &participant_ids,
            attachments: &pairs,
            per_evaluator: cfg.attachments_per_evaluator,
            min_coverage: cfg.min_coverage,
        };
        let base_seed = seed.unwrap_or_else(fresh_seed);
        let plan = generate_assignments(&input, base_seed)?;
        if !plan.coverage_met {
            warn!(
                event = %event_id,
                attempts = plan.attempts,
                "coverage floor not met; proceeding best-effort"
            );
        }

        let records: Vec<Assignment> = plan
            .assigned
            .iter()
            .map(|(participant, files)| {
                let id = derive_id("asg", &[event_id.as_str(), participant.as_str()])
                    .parse()
                    .map_err(|_| Error::Internal("derived assignment id invalid".into()))?;
                Ok(Assignment {
                    id,
                    event: event_id.clone(),
                    participant: participant.clone(),
                    attachments: files.clone(),
                    completed: false,
                    completed_at: None,
                    quality: None,
                    round: 1,
                })
            })
            .collect::<Result<_>>()?;

        cfg.seed = Some(plan.seed);

        let mut tx = self.store.begin()?;
        tx.upsert_config(cfg)?;
        for a in &records {
            tx.create_assignment(a.clone())?;
        }
        tx.commit()?;

        info!(
            event = %event_id,
            participants = records.len(),
            seed = plan.seed,
            attempts = plan.attempts,
            coverage_met = plan.coverage_met,
            "assignments generated"
        );
        Ok(records)
    }
}
