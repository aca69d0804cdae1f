//! Ballot intake.
//!
//! A submission is either rejected before any write, or commits all of its
//! effects together: m vote rows, the per-attachment vote counts, and the
//! assignment completion flag. A cancelled or failing request can never
//! leave partial vote rows behind.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use rv_core::entities::{Assignment, Vote};
use rv_core::errors::{Error, Result};
use rv_core::ids::{AssignmentId, AttachmentId, EventId, UserId};
use rv_core::stage::Stage;
use rv_store::{Store, StoreTx};

use crate::{derive_id, VotingService};

/// One entry of a submitted ranking. Score, confidence and evaluation time
/// are optional evaluator-supplied extras carried through to the vote row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub attachment: AttachmentId,
    pub rank: u32,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub evaluation_secs: Option<u32>,
}

impl RankingEntry {
    /// Bare rank entry, no extras.
    pub fn new(attachment: AttachmentId, rank: u32) -> Self {
        Self {
            attachment,
            rank,
            score: None,
            confidence: None,
            evaluation_secs: None,
        }
    }
}

fn not_permutation(reason: impl Into<String>) -> Error {
    Error::RankingNotPermutation {
        reason: reason.into(),
    }
}

impl<S: Store> VotingService<S> {
    /// Validate and commit one participant's complete ranking.
    pub fn intake_ballot(
        &self,
        event_id: &EventId,
        voter: &UserId,
        assignment_id: &AssignmentId,
        rankings: &[RankingEntry],
        now: DateTime<Utc>,
    ) -> Result<Assignment> {
        let handle = self.locks.handle(event_id);
        let _guard = handle.lock();

        // 1. Event exists and is open for voting.
        let event = self.load_event(event_id)?;
        Self::expect_stage(&event, Stage::Voting)?;

        // 2. The voter belongs to the event.
        if !self.store.is_participant(event_id, voter)? {
            return Err(Error::NotRegistered {
                user: voter.to_string(),
                event: event_id.to_string(),
            });
        }

        // 3. The assignment is the voter's own.
        let assignment = self.store.assignment_for(event_id, voter)?;
        if &assignment.id != assignment_id {
            return Err(Error::AssignmentMismatch);
        }

        // 4. The rankings are a bijection: assigned set ↔ {1..m}.
        let m = assignment.attachments.len();
        if rankings.len() != m {
            return Err(not_permutation(format!(
                "expected {m} entries, got {}",
                rankings.len()
            )));
        }
        let assigned: BTreeSet<&AttachmentId> = assignment.attachments.iter().collect();
        let mut seen_files = BTreeSet::new();
        let mut seen_ranks = BTreeSet::new();
        for entry in rankings {
            if !assigned.contains(&entry.attachment) {
                return Err(not_permutation(format!(
                    "attachment {} is not part of the assignment",
                    entry.attachment
                )));
            }
            if !seen_files.insert(&entry.attachment) {
                return Err(not_permutation(format!(
                    "attachment {} ranked twice",
                    entry.attachment
                )));
            }
            if entry.rank == 0 || entry.rank as usize > m {
                return Err(not_permutation(format!(
                    "rank {} outside 1..={m}",
                    entry.rank
                )));
            }
            if !seen_ranks.insert(entry.rank) {
                return Err(not_permutation(format!("rank {} used twice", entry.rank)));
            }
        }

        // 5. No prior ballot for this assignment.
        if assignment.completed || self.store.has_voted(event_id, voter)? {
            return Err(Error::DuplicateVote {
                assignment: assignment_id.to_string(),
            });
        }

        // 6. Defensive: every ranked attachment belongs to this event.
        let event_files: BTreeMap<AttachmentId, u32> = self
            .store
            .attachments_by_event(event_id)?
            .into_iter()
            .map(|a| (a.id, a.vote_count))
            .collect();
        for entry in rankings {
            if !event_files.contains_key(&entry.attachment) {
                return Err(Error::CrossEventAttachment {
                    attachment: entry.attachment.to_string(),
                    event: event_id.to_string(),
                });
            }
        }

        // All checks passed; commit everything or nothing.
        let mut completed = assignment.clone();
        completed.completed = true;
        completed.completed_at = Some(now);

        let mut tx = self.store.begin()?;
        for entry in rankings {
            let id = derive_id(
                "vote",
                &[assignment.id.as_str(), entry.attachment.as_str()],
            )
            .parse()
            .map_err(|_| Error::Internal("derived vote id invalid".into()))?;
            tx.create_vote(Vote {
                id,
                event: event_id.clone(),
                assignment: assignment.id.clone(),
                voter: voter.clone(),
                attachment: entry.attachment.clone(),
                rank_position: entry.rank,
                score: entry.score,
                confidence: entry.confidence,
                evaluation_secs: entry.evaluation_secs,
                voted_at: now,
            })?;
            let count = event_files
                .get(&entry.attachment)
                .copied()
                .unwrap_or_default();
            tx.update_vote_count(&entry.attachment, count + 1)?;
        }
        tx.update_assignment(completed.clone())?;
        tx.commit()?;

        debug!(event = %event_id, voter = %voter, assignment = %assignment.id, "ballot accepted");
        Ok(completed)
    }
}
