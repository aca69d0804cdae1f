//! Results computation: MBC tabulation, global ranking, evaluator
//! qualities, quality-adjusted ranking, canonical digest.
//!
//! Runs on whatever votes exist when the event reaches `results`; missing
//! ballots simply contribute nothing. Recomputation replaces the stored row
//! in place and — for an unchanged vote set — reproduces the digest exactly.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{self as json, Value};
use tracing::info;

use rv_algo::{
    adjusted_ranking, adjustment_delta, deviation, global_ranking, quality, relative_ranks,
    tabulate_mbc,
};
use rv_core::entities::{AttachmentResult, Totals, VotingResults};
use rv_core::errors::{Error, Result};
use rv_core::ids::{AttachmentId, EventId, Sha256, UserId};
use rv_core::stage::Stage;
use rv_store::{Store, StoreTx};

use crate::VotingService;

/// Recursively sort object keys so serialization is deterministic.
fn canonicalize_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = json::Map::new();
            for k in keys {
                out.insert(k.clone(), canonicalize_value(&map[k]));
            }
            Value::Object(out)
        }
        Value::Array(a) => Value::Array(a.iter().map(canonicalize_value).collect()),
        _ => v.clone(),
    }
}

/// Canonical, LF-terminated UTF-8 bytes of any serializable value.
fn to_canonical_bytes<T: Serialize>(t: &T) -> Result<Vec<u8>> {
    let v = json::to_value(t).map_err(|e| Error::Internal(e.to_string()))?;
    let mut s =
        json::to_string(&canonicalize_value(&v)).map_err(|e| Error::Internal(e.to_string()))?;
    if !s.ends_with('\n') {
        s.push('\n');
    }
    Ok(s.into_bytes())
}

fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// The digest covers everything derived from the votes, not the wall clock.
#[derive(Serialize)]
struct DigestPayload<'a> {
    global_ranking: &'a [AttachmentResult],
    participant_qualities: &'a BTreeMap<UserId, f64>,
    adjusted_ranking: &'a [AttachmentResult],
    totals: &'a Totals,
}

impl<S: Store> VotingService<S> {
    /// Compute and persist the event's results. Idempotent for a fixed vote
    /// set; the stored record is replaced in place.
    pub fn compute_results(&self, event_id: &EventId, now: DateTime<Utc>) -> Result<VotingResults> {
        let handle = self.locks.handle(event_id);
        let _guard = handle.lock();

        let event = self.load_event(event_id)?;
        Self::expect_stage(&event, Stage::Results)?;

        let cfg = self.store.config(event_id)?;
        let m = cfg.attachments_per_evaluator;
        let attachments = self.store.attachments_by_event(event_id)?;
        let votes = self.store.votes_by_event(event_id)?;
        let assignments = self.store.assignments_by_event(event_id)?;
        let participants = self.store.users_by_event(event_id)?;

        let ids: Vec<AttachmentId> = attachments.iter().map(|a| a.id.clone()).collect();
        let tallies = tabulate_mbc(m, &ids, &votes)?;

        let global = global_ranking(&tallies);
        let rank_of: BTreeMap<AttachmentId, u32> = global.iter().cloned().collect();

        // Submitted ranks, grouped per assignment.
        let mut submitted: BTreeMap<&UserId, BTreeMap<AttachmentId, u32>> = BTreeMap::new();
        for v in &votes {
            submitted
                .entry(&v.voter)
                .or_default()
                .insert(v.attachment.clone(), v.rank_position);
        }

        // Q_i for every completed assignment (undefined at m = 1 → absent).
        let mut qualities: BTreeMap<UserId, f64> = BTreeMap::new();
        let mut scored_assignments = Vec::new();
        for a in &assignments {
            if !a.completed {
                continue;
            }
            let Some(ranks) = submitted.get(&a.participant) else {
                continue;
            };
            let rel = relative_ranks(&a.attachments, &rank_of);
            let d = deviation(ranks, &rel);
            if let Some(q) = quality(m, d) {
                qualities.insert(a.participant.clone(), q);
                let mut scored = a.clone();
                scored.quality = Some(q);
                scored_assignments.push(scored);
            }
        }

        // Rank deltas act on each attachment through its owner's quality.
        let owner_of: BTreeMap<&AttachmentId, &UserId> =
            attachments.iter().map(|a| (&a.id, &a.owner)).collect();
        let adjusted = adjusted_ranking(&global, |id| {
            let q = owner_of.get(id).and_then(|o| qualities.get(*o)).copied();
            adjustment_delta(q, cfg.quality_good, cfg.quality_bad, cfg.adjustment)
        });
        let adjusted_of: BTreeMap<AttachmentId, u32> = adjusted.iter().cloned().collect();

        let rows: BTreeMap<AttachmentId, AttachmentResult> = attachments
            .iter()
            .map(|a| {
                let tally = tallies.get(&a.id).copied().unwrap_or_default();
                let row = AttachmentResult {
                    attachment: a.id.clone(),
                    owner: a.owner.clone(),
                    original_name: a.original_name.clone(),
                    borda_points: tally.points,
                    mbc_score: tally.mbc_score(m),
                    global_rank: rank_of.get(&a.id).copied().unwrap_or_default(),
                    adjusted_rank: adjusted_of.get(&a.id).copied().unwrap_or_default(),
                    vote_count: tally.vote_count,
                    average_rank: tally.average_rank(),
                };
                (a.id.clone(), row)
            })
            .collect();

        let global_rows: Vec<AttachmentResult> =
            global.iter().map(|(id, _)| rows[id].clone()).collect();
        let adjusted_rows: Vec<AttachmentResult> =
            adjusted.iter().map(|(id, _)| rows[id].clone()).collect();

        let totals = Totals {
            attachments: attachments.len() as u32,
            participants: participants.len() as u32,
            votes: votes.len() as u32,
            completed_assignments: assignments.iter().filter(|a| a.completed).count() as u32,
        };

        let payload = DigestPayload {
            global_ranking: &global_rows,
            participant_qualities: &qualities,
            adjusted_ranking: &adjusted_rows,
            totals: &totals,
        };
        let digest: Sha256 = sha256_hex(&to_canonical_bytes(&payload)?)
            .parse()
            .map_err(|_| Error::Internal("results digest is not 64-hex".into()))?;

        let results = VotingResults {
            event: event_id.clone(),
            global_ranking: global_rows,
            participant_qualities: qualities,
            adjusted_ranking: adjusted_rows,
            totals,
            digest,
            calculated_at: now,
        };

        let mut tx = self.store.begin()?;
        tx.upsert_results(results.clone())?;
        for a in scored_assignments {
            tx.update_assignment(a)?;
        }
        tx.commit()?;

        info!(
            event = %event_id,
            attachments = totals.attachments,
            votes = totals.votes,
            digest = %results.digest,
            "results computed"
        );
        Ok(results)
    }

    /// Read the stored results; `results` stage only.
    pub fn get_results(&self, event_id: &EventId) -> Result<VotingResults> {
        let event = self.load_event(event_id)?;
        Self::expect_stage(&event, Stage::Results)?;
        Ok(self.store.results(event_id)?)
    }

    /// Read the stored global ranking; `results` stage only.
    pub fn get_ranking(&self, event_id: &EventId) -> Result<Vec<AttachmentResult>> {
        let event = self.load_event(event_id)?;
        Self::expect_stage(&event, Stage::Results)?;
        Ok(self.store.ranking(event_id)?)
    }
}
