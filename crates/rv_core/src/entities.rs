//! Domain entities as flat records connected by identities.
//!
//! The schema graph (event ↔ participant ↔ attachment ↔ vote ↔ assignment) is
//! never materialized as an object web; aggregation happens in `rv_algo` with
//! identity-keyed grouping. Adjacency is the store's concern.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::ids::{AssignmentId, AttachmentId, EventId, Sha256, UserId, VoteId};
use crate::stage::Stage;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Role of a registered user.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Role {
    Admin,
    Participant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Participant => "participant",
        }
    }
}

/// A registered user. Email is a case-insensitive unique key.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    pub role: Role,
}

impl User {
    /// Canonical uniqueness key for the email.
    pub fn email_key(&self) -> String {
        email_key(&self.email)
    }
}

/// Lowercased, trimmed email key used for uniqueness checks.
pub fn email_key(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// A bounded review event.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub description: String,
    pub author: UserId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub stage: Stage,
}

/// Membership of a user in an event. (event, user) is unique.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Participation {
    pub event: EventId,
    pub user: UserId,
    pub joined_at: DateTime<Utc>,
}

/// A submitted proposal file. At most one per (event, participant).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Attachment {
    pub id: AttachmentId,
    pub event: EventId,
    pub owner: UserId,
    pub original_name: String,
    pub stored_path: String,
    pub size_bytes: u64,
    pub mime_label: String,
    /// Incremented with each committed vote row.
    pub vote_count: u32,
}

/// Voting parameters for one event.
///
/// `seed` is absent until assignment generation persists the effective seed
/// it ran with, so a run can be replayed post-hoc.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VotingConfig {
    pub event: EventId,
    /// m — attachments reviewed by each evaluator.
    pub attachments_per_evaluator: u32,
    /// min_cov — minimum evaluations each attachment must receive.
    pub min_coverage: u32,
    /// Quality threshold above which an evaluator's proposal earns a bonus.
    pub quality_good: f64,
    /// Quality threshold below which an evaluator's proposal takes a penalty.
    pub quality_bad: f64,
    /// n — rank positions moved by a bonus or penalty.
    pub adjustment: u32,
    pub seed: Option<u64>,
}

/// The reviewing duty of one participant: m distinct non-owned attachments.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Assignment {
    pub id: AssignmentId,
    pub event: EventId,
    pub participant: UserId,
    /// Ordered, duplicate-free; every element belongs to `event`.
    pub attachments: Vec<AttachmentId>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    /// Q_i, filled by results computation.
    pub quality: Option<f64>,
    pub round: u32,
}

/// One ranked vote row. Rank positions within an assignment form a
/// permutation of 1..=m.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vote {
    pub id: VoteId,
    pub event: EventId,
    pub assignment: AssignmentId,
    pub voter: UserId,
    pub attachment: AttachmentId,
    pub rank_position: u32,
    pub score: Option<f64>,
    pub confidence: Option<f64>,
    pub evaluation_secs: Option<u32>,
    pub voted_at: DateTime<Utc>,
}

/// One row of a computed ranking.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AttachmentResult {
    pub attachment: AttachmentId,
    pub owner: UserId,
    pub original_name: String,
    /// Raw Borda points: Σ (m − rank) over this attachment's votes.
    pub borda_points: u64,
    /// borda_points / (m·(m−1)); comparative within an event, 0.0 when m < 2.
    pub mbc_score: f64,
    pub global_rank: u32,
    pub adjusted_rank: u32,
    pub vote_count: u32,
    /// Mean submitted rank; 0.0 for a voteless attachment.
    pub average_rank: f64,
}

/// Aggregate counters echoed with the results.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Totals {
    pub attachments: u32,
    pub participants: u32,
    pub votes: u32,
    pub completed_assignments: u32,
}

/// Computed outcome of an event; one record per event, replaced in place on
/// recomputation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VotingResults {
    pub event: EventId,
    /// Ordered by global rank ascending; |rows| = k.
    pub global_ranking: Vec<AttachmentResult>,
    /// Q_i for every participant with a completed assignment.
    pub participant_qualities: BTreeMap<UserId, f64>,
    /// Ordered by adjusted rank ascending; a permutation of `global_ranking`.
    pub adjusted_ranking: Vec<AttachmentResult>,
    pub totals: Totals,
    /// Fingerprint of the canonical results payload (timestamp excluded), so
    /// recomputation on unchanged votes is observably idempotent.
    pub digest: Sha256,
    pub calculated_at: DateTime<Utc>,
}
