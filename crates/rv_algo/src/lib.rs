// crates/rv_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Pure algorithm layer of the review-voting engine.
//!
//! Everything here is a deterministic function of its inputs: no I/O, no
//! clocks, no global state. Randomness enters only through an explicit seed
//! (`rv_core::rng::AssignRng`). The service layer (`rv_engine`) owns reading
//! inputs from the store and persisting outputs.

use std::collections::BTreeMap;

pub use rv_core::ids::{AttachmentId, UserId};

/// Per-attachment tally produced by MBC tabulation.
///
/// Ordering of the global ranking uses the integer fields only; the float
/// MBC score is derived for reporting (`points / (m·(m−1))`).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MbcTally {
    /// Σ (m − rank) over this attachment's votes.
    pub points: u64,
    pub vote_count: u32,
    /// Σ rank over this attachment's votes (for the average-rank tie-break).
    pub rank_sum: u64,
}

impl MbcTally {
    /// points / (m·(m−1)); 0.0 when m < 2 (the divisor degenerates).
    pub fn mbc_score(&self, m: u32) -> f64 {
        match mbc_divisor(m) {
            Some(d) => self.points as f64 / d as f64,
            None => 0.0,
        }
    }

    /// Mean submitted rank; 0.0 for a voteless attachment.
    pub fn average_rank(&self) -> f64 {
        if self.vote_count == 0 {
            0.0
        } else {
            self.rank_sum as f64 / self.vote_count as f64
        }
    }
}

/// Canonical tally map, keyed by attachment id.
pub type TallyMap = BTreeMap<AttachmentId, MbcTally>;

/// m·(m−1), the MBC normalization divisor; `None` when m < 2.
pub fn mbc_divisor(m: u32) -> Option<u64> {
    if m < 2 {
        None
    } else {
        Some(m as u64 * (m as u64 - 1))
    }
}

pub mod assignment;
pub mod config;
pub mod quality;
pub mod ranking;
pub mod tabulation;

// Tight, explicit re-exports (avoid wildcard export drift).
pub use assignment::{build_draft, generate_assignments, AssignInput, AssignmentPlan, Draft, MAX_RESEEDS};
pub use config::{validate_config, validate_ranges, ConfigWarning};
pub use quality::{deviation, quality};
pub use ranking::{adjusted_ranking, adjustment_delta, global_ranking, relative_ranks};
pub use tabulation::tabulate_mbc;
