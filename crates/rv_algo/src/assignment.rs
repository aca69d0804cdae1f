//! Randomized two-phase assignment generation.
//!
//! Phase 1 walks attachments in id order and hands each one `min_cov`
//! reviewers drawn from a shuffled participant order; Phase 2 fills every
//! participant up to m from a shuffled attachment order. Both phases skip
//! owners (conflict of interest) and participants already at capacity, so a
//! draft can miss the coverage floor on unlucky shuffles; the generator then
//! re-seeds a bounded number of times. Everything is deterministic given the
//! seed: inputs are walked in id order and all randomness comes from
//! `AssignRng`.

use std::collections::BTreeMap;

use rv_core::errors::Error;
use rv_core::ids::{AttachmentId, UserId};
use rv_core::rng::AssignRng;

/// Bounded re-seed budget before the generator gives up on coverage.
pub const MAX_RESEEDS: u32 = 16;

/// Population snapshot the generator works from.
#[derive(Clone, Copy, Debug)]
pub struct AssignInput<'a> {
    /// Participants in canonical (id-sorted) order, duplicate-free.
    pub participants: &'a [UserId],
    /// (attachment, owner) pairs in canonical (id-sorted) order.
    pub attachments: &'a [(AttachmentId, UserId)],
    /// m — attachments per evaluator.
    pub per_evaluator: u32,
    /// min_cov — coverage floor per attachment.
    pub min_coverage: u32,
}

/// One deterministic draft built from a single seed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Draft {
    pub assigned: BTreeMap<UserId, Vec<AttachmentId>>,
    /// Every participant reached m attachments.
    pub complete: bool,
    /// Every attachment reached min_cov reviewers.
    pub coverage_met: bool,
}

/// Accepted generation outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignmentPlan {
    /// Effective seed of the accepted draft (replayable via [`build_draft`]).
    pub seed: u64,
    /// Number of drafts built, including the accepted one.
    pub attempts: u32,
    pub coverage_met: bool,
    pub assigned: BTreeMap<UserId, Vec<AttachmentId>>,
}

/// Build the draft for one seed. This is the audit-replay entry point: the
/// seed persisted with generated assignments reproduces the accepted draft
/// through this function.
pub fn build_draft(input: &AssignInput<'_>, seed: u64) -> Draft {
    let n = input.participants.len();
    let k = input.attachments.len();
    let m = input.per_evaluator as usize;
    let min_cov = input.min_coverage as usize;

    let owner_of: Vec<usize> = input
        .attachments
        .iter()
        .map(|(_, owner)| {
            input
                .participants
                .binary_search(owner)
                .unwrap_or(usize::MAX)
        })
        .collect();

    let mut rng = AssignRng::from_seed_u64(seed);
    let mut lists: Vec<Vec<usize>> = vec![Vec::with_capacity(m); n];
    let mut member: Vec<Vec<bool>> = vec![vec![false; k]; n];
    let mut coverage: Vec<usize> = vec![0; k];

    // Phase 1 — coverage pass.
    let mut p_order: Vec<usize> = (0..n).collect();
    for f in 0..k {
        rng.shuffle_in_place(&mut p_order);
        for &p in &p_order {
            if coverage[f] == min_cov {
                break;
            }
            if owner_of[f] == p || lists[p].len() == m {
                continue;
            }
            lists[p].push(f);
            member[p][f] = true;
            coverage[f] += 1;
        }
    }

    // Phase 2 — fill pass.
    let mut f_order: Vec<usize> = (0..k).collect();
    for p in 0..n {
        if lists[p].len() == m {
            continue;
        }
        rng.shuffle_in_place(&mut f_order);
        for &f in &f_order {
            if lists[p].len() == m {
                break;
            }
            if owner_of[f] == p || member[p][f] {
                continue;
            }
            lists[p].push(f);
            member[p][f] = true;
            coverage[f] += 1;
        }
    }

    let complete = lists.iter().all(|l| l.len() == m);
    let coverage_met = coverage.iter().all(|&c| c >= min_cov);

    let assigned = input
        .participants
        .iter()
        .zip(&lists)
        .map(|(p, l)| {
            (
                p.clone(),
                l.iter().map(|&f| input.attachments[f].0.clone()).collect(),
            )
        })
        .collect();

    Draft {
        assigned,
        complete,
        coverage_met,
    }
}

/// Generate assignments for the whole event.
///
/// Tries derived seeds `base_seed + attempt` until a draft is both complete
/// and coverage-met. If the budget runs out, the first complete draft is
/// accepted with `coverage_met = false` (coverage is best-effort); with no
/// complete draft at all the generation fails with `infeasible_assignment`
/// and no partial output.
pub fn generate_assignments(
    input: &AssignInput<'_>,
    base_seed: u64,
) -> Result<AssignmentPlan, Error> {
    let k = input.attachments.len();
    let m = input.per_evaluator as usize;

    // A participant owning too much of F can never be filled; detect this
    // deterministically instead of burning the re-seed budget.
    for p in input.participants {
        let owned = input.attachments.iter().filter(|(_, o)| o == p).count();
        if k - owned < m {
            return Err(Error::InfeasibleAssignment {
                reason: format!(
                    "participant {p} owns {owned} of {k} attachments, leaving fewer than m = {m} to review"
                ),
            });
        }
    }

    let mut first_complete: Option<(u64, Draft)> = None;
    for attempt in 0..MAX_RESEEDS {
        let seed = base_seed.wrapping_add(attempt as u64);
        let draft = build_draft(input, seed);
        if draft.complete && draft.coverage_met {
            return Ok(AssignmentPlan {
                seed,
                attempts: attempt + 1,
                coverage_met: true,
                assigned: draft.assigned,
            });
        }
        if draft.complete && first_complete.is_none() {
            first_complete = Some((seed, draft));
        }
    }

    match first_complete {
        Some((seed, draft)) => Ok(AssignmentPlan {
            seed,
            attempts: MAX_RESEEDS,
            coverage_met: false,
            assigned: draft.assigned,
        }),
        None => Err(Error::InfeasibleAssignment {
            reason: format!("no complete draft after {MAX_RESEEDS} seeds"),
        }),
    }
}
