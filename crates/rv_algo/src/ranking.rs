//! Global and adjusted rankings.
//!
//! The global ranking sorts by MBC descending with a deterministic tie-break
//! chain: higher vote count, lower average rank, attachment id. At fixed m
//! the MBC comparison is exact on integer Borda points, so two runs over the
//! same votes are byte-identical. The adjusted ranking shifts each row by the
//! owner's evaluator quality and re-numbers densely.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rv_core::determinism::cmp_avg_rank;
use rv_core::ids::AttachmentId;

use crate::TallyMap;

/// Sort attachments into the global ranking G; returns (id, rank) with dense
/// ranks 1..=k. The comparator is a total order, so ranks are unique.
pub fn global_ranking(tallies: &TallyMap) -> Vec<(AttachmentId, u32)> {
    let mut order: Vec<&AttachmentId> = tallies.keys().collect();
    order.sort_by(|a, b| {
        let ta = &tallies[*a];
        let tb = &tallies[*b];
        // MBC descending == points descending at fixed m.
        tb.points
            .cmp(&ta.points)
            .then_with(|| tb.vote_count.cmp(&ta.vote_count))
            .then_with(|| cmp_avg_rank(ta.rank_sum, ta.vote_count, tb.rank_sum, tb.vote_count))
            .then_with(|| a.as_str().cmp(b.as_str()))
    });
    order
        .into_iter()
        .enumerate()
        .map(|(i, id)| (id.clone(), i as u32 + 1))
        .collect()
}

/// Relative ranks of an assigned subset: order it by global rank ascending
/// and number it 1..=|subset|. Ids absent from the global ranking sort last
/// (the caller guarantees this cannot happen for in-event assignments).
pub fn relative_ranks(
    assigned: &[AttachmentId],
    rank_of: &BTreeMap<AttachmentId, u32>,
) -> BTreeMap<AttachmentId, u32> {
    let mut subset: Vec<&AttachmentId> = assigned.iter().collect();
    subset.sort_by(|a, b| {
        let ra = rank_of.get(*a).copied().unwrap_or(u32::MAX);
        let rb = rank_of.get(*b).copied().unwrap_or(u32::MAX);
        ra.cmp(&rb).then_with(|| a.as_str().cmp(b.as_str()))
    });
    subset
        .into_iter()
        .enumerate()
        .map(|(i, id)| (id.clone(), i as u32 + 1))
        .collect()
}

/// Rank delta earned by an owner's evaluator quality: −n bonus at or above
/// q_good, +n penalty at or below q_bad, 0 between or when no completed
/// assignment produced a quality.
pub fn adjustment_delta(quality: Option<f64>, q_good: f64, q_bad: f64, n: u32) -> i64 {
    match quality {
        Some(q) if q >= q_good => -(n as i64),
        Some(q) if q <= q_bad => n as i64,
        _ => 0,
    }
}

/// Produce the adjusted ranking G′ from the global ranking and a per-
/// attachment delta. Candidate ranks are clamped into [1, k], ordered by
/// (candidate, original global rank), then re-numbered densely 1..=k.
pub fn adjusted_ranking(
    global: &[(AttachmentId, u32)],
    delta_of: impl Fn(&AttachmentId) -> i64,
) -> Vec<(AttachmentId, u32)> {
    let k = global.len() as i64;
    let mut candidates: Vec<(i64, u32, &AttachmentId)> = global
        .iter()
        .map(|(id, rank)| {
            let candidate = (*rank as i64 + delta_of(id)).clamp(1, k.max(1));
            (candidate, *rank, id)
        })
        .collect();
    candidates.sort_by(|a, b| match a.0.cmp(&b.0) {
        Ordering::Equal => a.1.cmp(&b.1),
        o => o,
    });
    candidates
        .into_iter()
        .enumerate()
        .map(|(i, (_, _, id))| (id.clone(), i as u32 + 1))
        .collect()
}
