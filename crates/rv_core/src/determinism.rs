//! Stable ordering helpers.
//!
//! Ranking must be byte-identical across runs and platforms, so comparisons
//! stay in exact integer arithmetic; floats appear only in reported scores.

use std::cmp::Ordering;

use crate::ids::AttachmentId;

/// Compare two average ranks `sum/count` without dividing, ascending.
///
/// A voteless side (count 0) orders **after** any voted side; two voteless
/// sides compare equal. Cross-multiplication is widened to u128 so
/// `sum ≤ m·votes` can never overflow.
pub fn cmp_avg_rank(sum_a: u64, count_a: u32, sum_b: u64, count_b: u32) -> Ordering {
    match (count_a, count_b) {
        (0, 0) => Ordering::Equal,
        (0, _) => Ordering::Greater,
        (_, 0) => Ordering::Less,
        (ca, cb) => {
            let lhs = (sum_a as u128) * (cb as u128);
            let rhs = (sum_b as u128) * (ca as u128);
            lhs.cmp(&rhs)
        }
    }
}

/// Sort attachment ids ascending (lexicographic).
pub fn sort_attachment_ids(ids: &mut [AttachmentId]) {
    ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avg_rank_orders_without_division() {
        // 3/2 = 1.5 vs 5/3 ≈ 1.67
        assert_eq!(cmp_avg_rank(3, 2, 5, 3), Ordering::Less);
        // 4/2 == 2/1
        assert_eq!(cmp_avg_rank(4, 2, 2, 1), Ordering::Equal);
        // voteless after voted
        assert_eq!(cmp_avg_rank(0, 0, 9, 3), Ordering::Greater);
        assert_eq!(cmp_avg_rank(1, 1, 0, 0), Ordering::Less);
        assert_eq!(cmp_avg_rank(0, 0, 0, 0), Ordering::Equal);
    }
}
