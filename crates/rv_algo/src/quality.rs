//! Per-evaluator quality Q_i.
//!
//! Q_i = 1 − 2·D/(m·(m−1)), where D sums |submitted − relative| over the
//! assigned subset. The divisor degenerates at m = 1, so quality is
//! undefined there (`None`) and the caller applies a neutral adjustment.
//! Values outside [0, 1] indicate degenerate data and saturate silently.

use std::collections::BTreeMap;

use rv_core::ids::AttachmentId;

use crate::mbc_divisor;

/// D_i: total absolute deviation between the submitted ranks and the
/// consensus relative ranks. Ids missing on either side contribute nothing;
/// the intake validator guarantees both maps cover the same set.
pub fn deviation(
    submitted: &BTreeMap<AttachmentId, u32>,
    relative: &BTreeMap<AttachmentId, u32>,
) -> u64 {
    submitted
        .iter()
        .filter_map(|(id, &r)| {
            relative
                .get(id)
                .map(|&rel| (r as i64 - rel as i64).unsigned_abs())
        })
        .sum()
}

/// Q_i for an evaluator with deviation `d` at assignment size `m`, clamped
/// into [0, 1]. `None` when m < 2 (quality undefined).
pub fn quality(m: u32, d: u64) -> Option<f64> {
    let divisor = mbc_divisor(m)?;
    let q = 1.0 - (2.0 * d as f64) / divisor as f64;
    Some(q.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn att(s: &str) -> AttachmentId {
        s.parse().unwrap()
    }

    fn ranks(pairs: &[(&str, u32)]) -> BTreeMap<AttachmentId, u32> {
        pairs.iter().map(|(s, r)| (att(s), *r)).collect()
    }

    #[test]
    fn perfect_alignment_scores_one() {
        let sub = ranks(&[("F1", 1), ("F2", 2)]);
        let rel = ranks(&[("F1", 1), ("F2", 2)]);
        assert_eq!(deviation(&sub, &rel), 0);
        assert_eq!(quality(2, 0), Some(1.0));
    }

    #[test]
    fn full_reversal_scores_zero() {
        let sub = ranks(&[("F1", 2), ("F2", 1)]);
        let rel = ranks(&[("F1", 1), ("F2", 2)]);
        assert_eq!(deviation(&sub, &rel), 2);
        // 1 − 2·2/2 = −1, saturated to 0.
        assert_eq!(quality(2, 2), Some(0.0));
    }

    #[test]
    fn intermediate_deviation() {
        // m = 3, divisor 6: one swapped adjacent pair gives D = 2,
        // Q = 1 − 4/6 = 1/3.
        let sub = ranks(&[("F1", 1), ("F2", 3), ("F3", 2)]);
        let rel = ranks(&[("F1", 1), ("F2", 2), ("F3", 3)]);
        assert_eq!(deviation(&sub, &rel), 2);
        let q = quality(3, 2).unwrap();
        assert!((q - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn quality_is_undefined_at_m_one() {
        assert_eq!(quality(1, 0), None);
        assert_eq!(quality(0, 0), None);
    }
}
