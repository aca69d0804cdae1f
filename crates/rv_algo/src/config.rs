//! Voting-configuration feasibility validation.
//!
//! Pure: checks a proposed configuration against the current population
//! counts (k attachments, n participants) and mutates nothing. Hard failures
//! come back as `config_invalid` with the violated rule; soft findings come
//! back as warnings, which strict mode upgrades to rejections.

use std::fmt;

use rv_core::entities::VotingConfig;
use rv_core::errors::Error;

/// Implementation safety cap on m.
pub const MAX_PER_EVALUATOR: u32 = 50;
/// Cap on the coverage floor.
pub const MAX_MIN_COVERAGE: u32 = 20;
/// Cap on the adjustment magnitude n.
pub const MAX_ADJUSTMENT: u32 = 10;
/// Recommended minimum gap between the quality thresholds.
pub const RECOMMENDED_QUALITY_GAP: f64 = 0.1;

/// Non-fatal findings surfaced by the preview endpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigWarning {
    /// q_good − q_bad is below the recommended 0.1.
    NarrowQualityGap { gap: f64 },
    /// m is below the ⌈2·log₂ k⌉ convergence recommendation.
    BelowConvergenceFloor { m: u32, floor: u32 },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::NarrowQualityGap { gap } => write!(
                f,
                "quality threshold gap {gap:.3} is below the recommended {RECOMMENDED_QUALITY_GAP}"
            ),
            ConfigWarning::BelowConvergenceFloor { m, floor } => write!(
                f,
                "m = {m} is below the convergence recommendation of {floor}"
            ),
        }
    }
}

fn reject(rule: impl Into<String>) -> Error {
    Error::ConfigInvalid { rule: rule.into() }
}

/// ⌈2·log₂ max(k, 2)⌉.
pub fn convergence_floor(k: u32) -> u32 {
    let k = k.max(2) as f64;
    (2.0 * k.log2()).ceil() as u32
}

/// Population-independent checks: parameter ranges and threshold ordering.
/// This is what config create/update can verify while uploads have not
/// happened yet; the population checks run again at preview and generation
/// time through [`validate_config`].
pub fn validate_ranges(cfg: &VotingConfig) -> Result<Vec<ConfigWarning>, Error> {
    let m = cfg.attachments_per_evaluator;
    if m == 0 {
        return Err(reject("m must be at least 1"));
    }
    if m > MAX_PER_EVALUATOR {
        return Err(reject(format!("m = {m} exceeds the safety cap {MAX_PER_EVALUATOR}")));
    }

    if cfg.min_coverage == 0 {
        return Err(reject("min_cov must be at least 1"));
    }
    if cfg.min_coverage > MAX_MIN_COVERAGE {
        return Err(reject(format!(
            "min_cov = {} exceeds the cap {MAX_MIN_COVERAGE}",
            cfg.min_coverage
        )));
    }

    for (label, q) in [("q_good", cfg.quality_good), ("q_bad", cfg.quality_bad)] {
        if !q.is_finite() || !(0.0..=1.0).contains(&q) {
            return Err(reject(format!("{label} = {q} is outside [0, 1]")));
        }
    }
    if cfg.quality_good <= cfg.quality_bad {
        return Err(reject(format!(
            "q_good = {} must exceed q_bad = {}",
            cfg.quality_good, cfg.quality_bad
        )));
    }

    if cfg.adjustment == 0 {
        return Err(reject("n must be at least 1"));
    }
    if cfg.adjustment > MAX_ADJUSTMENT {
        return Err(reject(format!(
            "n = {} exceeds the cap {MAX_ADJUSTMENT}",
            cfg.adjustment
        )));
    }

    let mut warnings = Vec::new();
    let gap = cfg.quality_good - cfg.quality_bad;
    if gap < RECOMMENDED_QUALITY_GAP {
        warnings.push(ConfigWarning::NarrowQualityGap { gap });
    }
    Ok(warnings)
}

/// Validate `cfg` against the current population. `k` is the attachment
/// count, `participants` the participant count. In strict mode the
/// convergence recommendation becomes a rejection.
pub fn validate_config(
    cfg: &VotingConfig,
    k: u32,
    participants: u32,
    strict: bool,
) -> Result<Vec<ConfigWarning>, Error> {
    let mut warnings = validate_ranges(cfg)?;

    let m = cfg.attachments_per_evaluator;
    if m > k {
        return Err(reject(format!("m = {m} exceeds the attachment count k = {k}")));
    }

    // Coverage feasibility: the participants must collectively produce at
    // least min_cov evaluations per attachment.
    let capacity = participants as u64 * m as u64;
    let demand = k as u64 * cfg.min_coverage as u64;
    if capacity < demand {
        return Err(reject(format!(
            "coverage infeasible: {participants} participants x m = {m} yields {capacity} \
             evaluations, but k = {k} x min_cov = {} requires {demand}",
            cfg.min_coverage
        )));
    }

    let floor = convergence_floor(k);
    if m < floor {
        if strict {
            return Err(reject(format!(
                "m = {m} is below the convergence floor {floor} (strict mode)"
            )));
        }
        warnings.push(ConfigWarning::BelowConvergenceFloor { m, floor });
    }

    Ok(warnings)
}
