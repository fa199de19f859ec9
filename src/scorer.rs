//! Weighted scorer (component D): collapses four subscores into a single
//! convergence signal. Pure function, no IO.

use crate::models::plan::{PlanScore, ScoreBreakdownEntry};

pub const REGULATORY_WEIGHT: f64 = 0.40;
pub const CULTURAL_WEIGHT: f64 = 0.30;
pub const SPATIAL_WEIGHT: f64 = 0.20;
pub const CRITIC_WEIGHT: f64 = 0.10;

/// Default convergence threshold; configurable but normatively 0.70.
pub const DEFAULT_THRESHOLD: f64 = 0.70;

/// `score = 0.40*reg + 0.30*vastu + 0.20*spatial + 0.10*criticConfidence`,
/// each input clamped to [0,1] before weighting so the result is always in
/// [0,1] regardless of slightly-out-of-range upstream values (e.g. an
/// unclamped critic score).
pub fn score(regulatory: f64, cultural: f64, spatial: f64, critic_confidence: f64, threshold: f64) -> PlanScore {
    let reg = regulatory.clamp(0.0, 1.0);
    let vastu = cultural.clamp(0.0, 1.0);
    let sp = spatial.clamp(0.0, 1.0);
    let cc = critic_confidence.clamp(0.0, 1.0);

    let breakdown = vec![
        ScoreBreakdownEntry {
            category: "regulatory".to_string(),
            weight: REGULATORY_WEIGHT,
            raw_score: reg,
            weighted_score: REGULATORY_WEIGHT * reg,
        },
        ScoreBreakdownEntry {
            category: "cultural".to_string(),
            weight: CULTURAL_WEIGHT,
            raw_score: vastu,
            weighted_score: CULTURAL_WEIGHT * vastu,
        },
        ScoreBreakdownEntry {
            category: "spatial".to_string(),
            weight: SPATIAL_WEIGHT,
            raw_score: sp,
            weighted_score: SPATIAL_WEIGHT * sp,
        },
        ScoreBreakdownEntry {
            category: "critic_confidence".to_string(),
            weight: CRITIC_WEIGHT,
            raw_score: cc,
            weighted_score: CRITIC_WEIGHT * cc,
        },
    ];

    let final_score: f64 = breakdown.iter().map(|b| b.weighted_score).sum();
    // Convergence check uses strict >=; equal to threshold counts as passing.
    let passes_threshold = final_score >= threshold;

    PlanScore { final_score, breakdown, passes_threshold }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_inputs_yield_perfect_score() {
        let result = score(1.0, 1.0, 1.0, 1.0, DEFAULT_THRESHOLD);
        assert!((result.final_score - 1.0).abs() < 1e-9);
        assert!(result.passes_threshold);
    }

    #[test]
    fn out_of_range_inputs_are_clamped_into_bounds() {
        let result = score(1.5, -0.3, 1.0, 1.0, DEFAULT_THRESHOLD);
        assert!(result.final_score >= 0.0 && result.final_score <= 1.0);
    }

    #[test]
    fn threshold_equality_counts_as_passing() {
        // Regulatory-only contribution of exactly 0.70 should pass with
        // everything else at zero: 0.40*1.0 + 0.30*0 + 0.20*1.0 + 0.10*0 = 0.60, not enough;
        // use all four weighted to land exactly at the threshold instead.
        let result = score(1.0, 1.0, 0.5, 1.0, 0.70);
        assert!((result.final_score - 0.70).abs() < 1e-9);
        assert!(result.passes_threshold);
    }

    #[test]
    fn weights_sum_to_one() {
        assert!((REGULATORY_WEIGHT + CULTURAL_WEIGHT + SPATIAL_WEIGHT + CRITIC_WEIGHT - 1.0).abs() < 1e-9);
    }
}
