use serde::{Deserialize, Serialize};

use super::SubScores;

/// Rubric configuration for the weighted scoring model: factor weights
/// (summing to 100) and the tier thresholds consumed by the classification
/// policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub budget_weight: u32,
    pub timeline_weight: u32,
    pub lender_weight: u32,
    pub engagement_weight: u32,
    pub motivation_weight: u32,
    pub hot_total_min: u8,
    pub hot_timeline_min: u8,
    pub hot_lender_min: u8,
    pub warm_total_min: u8,
    pub warm_budget_min: u8,
    pub warm_timeline_min: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            budget_weight: 30,
            timeline_weight: 25,
            lender_weight: 20,
            engagement_weight: 15,
            motivation_weight: 10,
            hot_total_min: 80,
            hot_timeline_min: 80,
            hot_lender_min: 80,
            warm_total_min: 60,
            warm_budget_min: 80,
            warm_timeline_min: 70,
        }
    }
}

impl ScoringConfig {
    /// Weighted total over the sub-scores. Weights sum to 100, so the result
    /// stays within 0..=100 by construction; the clamp only guards against
    /// misconfigured weight tables.
    pub(crate) fn weighted_total(&self, scores: &SubScores) -> u8 {
        let weighted = f64::from(scores.budget) * f64::from(self.budget_weight)
            + f64::from(scores.timeline) * f64::from(self.timeline_weight)
            + f64::from(scores.lender) * f64::from(self.lender_weight)
            + f64::from(scores.engagement) * f64::from(self.engagement_weight)
            + f64::from(scores.motivation) * f64::from(self.motivation_weight);
        (weighted / 100.0).round().clamp(0.0, 100.0) as u8
    }
}
