mod config;
mod explain;
mod factors;
mod policy;

pub use config::ScoringConfig;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{LeadSnapshot, Tier};

/// Stateless scorer applying the rules-based weighted model to a lead
/// snapshot. Pure and total: missing or malformed attributes degrade to the
/// documented defaults, and identical inputs always produce identical
/// results.
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, snapshot: &LeadSnapshot, evaluated_at: DateTime<Utc>) -> ScoringResult {
        let sub_scores = SubScores {
            budget: factors::budget_score(snapshot.budget),
            timeline: factors::timeline_score(snapshot.timeline.as_deref()),
            lender: factors::lender_score(snapshot.lender_status),
            engagement: factors::engagement_score(
                snapshot.last_contact_date,
                snapshot.response_rate,
                evaluated_at,
            ),
            motivation: factors::motivation_score(snapshot.motivation.as_deref()),
        };

        let score = self.config.weighted_total(&sub_scores);
        let classification = policy::classify(score, &sub_scores, &self.config);
        let explainability_card =
            explain::explainability_card(score, &sub_scores, classification, snapshot);

        ScoringResult {
            score,
            classification,
            explainability_card,
            sub_scores,
        }
    }
}

/// Per-factor contributions, kept alongside the total so every decision is
/// auditable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubScores {
    pub budget: u8,
    pub timeline: u8,
    pub lender: u8,
    pub engagement: u8,
    pub motivation: u8,
}

/// Scoring output persisted onto the lead and logged for the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub score: u8,
    pub classification: Tier,
    pub explainability_card: String,
    pub sub_scores: SubScores,
}
