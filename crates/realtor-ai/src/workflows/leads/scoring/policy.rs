use super::super::domain::Tier;
use super::config::ScoringConfig;
use super::SubScores;

/// Deterministic decision table, evaluated in fixed order so the first match
/// wins. Hot requires a conjunction of total, timeline, and financing
/// strength; Warm accepts any single strong dimension; Nurture is the
/// fallback.
pub(crate) fn classify(total: u8, scores: &SubScores, config: &ScoringConfig) -> Tier {
    if total >= config.hot_total_min
        && scores.timeline >= config.hot_timeline_min
        && scores.lender >= config.hot_lender_min
    {
        return Tier::Hot;
    }

    if total >= config.warm_total_min
        || scores.budget >= config.warm_budget_min
        || scores.timeline >= config.warm_timeline_min
    {
        return Tier::Warm;
    }

    Tier::Nurture
}
