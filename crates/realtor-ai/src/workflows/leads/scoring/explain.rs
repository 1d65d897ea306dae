use super::super::domain::{format_currency, LeadSnapshot, Tier};
use super::SubScores;

const EXTREME_HIGH: u8 = 80;
const EXTREME_LOW: u8 = 40;

/// Builds the human-readable justification shown to the realtor. Reasons are
/// collected in fixed order (budget, timeline, lender, recency) from
/// whichever sub-scores are extreme; the card always names the chosen tier
/// and the numeric score so it can never contradict the classification.
pub(crate) fn explainability_card(
    total: u8,
    scores: &SubScores,
    tier: Tier,
    snapshot: &LeadSnapshot,
) -> String {
    let mut reasons = Vec::new();

    let budget_text = snapshot
        .budget
        .map(format_currency)
        .unwrap_or_else(|| "none provided".to_string());
    if scores.budget >= EXTREME_HIGH {
        reasons.push(format!("High budget ({budget_text})"));
    } else if scores.budget <= EXTREME_LOW {
        reasons.push(format!("Lower budget ({budget_text})"));
    }

    let timeline_text = snapshot.timeline.as_deref().unwrap_or("unspecified");
    if scores.timeline >= EXTREME_HIGH {
        reasons.push(format!("Short timeline ({timeline_text})"));
    } else if scores.timeline <= EXTREME_LOW {
        reasons.push(format!("Long timeline ({timeline_text})"));
    }

    if scores.lender >= EXTREME_HIGH {
        reasons.push("Pre-approved lender status".to_string());
    } else if scores.lender <= EXTREME_LOW {
        reasons.push("Unclear lender status".to_string());
    }

    if scores.engagement >= EXTREME_HIGH {
        reasons.push("Recent contact".to_string());
    }

    let reason_text = if reasons.is_empty() {
        "Standard scoring criteria".to_string()
    } else {
        reasons.join(", ")
    };

    format!("{} because: {}. Score: {}/100", tier.label(), reason_text, total)
}
