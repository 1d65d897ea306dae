use chrono::{DateTime, Utc};

use super::super::domain::LenderStatus;

const HIGH_MOTIVATION_KEYWORDS: [&str; 5] =
    ["relocating", "job transfer", "family", "urgent", "quick"];
const LOW_MOTIVATION_KEYWORDS: [&str; 4] = ["just looking", "browsing", "not sure", "maybe"];

/// Five-tier step function over the declared budget. Absent or zero budgets
/// score 0 rather than erroring.
pub(crate) fn budget_score(budget: Option<u64>) -> u8 {
    match budget {
        None | Some(0) => 0,
        Some(amount) if amount >= 500_000 => 100,
        Some(amount) if amount >= 300_000 => 80,
        Some(amount) if amount >= 200_000 => 60,
        Some(amount) if amount >= 100_000 => 40,
        Some(_) => 20,
    }
}

/// Keyword match over the free-text purchase timeline. Unknown timelines
/// score a moderate 30; recognizable but unranked phrasing scores 40.
pub(crate) fn timeline_score(timeline: Option<&str>) -> u8 {
    let Some(raw) = timeline else {
        return 30;
    };
    let phrase = raw.to_lowercase();

    if phrase.contains("immediate") || phrase.contains("asap") {
        100
    } else if phrase.contains("30 days") || phrase.contains("1 month") {
        90
    } else if phrase.contains("60 days") || phrase.contains("2 month") {
        80
    } else if phrase.contains("90 days") || phrase.contains("3 month") {
        70
    } else if phrase.contains("6 month") {
        50
    } else if phrase.contains("year") || phrase.contains("12 month") {
        30
    } else {
        40
    }
}

pub(crate) fn lender_score(status: LenderStatus) -> u8 {
    match status {
        LenderStatus::PreApproved => 100,
        LenderStatus::PreQualified => 80,
        LenderStatus::ApplicationSubmitted => 60,
        LenderStatus::NotApplied => 30,
        LenderStatus::Unknown => 40,
    }
}

/// Base 50 plus a recency bonus from the last contact and a response-rate
/// bonus, clamped to 100.
pub(crate) fn engagement_score(
    last_contact_date: Option<DateTime<Utc>>,
    response_rate: Option<f64>,
    evaluated_at: DateTime<Utc>,
) -> u8 {
    let mut score: u32 = 50;

    if let Some(contact) = last_contact_date {
        let days_since = (evaluated_at - contact).num_seconds() as f64 / 86_400.0;
        if days_since <= 1.0 {
            score += 30;
        } else if days_since <= 7.0 {
            score += 20;
        } else if days_since <= 30.0 {
            score += 10;
        }
    }

    if response_rate.is_some_and(|rate| rate > 0.5) {
        score += 20;
    }

    score.min(100) as u8
}

/// Base 50 adjusted by urgency keywords in the stated motivation, clamped to
/// 0..=100. An absent motivation scores 30.
pub(crate) fn motivation_score(motivation: Option<&str>) -> u8 {
    let Some(raw) = motivation else {
        return 30;
    };
    let phrase = raw.to_lowercase();

    let high_hits = HIGH_MOTIVATION_KEYWORDS
        .iter()
        .filter(|keyword| phrase.contains(**keyword))
        .count() as i32;
    let low_hits = LOW_MOTIVATION_KEYWORDS
        .iter()
        .filter(|keyword| phrase.contains(**keyword))
        .count() as i32;

    (50 + high_hits * 10 - low_hits * 15).clamp(0, 100) as u8
}
