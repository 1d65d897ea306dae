use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{format_currency, Lead, LeadId, Tier, UserId};

const MINUTES_SAVED_PER_MESSAGE: u64 = 5;
const AVERAGE_DEAL_VALUE: u64 = 10_000;
const TOP_LEAD_COUNT: usize = 5;

/// One ranked lead inside the digest.
#[derive(Debug, Clone, Serialize)]
pub struct DigestEntry {
    pub lead_id: LeadId,
    pub name: String,
    pub classification: Option<&'static str>,
    pub score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<u64>,
    pub engagement: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explainability_card: Option<String>,
}

/// Monthly impact numbers shown under the lead list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RoiMetrics {
    pub messages_sent: usize,
    pub deals_closed: usize,
    pub hours_saved: u64,
    pub revenue_impact: u64,
    pub efficiency_pct: f64,
}

impl RoiMetrics {
    pub fn compute(messages_sent: usize, deals_closed: usize) -> Self {
        let hours_saved =
            ((messages_sent as u64 * MINUTES_SAVED_PER_MESSAGE) as f64 / 60.0).round() as u64;
        let efficiency_pct = if messages_sent > 0 && deals_closed > 0 {
            (deals_closed as f64 / messages_sent as f64 * 1000.0).round() / 10.0
        } else {
            0.0
        };
        Self {
            messages_sent,
            deals_closed,
            hours_saved,
            revenue_impact: deals_closed as u64 * AVERAGE_DEAL_VALUE,
            efficiency_pct,
        }
    }
}

/// The per-realtor daily report: top five leads ranked tier-first, monthly
/// ROI numbers, and the rendered text body.
#[derive(Debug, Clone, Serialize)]
pub struct DailyDigest {
    pub owner_id: UserId,
    pub generated_on: NaiveDate,
    pub top_leads: Vec<DigestEntry>,
    pub roi: RoiMetrics,
    pub content: String,
}

impl DailyDigest {
    /// Builds a digest from the owner's live leads paired with their 7-day
    /// outreach counts, plus 30-day message and closed-deal totals.
    pub fn build(
        owner_id: UserId,
        leads: &[(Lead, usize)],
        messages_sent: usize,
        deals_closed: usize,
        today: NaiveDate,
    ) -> Self {
        let mut entries: Vec<DigestEntry> = leads
            .iter()
            .map(|(lead, recent_outreach)| DigestEntry {
                lead_id: lead.id.clone(),
                name: lead.display_name(),
                classification: lead.classification.map(Tier::label),
                score: lead.score.unwrap_or(0),
                budget: lead.budget,
                engagement: engagement_factor(*recent_outreach),
                explainability_card: lead.explainability_card.clone(),
            })
            .collect();

        entries.sort_by(|a, b| {
            let tier_a = tier_priority(a.classification);
            let tier_b = tier_priority(b.classification);
            tier_b.cmp(&tier_a).then_with(|| {
                let rank_a = f64::from(a.score) * a.engagement;
                let rank_b = f64::from(b.score) * b.engagement;
                rank_b
                    .partial_cmp(&rank_a)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
        });
        entries.truncate(TOP_LEAD_COUNT);

        let roi = RoiMetrics::compute(messages_sent, deals_closed);
        let content = render_report(&entries, &roi, today);

        Self {
            owner_id,
            generated_on: today,
            top_leads: entries,
            roi,
            content,
        }
    }
}

/// Engagement factor derived from the count of outreach in the last week.
fn engagement_factor(recent_outreach: usize) -> f64 {
    if recent_outreach >= 5 {
        1.0
    } else if recent_outreach >= 3 {
        0.8
    } else if recent_outreach >= 1 {
        0.6
    } else {
        0.3
    }
}

fn tier_priority(label: Option<&'static str>) -> u8 {
    match label {
        Some("Hot") => Tier::Hot.priority(),
        Some("Warm") => Tier::Warm.priority(),
        Some("Nurture") => Tier::Nurture.priority(),
        _ => 0,
    }
}

fn render_report(entries: &[DigestEntry], roi: &RoiMetrics, today: NaiveDate) -> String {
    let mut report = String::new();
    writeln!(report, "Daily Top 5 Leads - {today}").expect("write headline");
    report.push('\n');

    if entries.is_empty() {
        report.push_str("No priority leads today.\n");
        report.push_str(
            "Focus on your nurture pool and consider running some lead generation campaigns.\n",
        );
    } else {
        for (index, entry) in entries.iter().enumerate() {
            let budget = entry
                .budget
                .map(format_currency)
                .unwrap_or_else(|| "Unknown".to_string());
            writeln!(
                report,
                "{}. {} ({})",
                index + 1,
                entry.name,
                entry.classification.unwrap_or("New"),
            )
            .expect("write lead line");
            writeln!(report, "   Score: {}/100 | Budget: {}", entry.score, budget)
                .expect("write score line");
            if let Some(card) = &entry.explainability_card {
                writeln!(report, "   {card}").expect("write card line");
            }
        }
    }

    report.push('\n');
    report.push_str("This month's impact:\n");
    writeln!(report, "- {} deals closed", roi.deals_closed).expect("write deals");
    writeln!(report, "- {} hours saved", roi.hours_saved).expect("write hours");
    writeln!(
        report,
        "- {} revenue impact",
        format_currency(roi.revenue_impact)
    )
    .expect("write revenue");
    writeln!(report, "- {}% conversion efficiency", roi.efficiency_pct).expect("write efficiency");

    report.push('\n');
    report.push_str("Today's action items:\n");
    if entries
        .iter()
        .any(|entry| entry.classification == Some(Tier::Hot.label()))
    {
        report.push_str("- Review and approve draft messages for Hot leads\n");
    }
    report.push_str("- Follow up on any pending showings\n");
    report.push_str("- Check the nurture pool for re-engagement opportunities\n");

    report
}
