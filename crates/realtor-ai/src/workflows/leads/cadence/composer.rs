use chrono::{Datelike, NaiveDate};

use super::super::domain::{format_currency, Lead, Tier};
use super::super::repository::OutreachMessage;

const MARKET_TRENDS: [&str; 3] = ["up 2%", "down 1%", "stable"];
const FINANCING_TIPS: [&str; 3] = [
    "Consider getting pre-approved before shopping to strengthen your offers",
    "First-time buyer programs can save you thousands in down payment assistance",
    "Interest rates are currently favorable - lock in your rate early",
];

/// Supplies the rotating filler snippets used by the nurture template. The
/// production implementation rotates deterministically by date; tests inject
/// fixed values so full message content stays assertable.
pub trait MarketContentProvider: Send + Sync {
    fn market_trend(&self, on: NaiveDate) -> String;
    fn financing_tip(&self, on: NaiveDate) -> String;
    fn new_listings_count(&self, on: NaiveDate) -> u32;
}

/// Date-keyed rotation through the documented snippet sets.
#[derive(Debug, Default, Clone)]
pub struct RotatingMarketContent;

impl MarketContentProvider for RotatingMarketContent {
    fn market_trend(&self, on: NaiveDate) -> String {
        MARKET_TRENDS[on.ordinal0() as usize % MARKET_TRENDS.len()].to_string()
    }

    fn financing_tip(&self, on: NaiveDate) -> String {
        FINANCING_TIPS[on.ordinal0() as usize % FINANCING_TIPS.len()].to_string()
    }

    fn new_listings_count(&self, on: NaiveDate) -> u32 {
        on.ordinal0() % 10 + 1
    }
}

/// Renders channel-agnostic follow-up content from a fixed template per
/// tier. No side effects; deterministic given the lead, date, and injected
/// content provider.
#[derive(Debug, Clone)]
pub struct MessageComposer {
    agent_name: String,
}

impl MessageComposer {
    pub fn new(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
        }
    }

    pub fn compose(
        &self,
        lead: &Lead,
        tier: Tier,
        content: &dyn MarketContentProvider,
        on: NaiveDate,
    ) -> OutreachMessage {
        match tier {
            Tier::Hot => self.hot_message(lead),
            Tier::Warm => self.warm_message(lead),
            Tier::Nurture => self.nurture_message(lead, content, on),
        }
    }

    fn hot_message(&self, lead: &Lead) -> OutreachMessage {
        let timeline = lead.timeline.as_deref().unwrap_or("upcoming");
        let budget = lead
            .budget
            .map(format_currency)
            .unwrap_or_else(|| "your".to_string());
        OutreachMessage {
            subject: format!("Quick follow-up on your {timeline} home search"),
            content: format!(
                "Hi {name},\n\n\
                 I wanted to follow up on your home search with a {timeline} timeline. \
                 Given your budget of {budget} and {lender} status, I have some exciting \
                 opportunities that just came on the market.\n\n\
                 Would you be available for a quick 10-minute call this week to discuss \
                 your priorities and show you what's available?\n\n\
                 Best regards,\n{agent}",
                name = lead.first_name,
                timeline = timeline,
                budget = budget,
                lender = lead.lender_status.label().to_lowercase(),
                agent = self.agent_name,
            ),
        }
    }

    fn warm_message(&self, lead: &Lead) -> OutreachMessage {
        OutreachMessage {
            subject: format!("Market update for {}", lead.first_name),
            content: format!(
                "Hi {name},\n\n\
                 I hope you're doing well! I wanted to share a quick market update and \
                 check in on your home search.\n\n\
                 The market has been quite active, and I'm seeing some great \
                 opportunities in your price range. When you're ready to move forward, \
                 I'm here to help make the process smooth and successful.\n\n\
                 Feel free to reach out if you have any questions or want to schedule a \
                 showing.\n\n\
                 Best,\n{agent}",
                name = lead.first_name,
                agent = self.agent_name,
            ),
        }
    }

    fn nurture_message(
        &self,
        lead: &Lead,
        content: &dyn MarketContentProvider,
        on: NaiveDate,
    ) -> OutreachMessage {
        OutreachMessage {
            subject: "Monthly market insights + financing tip".to_string(),
            content: format!(
                "Hi {name},\n\n\
                 Here is your monthly real estate update:\n\n\
                 Market stats: home prices in your area are {trend} this month.\n\
                 Financing tip: {tip}.\n\
                 New listings: {listings} homes in your budget range.\n\n\
                 I'm here whenever you're ready to take the next step in your home \
                 search. No pressure, just keeping you informed!\n\n\
                 Best regards,\n{agent}",
                name = lead.first_name,
                trend = content.market_trend(on),
                tip = content.financing_tip(on),
                listings = content.new_listings_count(on),
                agent = self.agent_name,
            ),
        }
    }
}
