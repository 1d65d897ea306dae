use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for leads tracked by the automation service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub String);

/// Identifier for the realtor who owns a lead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Financing readiness declared by the lead, spelled on the wire the way the
/// CRM exports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LenderStatus {
    #[serde(rename = "Pre-Approved")]
    PreApproved,
    #[serde(rename = "Pre-Qualified")]
    PreQualified,
    #[serde(rename = "Application Submitted")]
    ApplicationSubmitted,
    #[serde(rename = "Not Applied")]
    NotApplied,
    #[default]
    Unknown,
}

impl LenderStatus {
    pub const fn label(self) -> &'static str {
        match self {
            LenderStatus::PreApproved => "Pre-Approved",
            LenderStatus::PreQualified => "Pre-Qualified",
            LenderStatus::ApplicationSubmitted => "Application Submitted",
            LenderStatus::NotApplied => "Not Applied",
            LenderStatus::Unknown => "Unknown",
        }
    }
}

/// Priority tier produced by the classification policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Hot,
    Warm,
    Nurture,
}

impl Tier {
    pub const fn label(self) -> &'static str {
        match self {
            Tier::Hot => "Hot",
            Tier::Warm => "Warm",
            Tier::Nurture => "Nurture",
        }
    }

    /// Ordering weight used when ranking leads for reports.
    pub const fn priority(self) -> u8 {
        match self {
            Tier::Hot => 3,
            Tier::Warm => 2,
            Tier::Nurture => 1,
        }
    }
}

/// Lifecycle owned by intake and the realtor; the cadence core only contacts
/// `Active` leads and flips `OptedOut` on a compliance request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadLifecycle {
    New,
    Active,
    Incomplete,
    Duplicate,
    OptedOut,
    Closed,
}

impl LeadLifecycle {
    pub const fn label(self) -> &'static str {
        match self {
            LeadLifecycle::New => "new",
            LeadLifecycle::Active => "active",
            LeadLifecycle::Incomplete => "incomplete",
            LeadLifecycle::Duplicate => "duplicate",
            LeadLifecycle::OptedOut => "opted_out",
            LeadLifecycle::Closed => "closed",
        }
    }

    /// Live leads appear in reports; only `Active` leads enter the cadence.
    pub const fn is_live(self) -> bool {
        matches!(self, LeadLifecycle::New | LeadLifecycle::Active)
    }
}

/// Delivery channel supported by the dispatcher capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Channel {
    WhatsApp,
    Email,
}

impl Channel {
    pub const fn label(self) -> &'static str {
        match self {
            Channel::WhatsApp => "WhatsApp",
            Channel::Email => "Email",
        }
    }
}

/// Message direction recorded on the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Outbound,
    Inbound,
}

/// Delivery state of a single contact attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutreachStatus {
    Draft,
    Sent,
    Failed,
}

impl OutreachStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OutreachStatus::Draft => "draft",
            OutreachStatus::Sent => "sent",
            OutreachStatus::Failed => "failed",
        }
    }
}

/// Inbound payload captured from manual entry, the chatbot, or an import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadSubmission {
    pub owner_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub preferred_channel: Option<Channel>,
    #[serde(default)]
    pub budget: Option<u64>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub motivation: Option<String>,
    #[serde(default)]
    pub lender_status: Option<LenderStatus>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub consent_given: bool,
}

/// The central entity. Raw attributes are intake-owned; derived fields are
/// written only alongside a freshly computed score; cadence fields are owned
/// by the follow-up scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub owner_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub preferred_channel: Option<Channel>,
    pub source: String,
    pub consent_given: bool,
    pub budget: Option<u64>,
    pub timeline: Option<String>,
    pub motivation: Option<String>,
    pub lender_status: LenderStatus,
    pub last_contact_date: Option<DateTime<Utc>>,
    pub response_rate: Option<f64>,
    pub score: Option<u8>,
    pub classification: Option<Tier>,
    pub explainability_card: Option<String>,
    pub last_scored_at: Option<DateTime<Utc>>,
    pub next_action_date: Option<DateTime<Utc>>,
    pub lifecycle: LeadLifecycle,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    /// Raw attribute view handed to the scoring engine.
    pub fn snapshot(&self) -> LeadSnapshot {
        LeadSnapshot {
            budget: self.budget,
            timeline: self.timeline.clone(),
            motivation: self.motivation.clone(),
            lender_status: self.lender_status,
            last_contact_date: self.last_contact_date,
            response_rate: self.response_rate,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Channel the cadence scheduler will use, defaulting to WhatsApp.
    pub fn contact_channel(&self) -> Channel {
        self.preferred_channel.unwrap_or(Channel::WhatsApp)
    }

    pub fn destination_for(&self, channel: Channel) -> &str {
        match channel {
            Channel::WhatsApp => &self.phone,
            Channel::Email => &self.email,
        }
    }

    pub fn status_view(&self) -> LeadStatusView {
        LeadStatusView {
            lead_id: self.id.clone(),
            owner_id: self.owner_id.clone(),
            lifecycle: self.lifecycle.label(),
            score: self.score,
            classification: self.classification.map(Tier::label),
            explainability_card: self.explainability_card.clone(),
            last_contact_date: self.last_contact_date,
            next_action_date: self.next_action_date,
        }
    }
}

/// The five raw attributes the scoring engine consumes, frozen at the moment
/// of evaluation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LeadSnapshot {
    pub budget: Option<u64>,
    pub timeline: Option<String>,
    pub motivation: Option<String>,
    pub lender_status: LenderStatus,
    pub last_contact_date: Option<DateTime<Utc>>,
    pub response_rate: Option<f64>,
}

/// One contact attempt. Append-only: records are never mutated after
/// creation and form the outreach audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachRecord {
    pub lead_id: LeadId,
    pub owner_id: UserId,
    pub channel: Channel,
    pub subject: String,
    pub content: String,
    pub direction: Direction,
    pub status: OutreachStatus,
    pub tier: Tier,
    pub requires_approval: bool,
    pub created_at: DateTime<Utc>,
}

/// Compliance ledger entry; the opt-out guard reads these, never writes them
/// back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceEvent {
    pub lead_id: LeadId,
    pub event_type: ComplianceEventType,
    pub detail: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplianceEventType {
    LeadIntake,
    OptOut,
}

/// Sanitized representation of a lead's exposed status.
#[derive(Debug, Clone, Serialize)]
pub struct LeadStatusView {
    pub lead_id: LeadId,
    pub owner_id: UserId,
    pub lifecycle: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explainability_card: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_contact_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_action_date: Option<DateTime<Utc>>,
}

/// Renders a whole-dollar amount with thousands separators, e.g. `$450,000`.
pub fn format_currency(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("${grouped}")
}
