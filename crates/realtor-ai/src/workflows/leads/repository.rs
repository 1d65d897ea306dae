use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    Channel, ComplianceEvent, Lead, LeadId, LeadLifecycle, LeadSnapshot, LenderStatus,
    OutreachRecord, Tier, UserId,
};

/// Filter for lead queries issued by the scheduler and reporting paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadFilter {
    pub owner_id: Option<UserId>,
    pub lifecycle: Option<LeadLifecycle>,
    pub classification: Option<Tier>,
}

/// Field mask applied by [`LeadStore::update_lead`]. Absent fields are left
/// untouched; raw attributes are set only by the intake/scoring path, derived
/// and cadence fields only alongside the operations that own them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadUpdate {
    pub budget: Option<u64>,
    pub timeline: Option<String>,
    pub motivation: Option<String>,
    pub lender_status: Option<LenderStatus>,
    pub response_rate: Option<f64>,
    pub score: Option<u8>,
    pub classification: Option<Tier>,
    pub explainability_card: Option<String>,
    pub last_scored_at: Option<DateTime<Utc>>,
    pub last_contact_date: Option<DateTime<Utc>>,
    pub next_action_date: Option<DateTime<Utc>>,
    pub lifecycle: Option<LeadLifecycle>,
}

impl LeadUpdate {
    /// Mask carrying a freshly computed scoring result.
    pub fn from_scoring(result: &super::scoring::ScoringResult, scored_at: DateTime<Utc>) -> Self {
        Self {
            score: Some(result.score),
            classification: Some(result.classification),
            explainability_card: Some(result.explainability_card.clone()),
            last_scored_at: Some(scored_at),
            ..Self::default()
        }
    }

    /// Applies the mask to a lead, bumping its version and updated-at stamp.
    pub fn apply_to(&self, lead: &mut Lead, now: DateTime<Utc>) {
        if let Some(budget) = self.budget {
            lead.budget = Some(budget);
        }
        if let Some(timeline) = &self.timeline {
            lead.timeline = Some(timeline.clone());
        }
        if let Some(motivation) = &self.motivation {
            lead.motivation = Some(motivation.clone());
        }
        if let Some(status) = self.lender_status {
            lead.lender_status = status;
        }
        if let Some(rate) = self.response_rate {
            lead.response_rate = Some(rate);
        }
        if let Some(score) = self.score {
            lead.score = Some(score);
        }
        if let Some(tier) = self.classification {
            lead.classification = Some(tier);
        }
        if let Some(card) = &self.explainability_card {
            lead.explainability_card = Some(card.clone());
        }
        if let Some(scored_at) = self.last_scored_at {
            lead.last_scored_at = Some(scored_at);
        }
        if let Some(contact) = self.last_contact_date {
            lead.last_contact_date = Some(contact);
        }
        if let Some(next_action) = self.next_action_date {
            lead.next_action_date = Some(next_action);
        }
        if let Some(lifecycle) = self.lifecycle {
            lead.lifecycle = lifecycle;
        }
        lead.version += 1;
        lead.updated_at = now;
    }

    /// Snapshot the lead would present after applying this mask, used to
    /// detect watched-attribute changes before rescoring.
    pub fn projected_snapshot(&self, lead: &Lead) -> LeadSnapshot {
        LeadSnapshot {
            budget: self.budget.or(lead.budget),
            timeline: self.timeline.clone().or_else(|| lead.timeline.clone()),
            motivation: self.motivation.clone().or_else(|| lead.motivation.clone()),
            lender_status: self.lender_status.unwrap_or(lead.lender_status),
            last_contact_date: self.last_contact_date.or(lead.last_contact_date),
            response_rate: self.response_rate.or(lead.response_rate),
        }
    }
}

/// Result of a conditional update keyed on the lead's stored version.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    Applied(Lead),
    VersionConflict,
}

/// Error enumeration for document-store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage abstraction over the lead pool and its audit collections. The
/// scoring and cadence workflows hold no ambient store references; every
/// component receives this capability explicitly.
pub trait LeadStore: Send + Sync {
    fn insert_lead(&self, lead: Lead) -> Result<Lead, StoreError>;
    fn fetch_lead(&self, id: &LeadId) -> Result<Option<Lead>, StoreError>;
    /// Duplicate lookup by normalized email or phone, used at intake.
    fn find_by_contact(&self, email: &str, phone: &str) -> Result<Option<Lead>, StoreError>;
    fn query_leads(&self, filter: &LeadFilter) -> Result<Vec<Lead>, StoreError>;
    /// Conditional update: applies `fields` only when the stored version
    /// matches `expected_version`. The cadence claim step relies on this
    /// being atomic with respect to other writers of the same lead.
    fn update_lead(
        &self,
        id: &LeadId,
        fields: LeadUpdate,
        expected_version: u64,
    ) -> Result<UpdateOutcome, StoreError>;
    fn append_compliance_event(&self, event: ComplianceEvent) -> Result<(), StoreError>;
    fn compliance_events(&self, lead_id: &LeadId) -> Result<Vec<ComplianceEvent>, StoreError>;
    fn append_outreach(&self, record: OutreachRecord) -> Result<(), StoreError>;
    fn outreach_since(
        &self,
        lead_id: &LeadId,
        since: DateTime<Utc>,
    ) -> Result<Vec<OutreachRecord>, StoreError>;
    fn outreach_for_lead(&self, lead_id: &LeadId) -> Result<Vec<OutreachRecord>, StoreError>;
    fn outreach_for_owner_since(
        &self,
        owner_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<OutreachRecord>, StoreError>;
}

/// Channel-agnostic message payload handed to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutreachMessage {
    pub subject: String,
    pub content: String,
}

/// Dispatch error. Delivery failures are recorded as `Failed` outreach by the
/// scheduler and never abort a batch.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("dispatch transport unavailable: {0}")]
    Transport(String),
    #[error("destination rejected: {0}")]
    Rejected(String),
}

/// Outbound delivery capability. Implementations wrap a concrete channel
/// technology; the cadence core only sees this contract.
#[async_trait]
pub trait MessageDispatcher: Send + Sync {
    async fn send(
        &self,
        channel: Channel,
        destination: &str,
        message: &OutreachMessage,
    ) -> Result<(), DispatchError>;
}
