use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::workflows::leads::cadence::{
    CadenceConfig, FollowUpService, MarketContentProvider, MessageComposer,
};
use crate::workflows::leads::domain::{
    Channel, ComplianceEvent, Lead, LeadId, LeadLifecycle, LeadSubmission, LenderStatus,
    OutreachRecord, Tier, UserId,
};
use crate::workflows::leads::repository::{
    DispatchError, LeadFilter, LeadStore, LeadUpdate, MessageDispatcher, OutreachMessage,
    StoreError, UpdateOutcome,
};
use crate::workflows::leads::scoring::ScoringConfig;
use crate::workflows::leads::service::LeadService;

/// Fixed instant used as "now" so cadence math is assertable.
pub(super) fn run_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).single().expect("valid instant")
}

pub(super) fn owner() -> UserId {
    UserId("realtor-1".to_string())
}

pub(super) fn submission(email: &str, phone: &str) -> LeadSubmission {
    LeadSubmission {
        owner_id: owner(),
        first_name: "Jordan".to_string(),
        last_name: "Avery".to_string(),
        email: email.to_string(),
        phone: Some(phone.to_string()),
        preferred_channel: None,
        budget: Some(420_000),
        timeline: Some("30 days".to_string()),
        motivation: Some("relocating for work".to_string()),
        lender_status: Some(LenderStatus::PreQualified),
        source: Some("Chatbot".to_string()),
        consent_given: true,
    }
}

/// Pre-classified active lead ready for the cadence scheduler.
pub(super) fn classified_lead(
    id: &str,
    tier: Tier,
    last_contact: Option<DateTime<Utc>>,
) -> Lead {
    let created = run_instant() - chrono::Duration::days(90);
    Lead {
        id: LeadId(id.to_string()),
        owner_id: owner(),
        first_name: "Jordan".to_string(),
        last_name: "Avery".to_string(),
        email: format!("{id}@example.com"),
        phone: "+15551234567".to_string(),
        preferred_channel: None,
        source: "Manual".to_string(),
        consent_given: true,
        budget: Some(450_000),
        timeline: Some("60 days".to_string()),
        motivation: None,
        lender_status: LenderStatus::PreQualified,
        last_contact_date: last_contact,
        response_rate: None,
        score: Some(70),
        classification: Some(tier),
        explainability_card: Some(format!(
            "{} because: High budget ($450,000). Score: 70/100",
            tier.label()
        )),
        last_scored_at: Some(created),
        next_action_date: None,
        lifecycle: LeadLifecycle::Active,
        version: 0,
        created_at: created,
        updated_at: created,
    }
}

#[derive(Default)]
pub(super) struct MemoryLeadStore {
    leads: Mutex<HashMap<LeadId, Lead>>,
    outreach: Mutex<Vec<OutreachRecord>>,
    compliance: Mutex<Vec<ComplianceEvent>>,
}

impl MemoryLeadStore {
    pub(super) fn seed(&self, lead: Lead) {
        self.leads
            .lock()
            .expect("lead store mutex poisoned")
            .insert(lead.id.clone(), lead);
    }

    pub(super) fn outreach_records(&self) -> Vec<OutreachRecord> {
        self.outreach
            .lock()
            .expect("outreach mutex poisoned")
            .clone()
    }

    pub(super) fn compliance_log(&self) -> Vec<ComplianceEvent> {
        self.compliance
            .lock()
            .expect("compliance mutex poisoned")
            .clone()
    }
}

impl LeadStore for MemoryLeadStore {
    fn insert_lead(&self, lead: Lead) -> Result<Lead, StoreError> {
        let mut guard = self.leads.lock().expect("lead store mutex poisoned");
        if guard.contains_key(&lead.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(lead.id.clone(), lead.clone());
        Ok(lead)
    }

    fn fetch_lead(&self, id: &LeadId) -> Result<Option<Lead>, StoreError> {
        let guard = self.leads.lock().expect("lead store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn find_by_contact(&self, email: &str, phone: &str) -> Result<Option<Lead>, StoreError> {
        let guard = self.leads.lock().expect("lead store mutex poisoned");
        Ok(guard
            .values()
            .find(|lead| lead.email == email || (!phone.is_empty() && lead.phone == phone))
            .cloned())
    }

    fn query_leads(&self, filter: &LeadFilter) -> Result<Vec<Lead>, StoreError> {
        let guard = self.leads.lock().expect("lead store mutex poisoned");
        Ok(guard
            .values()
            .filter(|lead| {
                filter
                    .owner_id
                    .as_ref()
                    .map_or(true, |owner| &lead.owner_id == owner)
                    && filter
                        .lifecycle
                        .map_or(true, |lifecycle| lead.lifecycle == lifecycle)
                    && filter
                        .classification
                        .map_or(true, |tier| lead.classification == Some(tier))
            })
            .cloned()
            .collect())
    }

    fn update_lead(
        &self,
        id: &LeadId,
        fields: LeadUpdate,
        expected_version: u64,
    ) -> Result<UpdateOutcome, StoreError> {
        let mut guard = self.leads.lock().expect("lead store mutex poisoned");
        let lead = guard.get_mut(id).ok_or(StoreError::NotFound)?;
        if lead.version != expected_version {
            return Ok(UpdateOutcome::VersionConflict);
        }
        fields.apply_to(lead, Utc::now());
        Ok(UpdateOutcome::Applied(lead.clone()))
    }

    fn append_compliance_event(&self, event: ComplianceEvent) -> Result<(), StoreError> {
        self.compliance
            .lock()
            .expect("compliance mutex poisoned")
            .push(event);
        Ok(())
    }

    fn compliance_events(&self, lead_id: &LeadId) -> Result<Vec<ComplianceEvent>, StoreError> {
        let guard = self.compliance.lock().expect("compliance mutex poisoned");
        Ok(guard
            .iter()
            .filter(|event| &event.lead_id == lead_id)
            .cloned()
            .collect())
    }

    fn append_outreach(&self, record: OutreachRecord) -> Result<(), StoreError> {
        self.outreach
            .lock()
            .expect("outreach mutex poisoned")
            .push(record);
        Ok(())
    }

    fn outreach_since(
        &self,
        lead_id: &LeadId,
        since: DateTime<Utc>,
    ) -> Result<Vec<OutreachRecord>, StoreError> {
        let guard = self.outreach.lock().expect("outreach mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| &record.lead_id == lead_id && record.created_at > since)
            .cloned()
            .collect())
    }

    fn outreach_for_lead(&self, lead_id: &LeadId) -> Result<Vec<OutreachRecord>, StoreError> {
        let guard = self.outreach.lock().expect("outreach mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| &record.lead_id == lead_id)
            .cloned()
            .collect())
    }

    fn outreach_for_owner_since(
        &self,
        owner_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<OutreachRecord>, StoreError> {
        let guard = self.outreach.lock().expect("outreach mutex poisoned");
        Ok(guard
            .iter()
            .filter(|record| &record.owner_id == owner_id && record.created_at > since)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) enum DispatchMode {
    Deliver,
    Fail,
    Stall(u64),
}

pub(super) struct RecordingDispatcher {
    sent: Mutex<Vec<(Channel, String, OutreachMessage)>>,
    mode: Mutex<DispatchMode>,
}

impl RecordingDispatcher {
    pub(super) fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            mode: Mutex::new(DispatchMode::Deliver),
        }
    }

    pub(super) fn set_mode(&self, mode: DispatchMode) {
        *self.mode.lock().expect("dispatcher mutex poisoned") = mode;
    }

    pub(super) fn sent(&self) -> Vec<(Channel, String, OutreachMessage)> {
        self.sent.lock().expect("dispatcher mutex poisoned").clone()
    }
}

#[async_trait]
impl MessageDispatcher for RecordingDispatcher {
    async fn send(
        &self,
        channel: Channel,
        destination: &str,
        message: &OutreachMessage,
    ) -> Result<(), DispatchError> {
        let mode = *self.mode.lock().expect("dispatcher mutex poisoned");
        match mode {
            DispatchMode::Deliver => {
                self.sent.lock().expect("dispatcher mutex poisoned").push((
                    channel,
                    destination.to_string(),
                    message.clone(),
                ));
                Ok(())
            }
            DispatchMode::Fail => Err(DispatchError::Transport("simulated outage".to_string())),
            DispatchMode::Stall(millis) => {
                tokio::time::sleep(std::time::Duration::from_millis(millis)).await;
                Ok(())
            }
        }
    }
}

pub(super) struct FixedMarketContent;

impl MarketContentProvider for FixedMarketContent {
    fn market_trend(&self, _on: NaiveDate) -> String {
        "stable".to_string()
    }

    fn financing_tip(&self, _on: NaiveDate) -> String {
        "Lock in your rate early".to_string()
    }

    fn new_listings_count(&self, _on: NaiveDate) -> u32 {
        4
    }
}

pub(super) struct Stack {
    pub(super) store: Arc<MemoryLeadStore>,
    pub(super) dispatcher: Arc<RecordingDispatcher>,
    pub(super) leads: Arc<LeadService<MemoryLeadStore>>,
    pub(super) follow_up: Arc<FollowUpService<MemoryLeadStore, RecordingDispatcher>>,
}

pub(super) fn build_stack() -> Stack {
    build_stack_with(CadenceConfig::default())
}

pub(super) fn build_stack_with(config: CadenceConfig) -> Stack {
    let store = Arc::new(MemoryLeadStore::default());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let leads = Arc::new(LeadService::new(store.clone(), ScoringConfig::default()));
    let follow_up = Arc::new(FollowUpService::new(
        store.clone(),
        dispatcher.clone(),
        MessageComposer::new("Cizar"),
        Arc::new(FixedMarketContent),
        config,
    ));
    Stack {
        store,
        dispatcher,
        leads,
        follow_up,
    }
}
