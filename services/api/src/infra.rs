use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use realtor_ai::workflows::leads::{
    Channel, ComplianceEvent, DispatchError, Lead, LeadFilter, LeadId, LeadStore, LeadUpdate,
    MessageDispatcher, OutreachMessage, OutreachRecord, StoreError, UpdateOutcome, UserId,
};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Document-store adapter backing local runs and demos. A deployment swaps
/// this for a real database client behind the same `LeadStore` contract.
#[derive(Default)]
pub(crate) struct InMemoryLeadStore {
    leads: Mutex<HashMap<LeadId, Lead>>,
    outreach: Mutex<Vec<OutreachRecord>>,
    compliance: Mutex<Vec<ComplianceEvent>>,
}

impl LeadStore for InMemoryLeadStore {
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
        // An empty phone never matches: not every lead has one on file.
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

/// Stand-in transport: logs the delivery instead of calling a real WhatsApp
/// or email provider. The cadence core never learns the difference.
#[derive(Default, Clone)]
pub(crate) struct SimulatedDispatcher;

#[async_trait]
impl MessageDispatcher for SimulatedDispatcher {
    async fn send(
        &self,
        channel: Channel,
        destination: &str,
        message: &OutreachMessage,
    ) -> Result<(), DispatchError> {
        info!(
            channel = channel.label(),
            destination,
            subject = %message.subject,
            "simulated dispatch"
        );
        Ok(())
    }
}
