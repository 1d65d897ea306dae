//! Integration scenarios for the lead scoring and follow-up cadence pipeline.
//!
//! Exercised end-to-end through the public service facades so intake,
//! scoring, guard checks, claims, and routing are validated together without
//! reaching into private modules.

mod common {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    use realtor_ai::workflows::leads::{
        CadenceConfig, Channel, ComplianceEvent, DispatchError, FollowUpService, Lead, LeadFilter,
        LeadId, LeadStore, LeadSubmission, LeadUpdate, LenderStatus, MarketContentProvider,
        MessageComposer, MessageDispatcher, OutreachMessage, OutreachRecord, ScoringConfig,
        StoreError, UpdateOutcome, UserId,
    };
    use realtor_ai::workflows::leads::service::LeadService;

    pub(crate) fn run_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 14, 8, 0, 0)
            .single()
            .expect("valid instant")
    }

    pub(crate) fn owner() -> UserId {
        UserId("realtor-7".to_string())
    }

    pub(crate) fn submission(email: &str, phone: &str) -> LeadSubmission {
        LeadSubmission {
            owner_id: owner(),
            first_name: "Riley".to_string(),
            last_name: "Chen".to_string(),
            email: email.to_string(),
            phone: Some(phone.to_string()),
            preferred_channel: None,
            budget: Some(600_000),
            timeline: Some("ASAP".to_string()),
            motivation: Some("relocating for work".to_string()),
            lender_status: Some(LenderStatus::PreApproved),
            source: Some("Chatbot".to_string()),
            consent_given: true,
        }
    }

    #[derive(Default)]
    pub(crate) struct MemoryLeadStore {
        leads: Mutex<HashMap<LeadId, Lead>>,
        outreach: Mutex<Vec<OutreachRecord>>,
        compliance: Mutex<Vec<ComplianceEvent>>,
    }

    impl MemoryLeadStore {
        pub(crate) fn outreach_records(&self) -> Vec<OutreachRecord> {
            self.outreach.lock().expect("lock").clone()
        }
    }

    impl LeadStore for MemoryLeadStore {
        fn insert_lead(&self, lead: Lead) -> Result<Lead, StoreError> {
            let mut guard = self.leads.lock().expect("lock");
            if guard.contains_key(&lead.id) {
                return Err(StoreError::Conflict);
            }
            guard.insert(lead.id.clone(), lead.clone());
            Ok(lead)
        }

        fn fetch_lead(&self, id: &LeadId) -> Result<Option<Lead>, StoreError> {
            Ok(self.leads.lock().expect("lock").get(id).cloned())
        }

        fn find_by_contact(&self, email: &str, phone: &str) -> Result<Option<Lead>, StoreError> {
            let guard = self.leads.lock().expect("lock");
            Ok(guard
                .values()
                .find(|lead| lead.email == email || (!phone.is_empty() && lead.phone == phone))
                .cloned())
        }

        fn query_leads(&self, filter: &LeadFilter) -> Result<Vec<Lead>, StoreError> {
            let guard = self.leads.lock().expect("lock");
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
            let mut guard = self.leads.lock().expect("lock");
            let lead = guard.get_mut(id).ok_or(StoreError::NotFound)?;
            if lead.version != expected_version {
                return Ok(UpdateOutcome::VersionConflict);
            }
            fields.apply_to(lead, Utc::now());
            Ok(UpdateOutcome::Applied(lead.clone()))
        }

        fn append_compliance_event(&self, event: ComplianceEvent) -> Result<(), StoreError> {
            self.compliance.lock().expect("lock").push(event);
            Ok(())
        }

        fn compliance_events(&self, lead_id: &LeadId) -> Result<Vec<ComplianceEvent>, StoreError> {
            Ok(self
                .compliance
                .lock()
                .expect("lock")
                .iter()
                .filter(|event| &event.lead_id == lead_id)
                .cloned()
                .collect())
        }

        fn append_outreach(&self, record: OutreachRecord) -> Result<(), StoreError> {
            self.outreach.lock().expect("lock").push(record);
            Ok(())
        }

        fn outreach_since(
            &self,
            lead_id: &LeadId,
            since: DateTime<Utc>,
        ) -> Result<Vec<OutreachRecord>, StoreError> {
            Ok(self
                .outreach
                .lock()
                .expect("lock")
                .iter()
                .filter(|record| &record.lead_id == lead_id && record.created_at > since)
                .cloned()
                .collect())
        }

        fn outreach_for_lead(&self, lead_id: &LeadId) -> Result<Vec<OutreachRecord>, StoreError> {
            Ok(self
                .outreach
                .lock()
                .expect("lock")
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
            Ok(self
                .outreach
                .lock()
                .expect("lock")
                .iter()
                .filter(|record| &record.owner_id == owner_id && record.created_at > since)
                .cloned()
                .collect())
        }
    }

    #[derive(Default)]
    pub(crate) struct CountingDispatcher {
        pub(crate) sent: Mutex<Vec<(Channel, String, OutreachMessage)>>,
    }

    #[async_trait]
    impl MessageDispatcher for CountingDispatcher {
        async fn send(
            &self,
            channel: Channel,
            destination: &str,
            message: &OutreachMessage,
        ) -> Result<(), DispatchError> {
            self.sent.lock().expect("lock").push((
                channel,
                destination.to_string(),
                message.clone(),
            ));
            Ok(())
        }
    }

    pub(crate) struct FixedContent;

    impl MarketContentProvider for FixedContent {
        fn market_trend(&self, _on: NaiveDate) -> String {
            "stable".to_string()
        }

        fn financing_tip(&self, _on: NaiveDate) -> String {
            "Lock in your rate early".to_string()
        }

        fn new_listings_count(&self, _on: NaiveDate) -> u32 {
            3
        }
    }

    pub(crate) fn build_pipeline() -> (
        Arc<MemoryLeadStore>,
        Arc<CountingDispatcher>,
        Arc<LeadService<MemoryLeadStore>>,
        Arc<FollowUpService<MemoryLeadStore, CountingDispatcher>>,
    ) {
        let store = Arc::new(MemoryLeadStore::default());
        let dispatcher = Arc::new(CountingDispatcher::default());
        let leads = Arc::new(LeadService::new(store.clone(), ScoringConfig::default()));
        let follow_up = Arc::new(FollowUpService::new(
            store.clone(),
            dispatcher.clone(),
            MessageComposer::new("Cizar"),
            Arc::new(FixedContent),
            CadenceConfig::default(),
        ));
        (store, dispatcher, leads, follow_up)
    }
}

mod scoring_pipeline {
    use super::common::*;
    use realtor_ai::workflows::leads::{AttributePatch, IntakeOutcome, OutreachStatus, Tier};

    #[tokio::test]
    async fn hot_lead_flows_from_intake_to_approval_draft() {
        let (store, dispatcher, leads, follow_up) = build_pipeline();
        let now = run_instant();

        let admitted = match leads
            .intake(submission("riley@example.com", "+15557000001"), now)
            .expect("intake succeeds")
        {
            IntakeOutcome::Admitted(lead) => lead,
            other => panic!("expected admission, got {other:?}"),
        };
        assert_eq!(admitted.classification, Some(Tier::Hot));
        assert!(admitted.score.unwrap_or(0) >= 80);

        // Activate the lead, then trigger the scheduler: a never-contacted
        // hot lead is infinitely stale and must land in the draft queue.
        let patch = AttributePatch {
            lifecycle: Some(realtor_ai::workflows::leads::LeadLifecycle::Active),
            ..AttributePatch::default()
        };
        leads
            .update_attributes(&admitted.id, patch, now)
            .expect("activation succeeds");

        let summary = follow_up.run_once(now).await;
        assert_eq!(summary.drafted, 1);
        assert_eq!(summary.sent, 0);
        assert!(dispatcher.sent.lock().expect("lock").is_empty());

        let records = store.outreach_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, OutreachStatus::Draft);
        assert!(records[0].requires_approval);
        assert_eq!(records[0].tier, Tier::Hot);
    }

    #[tokio::test]
    async fn attribute_change_rescores_before_the_next_run() {
        let (_, _, leads, _) = build_pipeline();
        let now = run_instant();

        let mut weak = submission("slow@example.com", "+15557000002");
        weak.budget = Some(120_000);
        weak.timeline = Some("sometime next year".to_string());
        weak.lender_status = None;
        weak.motivation = None;

        let admitted = match leads.intake(weak, now).expect("intake succeeds") {
            IntakeOutcome::Admitted(lead) => lead,
            other => panic!("expected admission, got {other:?}"),
        };
        assert_eq!(admitted.classification, Some(Tier::Nurture));

        let patch = AttributePatch {
            budget: Some(550_000),
            timeline: Some("within 30 days".to_string()),
            ..AttributePatch::default()
        };
        let (updated, result) = leads
            .update_attributes(&admitted.id, patch, now)
            .expect("update succeeds");
        let result = result.expect("watched change rescored");
        assert_eq!(updated.classification, Some(result.classification));
        assert_ne!(updated.classification, Some(Tier::Nurture));
    }
}

mod cadence_scenarios {
    use super::common::*;
    use realtor_ai::workflows::leads::{
        AttributePatch, IntakeOutcome, LeadLifecycle, OutreachStatus, Tier,
    };

    #[tokio::test]
    async fn stale_nurture_lead_gets_one_dispatched_message() {
        let (store, dispatcher, leads, follow_up) = build_pipeline();
        let now = run_instant();

        let mut cold = submission("cold@example.com", "+15557000003");
        cold.budget = Some(50_000);
        cold.timeline = Some("no rush at all".to_string());
        cold.lender_status = None;
        cold.motivation = None;

        let admitted = match leads.intake(cold, now).expect("intake succeeds") {
            IntakeOutcome::Admitted(lead) => lead,
            other => panic!("expected admission, got {other:?}"),
        };
        assert_eq!(admitted.classification, Some(Tier::Nurture));

        leads
            .update_attributes(
                &admitted.id,
                AttributePatch {
                    lifecycle: Some(LeadLifecycle::Active),
                    ..AttributePatch::default()
                },
                now,
            )
            .expect("activation succeeds");

        // Thirty days of staleness elapse with no outreach on file.
        let later = now + chrono::Duration::days(30);
        let summary = follow_up.run_once(later).await;

        assert_eq!(summary.sent, 1);
        assert_eq!(summary.drafted, 0);
        let records = store.outreach_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, OutreachStatus::Sent);
        assert!(!records[0].requires_approval);
        assert_eq!(dispatcher.sent.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn overlapping_runs_keep_exactly_one_record() {
        let (store, _, leads, follow_up) = build_pipeline();
        let now = run_instant();

        let admitted = match leads
            .intake(submission("contested@example.com", "+15557000004"), now)
            .expect("intake succeeds")
        {
            IntakeOutcome::Admitted(lead) => lead,
            other => panic!("expected admission, got {other:?}"),
        };
        leads
            .update_attributes(
                &admitted.id,
                AttributePatch {
                    lifecycle: Some(LeadLifecycle::Active),
                    ..AttributePatch::default()
                },
                now,
            )
            .expect("activation succeeds");

        let later = now + chrono::Duration::days(3);
        let (first, second) =
            futures::join!(follow_up.run_once(later), follow_up.run_once(later));

        assert_eq!(first.drafted + second.drafted, 1);
        assert_eq!(
            store
                .outreach_records()
                .iter()
                .filter(|record| record.lead_id == admitted.id)
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn opted_out_lead_is_never_contacted_again() {
        let (store, dispatcher, leads, follow_up) = build_pipeline();
        let now = run_instant();

        let admitted = match leads
            .intake(submission("done@example.com", "+15557000005"), now)
            .expect("intake succeeds")
        {
            IntakeOutcome::Admitted(lead) => lead,
            other => panic!("expected admission, got {other:?}"),
        };
        leads
            .update_attributes(
                &admitted.id,
                AttributePatch {
                    lifecycle: Some(LeadLifecycle::Active),
                    ..AttributePatch::default()
                },
                now,
            )
            .expect("activation succeeds");
        leads
            .opt_out(&admitted.id, "sms STOP", now)
            .expect("opt out succeeds");

        for days in [1, 10, 60] {
            let summary = follow_up.run_once(now + chrono::Duration::days(days)).await;
            assert_eq!(summary.drafted + summary.sent + summary.failed, 0);
        }
        assert!(store.outreach_records().is_empty());
        assert!(dispatcher.sent.lock().expect("lock").is_empty());
    }
}
