use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use super::digest::DailyDigest;
use super::domain::{
    ComplianceEvent, ComplianceEventType, Lead, LeadId, LeadLifecycle, LeadSnapshot,
    LeadSubmission, LenderStatus, OutreachRecord, UserId,
};
use super::import::{self, ImportRejection, ImportSummary, LeadImportError};
use super::intake::{IntakeError, IntakeGuard};
use super::repository::{LeadFilter, LeadStore, LeadUpdate, StoreError, UpdateOutcome};
use super::scoring::{ScoringConfig, ScoringEngine, ScoringResult};

static LEAD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_lead_id() -> LeadId {
    let id = LEAD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    LeadId(format!("lead-{id:06}"))
}

const MAX_UPDATE_ATTEMPTS: usize = 3;

/// Attribute changes accepted from collaborators. Applying one acts as the
/// scoring trigger: the lead is rescored only when a watched attribute
/// actually changed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AttributePatch {
    #[serde(default)]
    pub budget: Option<u64>,
    #[serde(default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub motivation: Option<String>,
    #[serde(default)]
    pub lender_status: Option<LenderStatus>,
    #[serde(default)]
    pub last_contact_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub response_rate: Option<f64>,
    #[serde(default)]
    pub lifecycle: Option<LeadLifecycle>,
}

impl AttributePatch {
    fn into_update(self) -> LeadUpdate {
        LeadUpdate {
            budget: self.budget,
            timeline: self.timeline,
            motivation: self.motivation,
            lender_status: self.lender_status,
            last_contact_date: self.last_contact_date,
            response_rate: self.response_rate,
            lifecycle: self.lifecycle,
            ..LeadUpdate::default()
        }
    }
}

/// Result of admitting a submission through intake.
#[derive(Debug)]
pub enum IntakeOutcome {
    Admitted(Lead),
    Duplicate { existing: LeadId },
}

/// Error raised by the lead service.
#[derive(Debug, thiserror::Error)]
pub enum LeadServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Import(#[from] LeadImportError),
}

/// Service composing intake, deduplication, scoring, and compliance logging
/// behind the HTTP facade. The store is an injected capability; the service
/// holds no ambient references.
pub struct LeadService<S> {
    store: Arc<S>,
    guard: IntakeGuard,
    engine: ScoringEngine,
}

impl<S> LeadService<S>
where
    S: LeadStore + 'static,
{
    pub fn new(store: Arc<S>, scoring: ScoringConfig) -> Self {
        Self {
            store,
            guard: IntakeGuard,
            engine: ScoringEngine::new(scoring),
        }
    }

    /// Admit a submission: validate, normalize, dedupe, persist, log the
    /// intake compliance event, and run the initial scoring pass.
    pub fn intake(
        &self,
        submission: LeadSubmission,
        now: DateTime<Utc>,
    ) -> Result<IntakeOutcome, LeadServiceError> {
        let lead = self.guard.admit(submission, next_lead_id(), now)?;

        if let Some(existing) = self.store.find_by_contact(&lead.email, &lead.phone)? {
            info!(
                email = %lead.email,
                existing = %existing.id.0,
                "duplicate lead detected at intake"
            );
            return Ok(IntakeOutcome::Duplicate {
                existing: existing.id,
            });
        }

        let inserted = self.store.insert_lead(lead)?;
        self.store.append_compliance_event(ComplianceEvent {
            lead_id: inserted.id.clone(),
            event_type: ComplianceEventType::LeadIntake,
            detail: format!(
                "source={}, consent_given={}",
                inserted.source, inserted.consent_given
            ),
            recorded_at: now,
        })?;

        let result = self.engine.score(&inserted.snapshot(), now);
        let fields = LeadUpdate::from_scoring(&result, now);
        let scored = match self.store.update_lead(&inserted.id, fields, inserted.version)? {
            UpdateOutcome::Applied(updated) => updated,
            UpdateOutcome::VersionConflict => {
                warn!(lead_id = %inserted.id.0, "initial scoring lost a write race");
                inserted
            }
        };

        info!(
            lead_id = %scored.id.0,
            score = result.score,
            classification = result.classification.label(),
            "lead admitted and scored"
        );
        Ok(IntakeOutcome::Admitted(scored))
    }

    /// Bulk intake from a CSV export. One bad row is reported and skipped;
    /// it never aborts the batch.
    pub fn import_csv<R: Read>(
        &self,
        reader: R,
        owner_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<ImportSummary, LeadServiceError> {
        let submissions = import::parse_submissions(reader, owner_id)?;
        let mut summary = ImportSummary::default();

        for (index, submission) in submissions.into_iter().enumerate() {
            // Header occupies the first CSV line.
            let row = index + 2;
            match self.intake(submission, now) {
                Ok(IntakeOutcome::Admitted(_)) => summary.admitted += 1,
                Ok(IntakeOutcome::Duplicate { .. }) => summary.duplicates += 1,
                Err(err) => {
                    warn!(row, error = %err, "import row rejected");
                    summary.rejected.push(ImportRejection {
                        row,
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(summary)
    }

    /// Apply an attribute patch and rescore when a watched attribute
    /// (budget, timeline, motivation, lender status, last contact) changed.
    /// Returns the stored lead and the scoring result, `None` when the patch
    /// was a no-op for scoring purposes.
    pub fn update_attributes(
        &self,
        id: &LeadId,
        patch: AttributePatch,
        now: DateTime<Utc>,
    ) -> Result<(Lead, Option<ScoringResult>), LeadServiceError> {
        for _ in 0..MAX_UPDATE_ATTEMPTS {
            let lead = self.store.fetch_lead(id)?.ok_or(StoreError::NotFound)?;

            let mut fields = patch.clone().into_update();
            let before = lead.snapshot();
            let after = fields.projected_snapshot(&lead);
            let rescore = watched_changed(&before, &after);

            if !rescore && fields == LeadUpdate::default() {
                return Ok((lead, None));
            }

            let result = if rescore {
                let result = self.engine.score(&after, now);
                fields.score = Some(result.score);
                fields.classification = Some(result.classification);
                fields.explainability_card = Some(result.explainability_card.clone());
                fields.last_scored_at = Some(now);
                Some(result)
            } else {
                None
            };

            match self.store.update_lead(id, fields, lead.version)? {
                UpdateOutcome::Applied(updated) => {
                    if let Some(result) = &result {
                        info!(
                            lead_id = %updated.id.0,
                            score = result.score,
                            classification = result.classification.label(),
                            "lead rescored after attribute change"
                        );
                    }
                    return Ok((updated, result));
                }
                UpdateOutcome::VersionConflict => continue,
            }
        }

        Err(StoreError::Unavailable("lead update contention".to_string()).into())
    }

    /// Record an opt-out: append the compliance event, then retire the lead
    /// from the cadence by flipping its lifecycle.
    pub fn opt_out(
        &self,
        id: &LeadId,
        detail: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Lead, LeadServiceError> {
        let mut lead = self.store.fetch_lead(id)?.ok_or(StoreError::NotFound)?;

        // The event lands first so the guard chain sees it even if the
        // lifecycle write below races another update.
        self.store.append_compliance_event(ComplianceEvent {
            lead_id: id.clone(),
            event_type: ComplianceEventType::OptOut,
            detail: detail.into(),
            recorded_at: now,
        })?;

        for _ in 0..MAX_UPDATE_ATTEMPTS {
            let fields = LeadUpdate {
                lifecycle: Some(LeadLifecycle::OptedOut),
                ..LeadUpdate::default()
            };
            match self.store.update_lead(id, fields, lead.version)? {
                UpdateOutcome::Applied(updated) => {
                    info!(lead_id = %updated.id.0, "lead opted out of outreach");
                    return Ok(updated);
                }
                UpdateOutcome::VersionConflict => {
                    lead = self.store.fetch_lead(id)?.ok_or(StoreError::NotFound)?;
                }
            }
        }

        Err(StoreError::Unavailable("lead update contention".to_string()).into())
    }

    pub fn get(&self, id: &LeadId) -> Result<Lead, LeadServiceError> {
        Ok(self.store.fetch_lead(id)?.ok_or(StoreError::NotFound)?)
    }

    pub fn outreach_log(&self, id: &LeadId) -> Result<Vec<OutreachRecord>, LeadServiceError> {
        self.store.fetch_lead(id)?.ok_or(StoreError::NotFound)?;
        Ok(self.store.outreach_for_lead(id)?)
    }

    /// Assemble the per-realtor daily digest from live leads, recent
    /// outreach, and the month's closed deals.
    pub fn daily_digest(
        &self,
        owner_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<DailyDigest, LeadServiceError> {
        let mut live = Vec::new();
        for lifecycle in [LeadLifecycle::New, LeadLifecycle::Active] {
            let filter = LeadFilter {
                owner_id: Some(owner_id.clone()),
                lifecycle: Some(lifecycle),
                ..LeadFilter::default()
            };
            live.extend(self.store.query_leads(&filter)?);
        }

        let week_ago = now - Duration::days(7);
        let mut paired = Vec::with_capacity(live.len());
        for lead in live {
            let recent = self.store.outreach_since(&lead.id, week_ago)?.len();
            paired.push((lead, recent));
        }

        let month_ago = now - Duration::days(30);
        let messages_sent = self
            .store
            .outreach_for_owner_since(owner_id, month_ago)?
            .len();
        let closed = self.store.query_leads(&LeadFilter {
            owner_id: Some(owner_id.clone()),
            lifecycle: Some(LeadLifecycle::Closed),
            ..LeadFilter::default()
        })?;
        let deals_closed = closed
            .iter()
            .filter(|lead| lead.updated_at > month_ago)
            .count();

        Ok(DailyDigest::build(
            owner_id.clone(),
            &paired,
            messages_sent,
            deals_closed,
            now.date_naive(),
        ))
    }
}

fn watched_changed(before: &LeadSnapshot, after: &LeadSnapshot) -> bool {
    before.budget != after.budget
        || before.timeline != after.timeline
        || before.motivation != after.motivation
        || before.lender_status != after.lender_status
        || before.last_contact_date != after.last_contact_date
}
