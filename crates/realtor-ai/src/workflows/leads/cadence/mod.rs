mod composer;
pub(crate) mod guards;

pub use composer::{MarketContentProvider, MessageComposer, RotatingMarketContent};
pub use guards::GuardVerdict;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::domain::{Direction, Lead, LeadLifecycle, OutreachRecord, OutreachStatus, Tier};
use super::repository::{
    LeadFilter, LeadStore, LeadUpdate, MessageDispatcher, StoreError, UpdateOutcome,
};

/// Tier recency thresholds and batch dials for the follow-up scheduler.
#[derive(Debug, Clone)]
pub struct CadenceConfig {
    pub hot_threshold: Duration,
    pub warm_threshold: Duration,
    pub nurture_threshold: Duration,
    /// Anti-spam window: any outbound record inside it vetoes contact.
    pub spam_window: Duration,
    /// Upper bound on a single dispatcher call; a hung transport downgrades
    /// to a `Failed` record instead of blocking the batch.
    pub dispatch_timeout: std::time::Duration,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            hot_threshold: Duration::days(2),
            warm_threshold: Duration::days(7),
            nurture_threshold: Duration::days(30),
            spam_window: Duration::hours(24),
            dispatch_timeout: std::time::Duration::from_secs(10),
        }
    }
}

impl CadenceConfig {
    pub fn threshold_for(&self, tier: Tier) -> Duration {
        match tier {
            Tier::Hot => self.hot_threshold,
            Tier::Warm => self.warm_threshold,
            Tier::Nurture => self.nurture_threshold,
        }
    }
}

/// Per-run accounting surfaced to the trigger caller and operator logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CadenceRunSummary {
    pub examined: usize,
    pub drafted: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped_opt_out: usize,
    pub skipped_recent_outreach: usize,
    pub skipped_claim_conflict: usize,
    pub errors: usize,
}

enum CandidateOutcome {
    Drafted,
    Sent,
    Failed,
    OptedOut,
    RecentOutreach,
    ClaimLost,
    Error,
}

/// The cadence scheduler. On each trigger it selects due candidates per
/// tier, runs the guard chain, claims each survivor with a conditional
/// update, and routes it into the draft-for-approval or automated-dispatch
/// path. Candidates are processed independently; one failure never aborts
/// the batch.
pub struct FollowUpService<S, D> {
    store: Arc<S>,
    dispatcher: Arc<D>,
    composer: MessageComposer,
    content: Arc<dyn MarketContentProvider>,
    config: CadenceConfig,
}

impl<S, D> FollowUpService<S, D>
where
    S: LeadStore + 'static,
    D: MessageDispatcher + 'static,
{
    pub fn new(
        store: Arc<S>,
        dispatcher: Arc<D>,
        composer: MessageComposer,
        content: Arc<dyn MarketContentProvider>,
        config: CadenceConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            composer,
            content,
            config,
        }
    }

    /// Trigger entry point. Always returns a summary; partial failures are
    /// logged and counted, never raised.
    pub async fn run_once(&self, now: DateTime<Utc>) -> CadenceRunSummary {
        let candidates = match self.collect_candidates(now) {
            Ok(candidates) => candidates,
            Err(err) => {
                error!(error = %err, "cadence run could not query candidates");
                return CadenceRunSummary {
                    errors: 1,
                    ..CadenceRunSummary::default()
                };
            }
        };

        let mut summary = CadenceRunSummary {
            examined: candidates.len(),
            ..CadenceRunSummary::default()
        };

        let outcomes = join_all(
            candidates
                .into_iter()
                .map(|(lead, tier)| self.process_candidate(lead, tier, now)),
        )
        .await;

        for outcome in outcomes {
            match outcome {
                CandidateOutcome::Drafted => summary.drafted += 1,
                CandidateOutcome::Sent => summary.sent += 1,
                CandidateOutcome::Failed => summary.failed += 1,
                CandidateOutcome::OptedOut => summary.skipped_opt_out += 1,
                CandidateOutcome::RecentOutreach => summary.skipped_recent_outreach += 1,
                CandidateOutcome::ClaimLost => summary.skipped_claim_conflict += 1,
                CandidateOutcome::Error => summary.errors += 1,
            }
        }

        info!(
            examined = summary.examined,
            drafted = summary.drafted,
            sent = summary.sent,
            failed = summary.failed,
            "follow-up run completed"
        );
        summary
    }

    fn collect_candidates(&self, now: DateTime<Utc>) -> Result<Vec<(Lead, Tier)>, StoreError> {
        let mut due = Vec::new();
        for tier in [Tier::Hot, Tier::Warm, Tier::Nurture] {
            let filter = LeadFilter {
                lifecycle: Some(LeadLifecycle::Active),
                classification: Some(tier),
                ..LeadFilter::default()
            };
            for lead in self.store.query_leads(&filter)? {
                if self.is_due(&lead, tier, now) {
                    due.push((lead, tier));
                }
            }
        }
        Ok(due)
    }

    /// A lead with no contact history is infinitely stale and always due.
    fn is_due(&self, lead: &Lead, tier: Tier, now: DateTime<Utc>) -> bool {
        match lead.last_contact_date {
            None => true,
            Some(contact) => now - contact >= self.config.threshold_for(tier),
        }
    }

    async fn process_candidate(&self, lead: Lead, tier: Tier, now: DateTime<Utc>) -> CandidateOutcome {
        match self.try_process(&lead, tier, now).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(lead_id = %lead.id.0, error = %err, "follow-up processing failed");
                CandidateOutcome::Error
            }
        }
    }

    async fn try_process(
        &self,
        lead: &Lead,
        tier: Tier,
        now: DateTime<Utc>,
    ) -> Result<CandidateOutcome, StoreError> {
        match guards::check(self.store.as_ref(), &lead.id, now, self.config.spam_window)? {
            GuardVerdict::OptedOut => {
                debug!(lead_id = %lead.id.0, "lead opted out, skipping follow-up");
                return Ok(CandidateOutcome::OptedOut);
            }
            GuardVerdict::RecentOutreach => {
                debug!(lead_id = %lead.id.0, "recent outreach on file, skipping to prevent spam");
                return Ok(CandidateOutcome::RecentOutreach);
            }
            GuardVerdict::Clear => {}
        }

        match tier {
            Tier::Hot => self.draft_for_approval(lead, now),
            Tier::Warm | Tier::Nurture => self.dispatch_automated(lead, tier, now).await,
        }
    }

    /// Hot path: claim the lead, then park a draft on the audit trail for a
    /// human to approve. No external dispatch happens here.
    fn draft_for_approval(
        &self,
        lead: &Lead,
        now: DateTime<Utc>,
    ) -> Result<CandidateOutcome, StoreError> {
        let claim = LeadUpdate {
            next_action_date: Some(now + self.config.hot_threshold),
            ..LeadUpdate::default()
        };
        match self.store.update_lead(&lead.id, claim, lead.version)? {
            UpdateOutcome::VersionConflict => return Ok(CandidateOutcome::ClaimLost),
            UpdateOutcome::Applied(_) => {}
        }

        let message = self
            .composer
            .compose(lead, Tier::Hot, self.content.as_ref(), now.date_naive());
        self.store.append_outreach(OutreachRecord {
            lead_id: lead.id.clone(),
            owner_id: lead.owner_id.clone(),
            channel: lead.contact_channel(),
            subject: message.subject,
            content: message.content,
            direction: Direction::Outbound,
            status: OutreachStatus::Draft,
            tier: Tier::Hot,
            requires_approval: true,
            created_at: now,
        })?;

        info!(lead_id = %lead.id.0, "draft created for hot lead");
        Ok(CandidateOutcome::Drafted)
    }

    /// Warm/Nurture path: claim, compose, dispatch under a bounded timeout,
    /// and record the outcome. A delivery failure is a normal cadence step:
    /// the recency fields advance identically either way.
    async fn dispatch_automated(
        &self,
        lead: &Lead,
        tier: Tier,
        now: DateTime<Utc>,
    ) -> Result<CandidateOutcome, StoreError> {
        let claim = LeadUpdate {
            last_contact_date: Some(now),
            next_action_date: Some(now + self.config.threshold_for(tier)),
            ..LeadUpdate::default()
        };
        match self.store.update_lead(&lead.id, claim, lead.version)? {
            UpdateOutcome::VersionConflict => return Ok(CandidateOutcome::ClaimLost),
            UpdateOutcome::Applied(_) => {}
        }

        let message = self
            .composer
            .compose(lead, tier, self.content.as_ref(), now.date_naive());
        let channel = lead.contact_channel();
        let destination = lead.destination_for(channel).to_string();

        let delivery = tokio::time::timeout(
            self.config.dispatch_timeout,
            self.dispatcher.send(channel, &destination, &message),
        )
        .await;

        let status = match delivery {
            Ok(Ok(())) => OutreachStatus::Sent,
            Ok(Err(err)) => {
                warn!(lead_id = %lead.id.0, error = %err, "dispatch failed");
                OutreachStatus::Failed
            }
            Err(_) => {
                warn!(lead_id = %lead.id.0, "dispatch timed out");
                OutreachStatus::Failed
            }
        };

        self.store.append_outreach(OutreachRecord {
            lead_id: lead.id.clone(),
            owner_id: lead.owner_id.clone(),
            channel,
            subject: message.subject,
            content: message.content,
            direction: Direction::Outbound,
            status,
            tier,
            requires_approval: false,
            created_at: now,
        })?;

        Ok(if status == OutreachStatus::Sent {
            info!(lead_id = %lead.id.0, tier = tier.label(), "automated follow-up sent");
            CandidateOutcome::Sent
        } else {
            CandidateOutcome::Failed
        })
    }
}
