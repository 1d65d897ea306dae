use chrono::{DateTime, Duration, Utc};

use super::super::domain::{ComplianceEventType, Direction, LeadId};
use super::super::repository::{LeadStore, StoreError};

/// Outcome of the pre-contact guard chain. A veto is a normal skip, not an
/// error: nothing is mutated and nothing is logged to the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardVerdict {
    Clear,
    OptedOut,
    RecentOutreach,
}

/// Evaluates the guard chain in fixed order: the opt-out compliance guard
/// first, then the anti-spam recent-outreach guard. Both must pass before any
/// contact action.
pub(crate) fn check<S: LeadStore + ?Sized>(
    store: &S,
    lead_id: &LeadId,
    now: DateTime<Utc>,
    spam_window: Duration,
) -> Result<GuardVerdict, StoreError> {
    let events = store.compliance_events(lead_id)?;
    if events
        .iter()
        .any(|event| event.event_type == ComplianceEventType::OptOut)
    {
        return Ok(GuardVerdict::OptedOut);
    }

    let recent = store.outreach_since(lead_id, now - spam_window)?;
    if recent
        .iter()
        .any(|record| record.direction == Direction::Outbound)
    {
        return Ok(GuardVerdict::RecentOutreach);
    }

    Ok(GuardVerdict::Clear)
}
