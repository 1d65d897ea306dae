//! Lead intake, scoring, and follow-up cadence workflows.
//!
//! Components receive their storage and delivery capabilities explicitly:
//! the scoring engine is a pure function over a lead snapshot, and the
//! cadence scheduler only sees the `LeadStore` and `MessageDispatcher`
//! contracts, so the whole pipeline can be exercised in isolation.

pub mod cadence;
pub mod digest;
pub mod domain;
pub mod import;
pub mod intake;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use cadence::{
    CadenceConfig, CadenceRunSummary, FollowUpService, GuardVerdict, MarketContentProvider,
    MessageComposer, RotatingMarketContent,
};
pub use digest::{DailyDigest, DigestEntry, RoiMetrics};
pub use domain::{
    format_currency, Channel, ComplianceEvent, ComplianceEventType, Direction, Lead, LeadId,
    LeadLifecycle, LeadSnapshot, LeadStatusView, LeadSubmission, LenderStatus, OutreachRecord,
    OutreachStatus, Tier, UserId,
};
pub use import::{ImportRejection, ImportSummary, LeadImportError};
pub use intake::{IntakeError, IntakeGuard};
pub use repository::{
    DispatchError, LeadFilter, LeadStore, LeadUpdate, MessageDispatcher, OutreachMessage,
    StoreError, UpdateOutcome,
};
pub use router::lead_router;
pub use scoring::{ScoringConfig, ScoringEngine, ScoringResult, SubScores};
pub use service::{AttributePatch, IntakeOutcome, LeadService, LeadServiceError};
