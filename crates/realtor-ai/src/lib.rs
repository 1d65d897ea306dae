//! Agentic lead automation for realtors: a rules-based scoring engine with
//! explainability cards, plus a guarded follow-up cadence scheduler that
//! drafts messages for hot leads and dispatches the rest automatically.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
