use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::Args;
use realtor_ai::error::AppError;
use realtor_ai::workflows::leads::{
    AttributePatch, CadenceConfig, FollowUpService, IntakeOutcome, LeadLifecycle, LeadService,
    LeadSubmission, LenderStatus, MessageComposer, RotatingMarketContent, ScoringConfig, UserId,
};

use crate::infra::{InMemoryLeadStore, SimulatedDispatcher};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Optional CSV export of leads to import instead of the built-in samples
    #[arg(long)]
    pub(crate) leads_csv: Option<PathBuf>,
}

/// End-to-end walkthrough on an in-memory stack: intake, scoring, one
/// cadence pass, and the daily digest.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let store = Arc::new(InMemoryLeadStore::default());
    let dispatcher = Arc::new(SimulatedDispatcher);
    let leads = LeadService::new(store.clone(), ScoringConfig::default());
    let follow_up = FollowUpService::new(
        store,
        dispatcher,
        MessageComposer::new("Cizar"),
        Arc::new(RotatingMarketContent),
        CadenceConfig::default(),
    );

    let owner = UserId("demo-realtor".to_string());
    let now = Utc::now();

    println!("Lead automation demo");
    println!("====================");

    let mut admitted = Vec::new();
    if let Some(path) = args.leads_csv {
        let file = std::fs::File::open(path)?;
        let summary = leads.import_csv(file, &owner, now)?;
        println!(
            "Imported {} lead(s), {} duplicate(s), {} rejected row(s)",
            summary.admitted,
            summary.duplicates,
            summary.rejected.len()
        );
    } else {
        for submission in sample_submissions(&owner) {
            match leads.intake(submission, now)? {
                IntakeOutcome::Admitted(lead) => {
                    println!(
                        "Admitted {}: {} ({})",
                        lead.display_name(),
                        lead.score.unwrap_or(0),
                        lead.classification.map(|tier| tier.label()).unwrap_or("-"),
                    );
                    admitted.push(lead.id);
                }
                IntakeOutcome::Duplicate { existing } => {
                    println!("Skipped duplicate of {}", existing.0);
                }
            }
        }
    }

    // Activate everything so the scheduler will consider it.
    let activation = AttributePatch {
        lifecycle: Some(LeadLifecycle::Active),
        ..AttributePatch::default()
    };
    for id in &admitted {
        leads.update_attributes(id, activation.clone(), now)?;
    }

    println!("\nRunning one follow-up cadence pass...");
    let summary = follow_up.run_once(now).await;
    println!(
        "examined={} drafted={} sent={} failed={} skipped(opt-out={}, recent={}, claim={})",
        summary.examined,
        summary.drafted,
        summary.sent,
        summary.failed,
        summary.skipped_opt_out,
        summary.skipped_recent_outreach,
        summary.skipped_claim_conflict,
    );

    let digest = leads.daily_digest(&owner, now)?;
    println!("\n{}", digest.content);

    Ok(())
}

fn sample_submissions(owner: &UserId) -> Vec<LeadSubmission> {
    let base = LeadSubmission {
        owner_id: owner.clone(),
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
        phone: None,
        preferred_channel: None,
        budget: None,
        timeline: None,
        motivation: None,
        lender_status: None,
        source: Some("Demo".to_string()),
        consent_given: true,
    };

    vec![
        LeadSubmission {
            first_name: "Priya".to_string(),
            last_name: "Nair".to_string(),
            email: "priya@example.com".to_string(),
            phone: Some("+15550100001".to_string()),
            budget: Some(625_000),
            timeline: Some("ASAP".to_string()),
            motivation: Some("relocating for a job transfer".to_string()),
            lender_status: Some(LenderStatus::PreApproved),
            ..base.clone()
        },
        LeadSubmission {
            first_name: "Marcus".to_string(),
            last_name: "Webb".to_string(),
            email: "marcus@example.com".to_string(),
            phone: Some("+15550100002".to_string()),
            budget: Some(340_000),
            timeline: Some("within 60 days".to_string()),
            motivation: Some("growing family".to_string()),
            lender_status: Some(LenderStatus::PreQualified),
            ..base.clone()
        },
        LeadSubmission {
            first_name: "Dana".to_string(),
            last_name: "Ortiz".to_string(),
            email: "dana@example.com".to_string(),
            phone: Some("+15550100003".to_string()),
            budget: Some(90_000),
            timeline: Some("sometime next year".to_string()),
            motivation: Some("just looking for now".to_string()),
            lender_status: Some(LenderStatus::NotApplied),
            ..base
        },
    ]
}
