use std::io::Read;

use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{Channel, LeadSubmission, LenderStatus, UserId};

/// Error raised while parsing a CSV lead export.
#[derive(Debug, thiserror::Error)]
pub enum LeadImportError {
    #[error("failed to read lead export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid lead CSV data: {0}")]
    Csv(#[from] csv::Error),
}

/// Per-run accounting for a bulk import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub admitted: usize,
    pub duplicates: usize,
    pub rejected: Vec<ImportRejection>,
}

/// A row the importer could not admit, reported without aborting the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportRejection {
    pub row: usize,
    pub reason: String,
}

/// Parses a headered CSV export into intake submissions for the given owner.
/// Shape errors fail the parse; per-row validation happens downstream in the
/// intake guard so one bad row never sinks the batch.
pub fn parse_submissions<R: Read>(
    reader: R,
    owner_id: &UserId,
) -> Result<Vec<LeadSubmission>, LeadImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut submissions = Vec::new();

    for record in csv_reader.deserialize::<LeadRow>() {
        let row = record?;
        submissions.push(row.into_submission(owner_id.clone()));
    }

    Ok(submissions)
}

#[derive(Debug, Deserialize)]
struct LeadRow {
    #[serde(rename = "First Name", default)]
    first_name: String,
    #[serde(rename = "Last Name", default)]
    last_name: String,
    #[serde(rename = "Email", default)]
    email: String,
    #[serde(rename = "Phone", default, deserialize_with = "empty_string_as_none")]
    phone: Option<String>,
    #[serde(rename = "Budget", default, deserialize_with = "empty_string_as_none")]
    budget: Option<String>,
    #[serde(rename = "Timeline", default, deserialize_with = "empty_string_as_none")]
    timeline: Option<String>,
    #[serde(
        rename = "Motivation",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    motivation: Option<String>,
    #[serde(
        rename = "Lender Status",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    lender_status: Option<String>,
    #[serde(rename = "Source", default, deserialize_with = "empty_string_as_none")]
    source: Option<String>,
    #[serde(
        rename = "Preferred Channel",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    preferred_channel: Option<String>,
}

impl LeadRow {
    fn into_submission(self, owner_id: UserId) -> LeadSubmission {
        LeadSubmission {
            owner_id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            preferred_channel: self.preferred_channel.as_deref().and_then(parse_channel),
            budget: self.budget.as_deref().and_then(parse_budget),
            timeline: self.timeline,
            motivation: self.motivation,
            lender_status: self.lender_status.as_deref().map(parse_lender_status),
            source: self.source.or_else(|| Some("Import".to_string())),
            consent_given: false,
        }
    }
}

fn parse_budget(raw: &str) -> Option<u64> {
    let cleaned: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.')
        .collect();
    let amount = cleaned.parse::<f64>().ok()?;
    if amount.is_sign_negative() {
        return None;
    }
    Some(amount.round() as u64)
}

fn parse_lender_status(raw: &str) -> LenderStatus {
    match raw.trim().to_lowercase().as_str() {
        "pre-approved" | "preapproved" => LenderStatus::PreApproved,
        "pre-qualified" | "prequalified" => LenderStatus::PreQualified,
        "application submitted" => LenderStatus::ApplicationSubmitted,
        "not applied" => LenderStatus::NotApplied,
        _ => LenderStatus::Unknown,
    }
}

fn parse_channel(raw: &str) -> Option<Channel> {
    match raw.trim().to_lowercase().as_str() {
        "whatsapp" => Some(Channel::WhatsApp),
        "email" => Some(Channel::Email),
        _ => None,
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
