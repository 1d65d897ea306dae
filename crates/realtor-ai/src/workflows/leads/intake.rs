use chrono::{DateTime, Utc};

use super::domain::{Lead, LeadId, LeadLifecycle, LeadSubmission, LenderStatus};

/// Validation errors raised while admitting a lead submission.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid email format: {0}")]
    InvalidEmail(String),
    #[error("invalid phone format: {0}")]
    InvalidPhone(String),
}

const DEFAULT_SOURCE: &str = "Manual";

/// Guard that validates mandatory fields and normalizes a submission into a
/// storable lead. Duplicate detection happens at the service layer, where the
/// store capability is available.
#[derive(Debug, Default, Clone)]
pub struct IntakeGuard;

impl IntakeGuard {
    /// Admit a submission, producing a `New` lead ready for its first scoring
    /// pass.
    pub fn admit(
        &self,
        submission: LeadSubmission,
        id: LeadId,
        now: DateTime<Utc>,
    ) -> Result<Lead, IntakeError> {
        let first_name = required(&submission.first_name, "firstName")?;
        let last_name = required(&submission.last_name, "lastName")?;
        let email = required(&submission.email, "email")?.to_lowercase();
        if !valid_email(&email) {
            return Err(IntakeError::InvalidEmail(email));
        }

        let budget = match submission.budget {
            Some(amount) if amount > 0 => amount,
            _ => return Err(IntakeError::MissingField("budget")),
        };
        let timeline = submission
            .timeline
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(IntakeError::MissingField("timeline"))?
            .to_string();

        let phone = normalize_phone(submission.phone.as_deref());
        if !phone.is_empty() && !valid_phone(&phone) {
            return Err(IntakeError::InvalidPhone(phone));
        }

        let motivation = submission
            .motivation
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let source = submission
            .source
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_SOURCE)
            .to_string();

        Ok(Lead {
            id,
            owner_id: submission.owner_id,
            first_name,
            last_name,
            email,
            phone,
            preferred_channel: submission.preferred_channel,
            source,
            consent_given: submission.consent_given,
            budget: Some(budget),
            timeline: Some(timeline),
            motivation,
            lender_status: submission.lender_status.unwrap_or(LenderStatus::Unknown),
            last_contact_date: None,
            response_rate: None,
            score: None,
            classification: None,
            explainability_card: None,
            last_scored_at: None,
            next_action_date: None,
            lifecycle: LeadLifecycle::New,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, IntakeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IntakeError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

fn valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        _ => false,
    }
}

/// Strips spacing and punctuation so phone numbers dedupe consistently.
fn normalize_phone(phone: Option<&str>) -> String {
    phone
        .unwrap_or_default()
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '-' | '(' | ')'))
        .collect()
}

fn valid_phone(normalized: &str) -> bool {
    let digits = normalized.strip_prefix('+').unwrap_or(normalized);
    if digits.is_empty() || digits.len() > 16 {
        return false;
    }
    if !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return false;
    }
    !digits.starts_with('0')
}
