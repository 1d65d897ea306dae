use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::cadence::FollowUpService;
use super::domain::{LeadId, LeadSubmission, UserId};
use super::repository::{LeadStore, MessageDispatcher, StoreError};
use super::service::{AttributePatch, IntakeOutcome, LeadService, LeadServiceError};

/// Shared handler state: the lead service plus the follow-up scheduler so
/// the trigger endpoint can run a batch on demand.
pub struct LeadRouterState<S, D> {
    pub(crate) leads: Arc<LeadService<S>>,
    pub(crate) follow_up: Arc<FollowUpService<S, D>>,
}

impl<S, D> Clone for LeadRouterState<S, D> {
    fn clone(&self) -> Self {
        Self {
            leads: Arc::clone(&self.leads),
            follow_up: Arc::clone(&self.follow_up),
        }
    }
}

/// Router builder exposing the lead workflow endpoints.
pub fn lead_router<S, D>(
    leads: Arc<LeadService<S>>,
    follow_up: Arc<FollowUpService<S, D>>,
) -> Router
where
    S: LeadStore + 'static,
    D: MessageDispatcher + 'static,
{
    Router::new()
        .route("/api/v1/leads", post(intake_handler::<S, D>))
        .route(
            "/api/v1/leads/:lead_id",
            get(status_handler::<S, D>).patch(update_handler::<S, D>),
        )
        .route(
            "/api/v1/leads/:lead_id/outreach",
            get(outreach_log_handler::<S, D>),
        )
        .route(
            "/api/v1/leads/:lead_id/opt-out",
            post(opt_out_handler::<S, D>),
        )
        .route(
            "/api/v1/users/:user_id/leads/import",
            post(import_handler::<S, D>),
        )
        .route("/api/v1/users/:user_id/digest", get(digest_handler::<S, D>))
        .route("/api/v1/cadence/run", post(cadence_run_handler::<S, D>))
        .with_state(LeadRouterState { leads, follow_up })
}

pub(crate) async fn intake_handler<S, D>(
    State(state): State<LeadRouterState<S, D>>,
    axum::Json(submission): axum::Json<LeadSubmission>,
) -> Response
where
    S: LeadStore + 'static,
    D: MessageDispatcher + 'static,
{
    match state.leads.intake(submission, Utc::now()) {
        Ok(IntakeOutcome::Admitted(lead)) => {
            (StatusCode::ACCEPTED, axum::Json(lead.status_view())).into_response()
        }
        Ok(IntakeOutcome::Duplicate { existing }) => {
            let payload = json!({
                "error": "duplicate lead",
                "existing_lead_id": existing.0,
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<S, D>(
    State(state): State<LeadRouterState<S, D>>,
    Path(lead_id): Path<String>,
) -> Response
where
    S: LeadStore + 'static,
    D: MessageDispatcher + 'static,
{
    match state.leads.get(&LeadId(lead_id)) {
        Ok(lead) => (StatusCode::OK, axum::Json(lead.status_view())).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_handler<S, D>(
    State(state): State<LeadRouterState<S, D>>,
    Path(lead_id): Path<String>,
    axum::Json(patch): axum::Json<AttributePatch>,
) -> Response
where
    S: LeadStore + 'static,
    D: MessageDispatcher + 'static,
{
    match state
        .leads
        .update_attributes(&LeadId(lead_id), patch, Utc::now())
    {
        Ok((lead, result)) => {
            let payload = json!({
                "rescored": result.is_some(),
                "lead": lead.status_view(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn outreach_log_handler<S, D>(
    State(state): State<LeadRouterState<S, D>>,
    Path(lead_id): Path<String>,
) -> Response
where
    S: LeadStore + 'static,
    D: MessageDispatcher + 'static,
{
    match state.leads.outreach_log(&LeadId(lead_id)) {
        Ok(records) => (StatusCode::OK, axum::Json(records)).into_response(),
        Err(err) => error_response(err),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct OptOutRequest {
    #[serde(default)]
    reason: Option<String>,
}

pub(crate) async fn opt_out_handler<S, D>(
    State(state): State<LeadRouterState<S, D>>,
    Path(lead_id): Path<String>,
    body: Option<axum::Json<OptOutRequest>>,
) -> Response
where
    S: LeadStore + 'static,
    D: MessageDispatcher + 'static,
{
    let reason = body
        .and_then(|axum::Json(request)| request.reason)
        .unwrap_or_else(|| "requested by lead".to_string());
    match state.leads.opt_out(&LeadId(lead_id), reason, Utc::now()) {
        Ok(lead) => {
            let payload = json!({
                "lead_id": lead.id.0,
                "lifecycle": lead.lifecycle.label(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn import_handler<S, D>(
    State(state): State<LeadRouterState<S, D>>,
    Path(user_id): Path<String>,
    body: String,
) -> Response
where
    S: LeadStore + 'static,
    D: MessageDispatcher + 'static,
{
    match state
        .leads
        .import_csv(Cursor::new(body.into_bytes()), &UserId(user_id), Utc::now())
    {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn digest_handler<S, D>(
    State(state): State<LeadRouterState<S, D>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: LeadStore + 'static,
    D: MessageDispatcher + 'static,
{
    match state.leads.daily_digest(&UserId(user_id), Utc::now()) {
        Ok(digest) => (StatusCode::OK, axum::Json(digest)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn cadence_run_handler<S, D>(
    State(state): State<LeadRouterState<S, D>>,
) -> Response
where
    S: LeadStore + 'static,
    D: MessageDispatcher + 'static,
{
    let summary = state.follow_up.run_once(Utc::now()).await;
    (StatusCode::OK, axum::Json(summary)).into_response()
}

fn error_response(err: LeadServiceError) -> Response {
    let status = match &err {
        LeadServiceError::Intake(_) | LeadServiceError::Import(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        LeadServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        LeadServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
