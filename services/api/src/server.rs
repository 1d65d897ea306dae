use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryLeadStore, SimulatedDispatcher};
use crate::routes::with_lead_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use realtor_ai::config::AppConfig;
use realtor_ai::error::AppError;
use realtor_ai::telemetry;
use realtor_ai::workflows::leads::{
    CadenceConfig, FollowUpService, LeadService, MessageComposer, RotatingMarketContent,
    ScoringConfig,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryLeadStore::default());
    let dispatcher = Arc::new(SimulatedDispatcher);
    let lead_service = Arc::new(LeadService::new(store.clone(), ScoringConfig::default()));
    let follow_up_service = Arc::new(FollowUpService::new(
        store,
        dispatcher,
        MessageComposer::new(config.cadence.agent_name.clone()),
        Arc::new(RotatingMarketContent),
        CadenceConfig::default(),
    ));

    let _cadence_loop = spawn_cadence_loop(follow_up_service.clone(), config.cadence.interval_secs);

    let app = with_lead_routes(lead_service, follow_up_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "lead automation orchestrator ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Recurring trigger: fires the follow-up scheduler on the configured
/// interval. The first tick runs immediately, then every `interval_secs`.
/// A run never errors, so the loop never exits.
fn spawn_cadence_loop(
    follow_up: Arc<FollowUpService<InMemoryLeadStore, SimulatedDispatcher>>,
    interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs, "follow-up cadence loop started");
        let mut tick = tokio::time::interval(Duration::from_secs(interval_secs));

        loop {
            tick.tick().await;
            let summary = follow_up.run_once(Utc::now()).await;
            info!(
                examined = summary.examined,
                drafted = summary.drafted,
                sent = summary.sent,
                failed = summary.failed,
                errors = summary.errors,
                "scheduled follow-up run finished"
            );
        }
    })
}
