use crate::cli::ServeArgs;
use crate::demo::seed_workspace;
use crate::infra::{build_service, AppState};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use team_pulse::config::AppConfig;
use team_pulse::error::AppError;
use team_pulse::telemetry;
use team_pulse::workflows::import::WorkspaceImporter;
use team_pulse::workflows::performance::{ReportError, ReportWeek};
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

    let settings = config.reports.report_settings();
    let workspace = match args.tasks_csv.take() {
        Some(tasks_csv) => {
            info!(path = %tasks_csv.display(), "serving imported workspace");
            WorkspaceImporter::from_paths(tasks_csv, args.goals_csv.take())?
        }
        None => {
            let today = Local::now().date_naive();
            let week = ReportWeek::containing(today, settings.week_start)
                .ok_or(ReportError::WeekOutOfRange(today))?;
            info!(%week, "serving seeded demo workspace");
            seed_workspace(week)
        }
    };
    let service = build_service(Arc::new(workspace), settings);
    service.initialize_defaults("system");

    let app = with_operational_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "team pulse report service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
