use crate::cli::ServeArgs;
use crate::infra::{draft_service, file_store, AppState};
use crate::routes::with_review_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use insight_desk::config::AppConfig;
use insight_desk::error::AppError;
use insight_desk::workflows::editorial::drafts::ReviewState;
use insight_desk::workflows::editorial::DisabledNotifier;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) fn run(mut config: AppConfig, mut args: ServeArgs) -> Result<(), AppError> {
    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(config))
}

async fn serve(config: AppConfig) -> Result<(), AppError> {
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    // Handlers run on the async runtime, so the blocking e-mail client stays out of the
    // server; `insight-desk notify <slug>` sends from the command line.
    let store = file_store(&config);
    let service = draft_service(&config, store.clone(), Arc::new(DisabledNotifier));
    let review_state = ReviewState {
        service: Arc::new(service),
        articles: store,
    };

    let app = with_review_routes(review_state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "insight desk review service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
