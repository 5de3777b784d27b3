use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use insight_desk::config::AppConfig;
use insight_desk::workflows::editorial::notify::{
    Delivery, NotifyError, ReviewNotice, ReviewNotifier,
};
use insight_desk::workflows::editorial::{
    DisabledNotifier, DraftService, FileStore, GateEvaluator, PublishPipeline, ResendNotifier,
    ReviewLinks,
};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Resend when an API key is configured, otherwise a logged no-op.
#[derive(Debug)]
pub(crate) enum ConfiguredNotifier {
    Resend(ResendNotifier),
    Disabled(DisabledNotifier),
}

impl ConfiguredNotifier {
    pub(crate) fn from_config(config: &AppConfig) -> Result<Self, NotifyError> {
        match &config.review.resend_api_key {
            Some(api_key) => Ok(Self::Resend(ResendNotifier::new(
                api_key.as_str(),
                config.review.review_sender.as_str(),
                config.review.review_email.as_str(),
            )?)),
            None => Ok(Self::Disabled(DisabledNotifier)),
        }
    }
}

impl ReviewNotifier for ConfiguredNotifier {
    fn notify(&self, notice: &ReviewNotice) -> Result<Delivery, NotifyError> {
        match self {
            Self::Resend(notifier) => notifier.notify(notice),
            Self::Disabled(notifier) => notifier.notify(notice),
        }
    }
}

pub(crate) fn file_store(config: &AppConfig) -> Arc<FileStore> {
    Arc::new(FileStore::new(
        config.storage.drafts_dir.clone(),
        config.storage.published_dir.clone(),
        config.storage.registry_path.clone(),
    ))
}

pub(crate) fn gate(config: &AppConfig) -> GateEvaluator {
    GateEvaluator::new(config.scan_options())
}

pub(crate) fn draft_service<N>(
    config: &AppConfig,
    store: Arc<FileStore>,
    notifier: Arc<N>,
) -> DraftService<FileStore, N>
where
    N: ReviewNotifier + 'static,
{
    DraftService::new(
        store,
        notifier,
        gate(config),
        ReviewLinks::new(config.review.base_url.clone()),
    )
}

pub(crate) fn configured_service(
    config: &AppConfig,
) -> Result<DraftService<FileStore, ConfiguredNotifier>, NotifyError> {
    let notifier = ConfiguredNotifier::from_config(config)?;
    if matches!(notifier, ConfiguredNotifier::Disabled(_)) {
        info!("RESEND_API_KEY not set; review e-mails are disabled");
    }
    Ok(draft_service(config, file_store(config), Arc::new(notifier)))
}

pub(crate) fn pipeline(config: &AppConfig) -> PublishPipeline<FileStore, FileStore> {
    let store = file_store(config);
    PublishPipeline::new(store.clone(), store, gate(config))
}
