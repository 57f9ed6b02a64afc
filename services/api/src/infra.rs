use estate_hub::config::I18nConfig;
use estate_hub::error::AppError;
use estate_hub::i18n::{
    HttpReportTransport, I18nState, MessageCatalog, MissingTranslationReporter,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const REPORT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads the locale documents and wires the reporter when an endpoint is configured.
pub(crate) fn build_i18n_state(config: &I18nConfig) -> Result<I18nState, AppError> {
    let catalog = MessageCatalog::load_dir(&config.locales_dir, config.default_locale)?;
    let mut state = I18nState::new(Arc::new(catalog)).with_verbosity(config.verbosity);

    if let Some(reports) = &config.missing_reports {
        let transport = HttpReportTransport::new(reports.endpoint.clone(), REPORT_TIMEOUT)?;
        let reporter = MissingTranslationReporter::new(Arc::new(transport))
            .with_retry(reports.retry)
            .with_mode(reports.mode);
        info!(
            endpoint = %reports.endpoint,
            max_attempts = reports.retry.max_attempts,
            "missing translation reporting enabled"
        );
        state = state.with_reporter(reporter);
    }

    Ok(state)
}

/// Parses `name=value` pairs given on the command line.
pub(crate) fn parse_pair(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing parameter name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}
