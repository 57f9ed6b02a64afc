use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header::ACCEPT_LANGUAGE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::catalog::{Locale, MessageCatalog};
use super::interpolate::TranslationValues;
use super::key::TranslationKey;
use super::missing_log::MissingTranslationLog;
use super::reporter::{MissingTranslationBatch, MissingTranslationReporter};
use super::translator::{FlexibleTranslator, MissingKeySink, ResolutionVerbosity};

/// Shared state behind the translation endpoints.
#[derive(Debug, Clone)]
pub struct I18nState {
    pub catalog: Arc<MessageCatalog>,
    pub verbosity: ResolutionVerbosity,
    pub missing_log: Arc<MissingTranslationLog>,
    pub reporter: Option<MissingTranslationReporter>,
}

impl I18nState {
    pub fn new(catalog: Arc<MessageCatalog>) -> Self {
        Self {
            catalog,
            verbosity: ResolutionVerbosity::default(),
            missing_log: Arc::new(MissingTranslationLog::new()),
            reporter: None,
        }
    }

    pub fn with_verbosity(mut self, verbosity: ResolutionVerbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_reporter(mut self, reporter: MissingTranslationReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn translator(&self, locale: Locale) -> FlexibleTranslator {
        let sink = self
            .reporter
            .clone()
            .map(|reporter| Arc::new(reporter) as Arc<dyn MissingKeySink>);
        self.catalog.translator(locale, self.verbosity, sink)
    }

    fn pick_locale(&self, requested: Option<&str>, headers: &HeaderMap) -> Result<Locale, String> {
        if let Some(raw) = requested.map(str::trim).filter(|raw| !raw.is_empty()) {
            return raw.parse::<Locale>().map_err(|err| err.to_string());
        }

        Ok(headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .and_then(Locale::negotiate)
            .unwrap_or_else(|| self.catalog.fallback()))
    }
}

/// Router builder exposing translation lookup and the missing-translation collector.
pub fn i18n_router(state: Arc<I18nState>) -> Router {
    Router::new()
        .route(
            "/api/translations/missing/",
            post(collect_missing_handler).get(list_missing_handler),
        )
        .route(
            "/api/translations/missing",
            post(collect_missing_handler).get(list_missing_handler),
        )
        .route("/api/v1/i18n/translate", post(translate_handler))
        .route("/api/v1/i18n/:locale/messages", get(messages_handler))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub(crate) struct TranslateRequest {
    key: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    locale: Option<String>,
    #[serde(default)]
    values: TranslationValues,
}

pub(crate) async fn translate_handler(
    State(state): State<Arc<I18nState>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<TranslateRequest>,
) -> Response {
    let key = match TranslationKey::parse(&request.key) {
        Ok(key) => key,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    let locale = match state.pick_locale(request.locale.as_deref(), &headers) {
        Ok(locale) => locale,
        Err(error) => {
            let payload = json!({ "error": error });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    let translator = state.translator(locale);
    let resolved = translator.resolve(key.as_str(), request.namespace.as_deref(), &request.values);

    let payload = json!({
        "locale": locale,
        "key": key.as_str(),
        "namespace": request.namespace,
        "text": resolved.text,
        "resolution": resolved.resolution,
        "rtl": locale.is_rtl(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MessagesQuery {
    #[serde(default)]
    namespace: Option<String>,
}

pub(crate) async fn messages_handler(
    State(state): State<Arc<I18nState>>,
    Path(locale): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Response {
    let locale = match locale.parse::<Locale>() {
        Ok(locale) => locale,
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };

    let messages = state.catalog.messages(locale);
    match query.namespace.as_deref().map(str::trim).filter(|ns| !ns.is_empty()) {
        None => (StatusCode::OK, axum::Json(messages.as_ref().clone())).into_response(),
        Some(namespace) => match messages.subtree(namespace) {
            Some(subtree) => (StatusCode::OK, axum::Json(subtree.clone())).into_response(),
            None => {
                let payload = json!({
                    "error": format!("namespace '{namespace}' not found"),
                    "locale": locale,
                });
                (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
            }
        },
    }
}

pub(crate) async fn collect_missing_handler(
    State(state): State<Arc<I18nState>>,
    axum::Json(batch): axum::Json<MissingTranslationBatch>,
) -> Response {
    let received = batch.translations.len();
    let fresh = state.missing_log.ingest(batch);
    let payload = json!({
        "received": received,
        "new": fresh,
        "tracked": state.missing_log.len(),
    });
    (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
}

pub(crate) async fn list_missing_handler(State(state): State<Arc<I18nState>>) -> Response {
    let entries = state.missing_log.entries();
    let payload = json!({
        "total": entries.len(),
        "entries": entries,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}
