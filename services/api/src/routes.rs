use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use estate_hub::i18n::{i18n_router, I18nState};
use estate_hub::inventory::{inventory_router, InventoryRepository, UnitImportService};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::Arc;

pub(crate) fn with_service_routes<R>(
    i18n: Arc<I18nState>,
    inventory: Arc<UnitImportService<R>>,
) -> Router
where
    R: InventoryRepository + 'static,
{
    i18n_router(i18n)
        .merge(inventory_router(inventory))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use estate_hub::i18n::{Locale, MessageCatalog, MessageTree};
    use estate_hub::inventory::InMemoryInventoryRepository;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool) -> Router {
        let tree = MessageTree::from_json_str(r#"{ "units": { "status": { "sold": "Sold" } } }"#)
            .expect("message tree");
        let catalog = MessageCatalog::new(Locale::En).with_messages(Locale::En, tree);
        let i18n = Arc::new(I18nState::new(Arc::new(catalog)));
        let inventory = Arc::new(UnitImportService::new(Arc::new(
            InMemoryInventoryRepository::new(),
        )));
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };

        with_service_routes(i18n, inventory).layer(Extension(state))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = app(true)
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_tracks_flag() {
        let response = app(false)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["status"], "initializing");

        let response = app(true)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn domain_routers_are_mounted() {
        let response = app(true)
            .oneshot(
                Request::post("/api/v1/i18n/translate")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({ "key": "units.status.sold", "locale": "en" }).to_string(),
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["text"], "Sold");

        let response = app(true)
            .oneshot(
                Request::get("/api/v1/units/import/imp-missing")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
