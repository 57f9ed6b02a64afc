use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use axum::response::IntoResponse;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::inventory::router::{commit_handler, inventory_router};
use crate::inventory::UnitImportService;

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

#[tokio::test]
async fn full_import_workflow_over_http() {
    let (service, _) = memory_service();
    let router = inventory_router(service);

    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/projects/sea-breeze/units/import",
            json!({
                "importedBy": "ops@estate.test",
                "csv": csv(&["A,101,100,available,40,1,Sea", "A,102,bad,,,,"]),
            }),
        ))
        .await
        .expect("submit response");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = read_json_body(response).await;
    let import_id = body["import"]["id"].as_str().expect("import id").to_string();
    assert_eq!(body["import"]["processed"], json!(false));
    assert_eq!(body["fieldMapping"]["isApproved"], json!(false));

    let response = router
        .clone()
        .oneshot(get("/api/v1/units/import/pending?projectId=sea-breeze"))
        .await
        .expect("pending response");
    let body = read_json_body(response).await;
    assert_eq!(body["total"], json!(1));
    assert_eq!(body["imports"][0]["importId"], json!(import_id));

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/units/import/{import_id}/commit"),
            json!({}),
        ))
        .await
        .expect("commit response");
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(
        read_json_body(response).await["status"],
        json!("awaiting_approval")
    );

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/units/import/{import_id}/approve"),
            json!({ "approvedBy": "lead@estate.test" }),
        ))
        .await
        .expect("approve response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["isApproved"], json!(true));

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/units/import/{import_id}/commit"),
            json!({}),
        ))
        .await
        .expect("commit response");
    assert_eq!(response.status(), StatusCode::OK);
    let summary = read_json_body(response).await;
    assert_eq!(summary["status"], json!("committed"));
    assert_eq!(summary["createdUnits"], json!(1));
    assert_eq!(summary["skippedUnits"], json!(1));
    assert_eq!(summary["rows"][1]["outcome"], json!("skipped"));
    let unit_id = summary["rows"][0]["unitId"]
        .as_str()
        .expect("unit id")
        .to_string();

    let response = router
        .clone()
        .oneshot(get(&format!("/api/v1/units/{unit_id}/versions?page=1&limit=5")))
        .await
        .expect("versions response");
    assert_eq!(response.status(), StatusCode::OK);
    let page = read_json_body(response).await;
    assert_eq!(page["total"], json!(1));
    assert_eq!(page["limit"], json!(5));
    assert_eq!(page["versions"][0]["price"], json!(100.0));
    assert_eq!(page["versions"][0]["changes"], Value::Null);

    let response = router
        .oneshot(get(&format!("/api/v1/units/import/{import_id}")))
        .await
        .expect("import response");
    let body = read_json_body(response).await;
    assert_eq!(body["import"]["processed"], json!(true));
    assert_eq!(body["import"]["skippedUnits"], json!(1));
}

#[tokio::test]
async fn unknown_import_is_not_found() {
    let (service, _) = memory_service();
    let response = inventory_router(service)
        .oneshot(get("/api/v1/units/import/imp-missing"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], json!("import imp-missing not found"));
}

#[tokio::test]
async fn malformed_csv_is_a_bad_request() {
    let (service, _) = memory_service();
    let response = inventory_router(service)
        .oneshot(post_json(
            "/api/v1/projects/sea-breeze/units/import",
            json!({ "importedBy": "ops", "csv": "" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn approval_without_price_column_is_unprocessable() {
    let (service, _) = memory_service();
    let details = service
        .submit(project(), submission("Building,Unit\nA,101\n".to_string()))
        .expect("submit succeeds");

    let response = inventory_router(service)
        .oneshot(post_json(
            &format!("/api/v1/units/import/{}/approve", details.import.id),
            json!({ "approvedBy": "lead" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn commit_handler_reports_repository_outage() {
    let service = Arc::new(UnitImportService::new(Arc::new(UnavailableRepository)));

    let response = commit_handler::<UnavailableRepository>(
        State(service),
        Path("imp-000001".to_string()),
    )
    .await
    .into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
