use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{CommitOutcome, ImportId, ProjectId, UnitId};
use super::repository::InventoryRepository;
use super::service::{ImportSubmission, MappingApproval, UnitImportService};
use super::versioning::PageRequest;
use crate::error::AppError;

/// Router builder exposing the unit import workflow and version history.
pub fn inventory_router<R>(service: Arc<UnitImportService<R>>) -> Router
where
    R: InventoryRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/projects/:project_id/units/import",
            post(submit_handler::<R>),
        )
        .route("/api/v1/units/import/pending", get(pending_handler::<R>))
        .route("/api/v1/units/import/:import_id", get(import_handler::<R>))
        .route(
            "/api/v1/units/import/:import_id/approve",
            post(approve_handler::<R>),
        )
        .route(
            "/api/v1/units/import/:import_id/commit",
            post(commit_handler::<R>),
        )
        .route("/api/v1/units/:unit_id/versions", get(versions_handler::<R>))
        .with_state(service)
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<UnitImportService<R>>>,
    Path(project_id): Path<String>,
    axum::Json(submission): axum::Json<ImportSubmission>,
) -> Result<Response, AppError>
where
    R: InventoryRepository + 'static,
{
    let details = service.submit(ProjectId(project_id), submission)?;
    Ok((StatusCode::ACCEPTED, axum::Json(details)).into_response())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PendingQuery {
    #[serde(default)]
    project_id: Option<String>,
}

pub(crate) async fn pending_handler<R>(
    State(service): State<Arc<UnitImportService<R>>>,
    Query(query): Query<PendingQuery>,
) -> Result<Response, AppError>
where
    R: InventoryRepository + 'static,
{
    let project_id = query
        .project_id
        .filter(|project| !project.trim().is_empty())
        .map(ProjectId);
    let imports = service.pending(project_id.as_ref())?;
    let payload = json!({
        "total": imports.len(),
        "imports": imports,
    });
    Ok((StatusCode::OK, axum::Json(payload)).into_response())
}

pub(crate) async fn import_handler<R>(
    State(service): State<Arc<UnitImportService<R>>>,
    Path(import_id): Path<String>,
) -> Result<Response, AppError>
where
    R: InventoryRepository + 'static,
{
    let details = service.import(&ImportId(import_id))?;
    Ok((StatusCode::OK, axum::Json(details)).into_response())
}

pub(crate) async fn approve_handler<R>(
    State(service): State<Arc<UnitImportService<R>>>,
    Path(import_id): Path<String>,
    axum::Json(approval): axum::Json<MappingApproval>,
) -> Result<Response, AppError>
where
    R: InventoryRepository + 'static,
{
    let mapping = service.approve_mapping(&ImportId(import_id), approval)?;
    Ok((StatusCode::OK, axum::Json(mapping)).into_response())
}

pub(crate) async fn commit_handler<R>(
    State(service): State<Arc<UnitImportService<R>>>,
    Path(import_id): Path<String>,
) -> Result<Response, AppError>
where
    R: InventoryRepository + 'static,
{
    let outcome = service.commit(&ImportId(import_id))?;
    let status = match outcome {
        CommitOutcome::Committed(_) => StatusCode::OK,
        CommitOutcome::AwaitingApproval { .. } => StatusCode::ACCEPTED,
    };
    Ok((status, axum::Json(outcome)).into_response())
}

pub(crate) async fn versions_handler<R>(
    State(service): State<Arc<UnitImportService<R>>>,
    Path(unit_id): Path<String>,
    Query(page): Query<PageRequest>,
) -> Result<Response, AppError>
where
    R: InventoryRepository + 'static,
{
    let versions = service.versions(&UnitId(unit_id), page)?;
    Ok((StatusCode::OK, axum::Json(versions)).into_response())
}
