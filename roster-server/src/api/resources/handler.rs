//! Resource API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::registration::{EntryStatus, RegistrationEntry, Resource, ResourceInput};

use crate::api::run_blocking;
use crate::core::ServerState;
use crate::registration::ReconcileReport;
use crate::utils::{AppError, AppResult};

/// Query params for listing entries
#[derive(Debug, Default, Deserialize)]
pub struct EntriesQuery {
    /// Comma separated statuses, e.g. `CONFIRMED,WAITLISTED` (all when absent)
    #[serde(default)]
    pub status: Option<String>,
}

impl EntriesQuery {
    fn statuses(&self) -> AppResult<Vec<EntryStatus>> {
        let Some(raw) = self.status.as_deref() else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|token| {
                EntryStatus::ALL
                    .iter()
                    .copied()
                    .find(|s| s.to_string().eq_ignore_ascii_case(token))
                    .ok_or_else(|| AppError::validation(format!("Unknown entry status: {token}")))
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub from_position: u32,
}

#[derive(Debug, Serialize)]
pub struct ReorderResponse {
    pub shifted: u32,
}

/// List all resources
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Resource>>> {
    let resources = run_blocking(&state, |m| m.list_resources()).await?;
    Ok(Json(resources))
}

/// Create a resource (or update it when `id` names an existing one)
pub async fn upsert(
    State(state): State<ServerState>,
    Json(input): Json<ResourceInput>,
) -> AppResult<Json<Resource>> {
    let resource = run_blocking(&state, move |m| m.upsert_resource(input)).await?;
    Ok(Json(resource))
}

/// Update the resource named in the path
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(mut input): Json<ResourceInput>,
) -> AppResult<Json<Resource>> {
    if input.id.as_deref().is_some_and(|body_id| body_id != id) {
        return Err(AppError::validation("Resource id in body does not match path"));
    }
    input.id = Some(id);
    let resource = run_blocking(&state, move |m| m.upsert_resource(input)).await?;
    Ok(Json(resource))
}

/// Get resource by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Resource>> {
    let resource = run_blocking(&state, move |m| m.get_resource(&id)).await?;
    Ok(Json(resource))
}

/// Cancel a class; every registration is released and notified
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Resource>> {
    let resource = run_blocking(&state, move |m| m.cancel_resource(&id)).await?;
    Ok(Json(resource))
}

pub async fn complete(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Resource>> {
    let resource = run_blocking(&state, move |m| m.complete_resource(&id)).await?;
    Ok(Json(resource))
}

/// Entries of a resource, oldest first
pub async fn entries(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(query): Query<EntriesQuery>,
) -> AppResult<Json<Vec<RegistrationEntry>>> {
    let statuses = query.statuses()?;
    let entries = run_blocking(&state, move |m| m.list_entries(&id, &statuses)).await?;
    Ok(Json(entries))
}

/// Waitlist ordered by position
pub async fn waitlist(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<RegistrationEntry>>> {
    let entries = run_blocking(&state, move |m| m.waitlist(&id)).await?;
    Ok(Json(entries))
}

pub async fn reorder_waitlist(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<ReorderRequest>,
) -> AppResult<Json<ReorderResponse>> {
    let shifted =
        run_blocking(&state, move |m| m.reorder_waitlist(&id, req.from_position)).await?;
    Ok(Json(ReorderResponse { shifted }))
}

/// Fill free slots from the waitlist; returns the promoted entries
pub async fn promote(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<RegistrationEntry>>> {
    let promoted = run_blocking(&state, move |m| m.promote(&id)).await?;
    Ok(Json(promoted))
}

pub async fn reconcile(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ReconcileReport>> {
    let report = run_blocking(&state, move |m| m.reconcile(&id)).await?;
    Ok(Json(report))
}

/// Reconcile every resource
pub async fn reconcile_all(
    State(state): State<ServerState>,
) -> AppResult<Json<Vec<ReconcileReport>>> {
    let reports = run_blocking(&state, |m| m.reconcile_all()).await?;
    Ok(Json(reports))
}
