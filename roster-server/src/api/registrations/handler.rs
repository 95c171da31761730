//! Registration API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use shared::registration::RegistrationEntry;

use crate::api::run_blocking;
use crate::core::ServerState;
use crate::registration::ManagerError;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub party_id: String,
    #[serde(default)]
    pub party_name: Option<String>,
}

/// Register a party; confirmed when a slot is free, waitlisted otherwise
pub async fn register(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<RegistrationEntry>> {
    if req.party_id.trim().is_empty() {
        return Err(AppError::validation("party_id must not be empty"));
    }
    let party_name = req.party_name.unwrap_or_else(|| req.party_id.clone());
    let entry = run_blocking(&state, move |m| m.register(&id, &req.party_id, &party_name)).await?;
    Ok(Json(entry))
}

/// Active entry of a party on a resource
pub async fn get_active(
    State(state): State<ServerState>,
    Path((id, party_id)): Path<(String, String)>,
) -> AppResult<Json<RegistrationEntry>> {
    let entry = run_blocking(&state, move |m| {
        m.get_resource(&id)?;
        m.get_active_entry(&id, &party_id)?
            .ok_or(ManagerError::NotRegistered {
                resource_id: id,
                party_id,
            })
    })
    .await?;
    Ok(Json(entry))
}

/// Cancel the party's active entry; a freed slot goes to the waitlist head
pub async fn cancel(
    State(state): State<ServerState>,
    Path((id, party_id)): Path<(String, String)>,
) -> AppResult<Json<RegistrationEntry>> {
    let entry = run_blocking(&state, move |m| m.cancel(&id, &party_id)).await?;
    Ok(Json(entry))
}

pub async fn claim_offer(
    State(state): State<ServerState>,
    Path((id, party_id)): Path<(String, String)>,
) -> AppResult<Json<RegistrationEntry>> {
    let entry = run_blocking(&state, move |m| m.claim_offer(&id, &party_id)).await?;
    Ok(Json(entry))
}

pub async fn end_session(
    State(state): State<ServerState>,
    Path((id, party_id)): Path<(String, String)>,
) -> AppResult<Json<RegistrationEntry>> {
    let entry = run_blocking(&state, move |m| m.end_session(&id, &party_id)).await?;
    Ok(Json(entry))
}
