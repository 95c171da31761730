//! Command API Handlers

use axum::{Json, extract::State};
use shared::registration::{CommandResponse, RegistrationCommand};

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// Execute a registration command
///
/// Business failures are reported inside the [`CommandResponse`] with a
/// 200 status so clients can tell them apart from transport errors.
pub async fn execute(
    State(state): State<ServerState>,
    Json(cmd): Json<RegistrationCommand>,
) -> AppResult<Json<CommandResponse>> {
    if cmd.command_id.trim().is_empty() {
        return Err(AppError::validation("command_id must not be empty"));
    }
    let manager = state.manager.clone();
    let response = tokio::task::spawn_blocking(move || manager.execute_command(cmd))
        .await
        .map_err(|e| AppError::internal(format!("Command task failed: {e}")))?;
    Ok(Json(response))
}
