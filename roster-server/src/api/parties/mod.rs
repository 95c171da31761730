//! Party API Module
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/parties/{party_id}/entries | GET | 会员在所有资源上的报名记录 (新→旧) |

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use shared::registration::RegistrationEntry;

use crate::api::run_blocking;
use crate::core::ServerState;
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/parties/{party_id}/entries", get(entries))
}

async fn entries(
    State(state): State<ServerState>,
    Path(party_id): Path<String>,
) -> AppResult<Json<Vec<RegistrationEntry>>> {
    let entries = run_blocking(&state, move |m| m.entries_for_party(&party_id)).await?;
    Ok(Json(entries))
}
