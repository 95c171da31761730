//! Registration API Module
//!
//! Per-party operations on one resource. Every call runs inside the
//! resource's exclusive section; the response is the entry as committed.
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/resources/{id}/registrations | POST | 报名 (满员时进入候补) |
//! | /api/resources/{id}/registrations/{party_id} | GET | 当前有效报名 |
//! | /api/resources/{id}/registrations/{party_id} | DELETE | 取消报名 |
//! | /api/resources/{id}/registrations/{party_id}/claim | POST | 认领器械空位 |
//! | /api/resources/{id}/registrations/{party_id}/end | POST | 结束器械使用 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/resources/{id}/registrations", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::register))
        .route(
            "/{party_id}",
            get(handler::get_active).delete(handler::cancel),
        )
        .route("/{party_id}/claim", post(handler::claim_offer))
        .route("/{party_id}/end", post(handler::end_session))
}
