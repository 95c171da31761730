//! Resource API Module
//!
//! Class sessions and equipment: administration, waitlist inspection and
//! maintenance. Registrations of a resource live in
//! [`registrations`](super::registrations).
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/resources | GET | 列出资源 |
//! | /api/resources | POST | 创建或更新资源 |
//! | /api/resources/{id} | GET | 资源详情 |
//! | /api/resources/{id} | PUT | 更新资源 |
//! | /api/resources/{id}/cancel | POST | 取消课程 |
//! | /api/resources/{id}/complete | POST | 标记完成 |
//! | /api/resources/{id}/entries | GET | 报名记录 (`?status=CONFIRMED,WAITLISTED`) |
//! | /api/resources/{id}/waitlist | GET | 候补队列 |
//! | /api/resources/{id}/waitlist/reorder | POST | 压缩候补位次 |
//! | /api/resources/{id}/promote | POST | 从候补填补空位 |
//! | /api/resources/{id}/reconcile | POST | 对账 |
//! | /api/reconcile | POST | 全量对账 |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Resource router
pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/resources", routes())
        .route("/api/reconcile", post(handler::reconcile_all))
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::upsert))
        .route("/{id}", get(handler::get_by_id).put(handler::update))
        .route("/{id}/cancel", post(handler::cancel))
        .route("/{id}/complete", post(handler::complete))
        .route("/{id}/entries", get(handler::entries))
        .route("/{id}/waitlist", get(handler::waitlist))
        .route("/{id}/waitlist/reorder", post(handler::reorder_waitlist))
        .route("/{id}/promote", post(handler::promote))
        .route("/{id}/reconcile", post(handler::reconcile))
}

