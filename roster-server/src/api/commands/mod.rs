//! Command API Module
//!
//! Idempotent command endpoint for member apps and front-desk clients.
//! A command carries its own `command_id`; replaying a committed command
//! returns the stored response with `duplicate: true`.
//!
//! | 路径 | 方法 | 说明 |
//! |------|------|------|
//! | /api/commands | POST | 执行报名命令 |

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/commands", post(handler::execute))
}
