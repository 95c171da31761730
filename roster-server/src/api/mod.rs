//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`resources`] - 课程/器械管理、候补队列、对账
//! - [`registrations`] - 报名、取消、认领空位、结束器械使用
//! - [`commands`] - 幂等命令接口
//! - [`parties`] - 会员报名记录

pub mod commands;
pub mod health;
pub mod parties;
pub mod registrations;
pub mod resources;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};

use crate::core::ServerState;
use crate::registration::{ManagerResult, RegistrationManager};

/// Run a synchronous manager call on the blocking pool
///
/// The manager holds a resource mutex and commits to redb inside each
/// call, so it must not run on an async worker thread.
pub(crate) async fn run_blocking<T, F>(state: &ServerState, op: F) -> AppResult<T>
where
    T: Send + 'static,
    F: FnOnce(&RegistrationManager) -> ManagerResult<T> + Send + 'static,
{
    let manager = state.manager.clone();
    tokio::task::spawn_blocking(move || op(&manager))
        .await
        .map_err(|e| AppError::internal(format!("Registration task failed: {e}")))?
        .map_err(AppError::from)
}

#[cfg(test)]
mod tests;
