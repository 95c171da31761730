//! Roster Server - 健身中心课程与器械报名服务
//!
//! # 架构概述
//!
//! - **报名引擎** (`registration`): 容量台账、有序候补队列、按资源串行化的报名协调器
//! - **存储** (`registration::storage`): 嵌入式 redb，每次操作一个原子写批次
//! - **通知** (`registration::notifier`): 提交后异步投递，失败只记日志
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! roster-server/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── registration/  # 报名引擎
//! ├── api/           # HTTP 路由和处理器
//! ├── routes/        # 路由组装和中间件
//! └── utils/         # 日志、错误转换
//! ```

pub mod api;
pub mod core;
pub mod registration;
pub mod routes;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState};
pub use registration::{ManagerError, RegistrationManager};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// 日志文件保留天数
const LOG_RETENTION_DAYS: u64 = 14;

/// 设置运行环境
///
/// 1. 加载 `.env` (不存在时忽略)
/// 2. 创建工作目录和日志目录
/// 3. 初始化日志并清理过期日志文件
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenv::dotenv();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    init_logger_with_file(
        Some(&config.log_level),
        Some(config.log_json),
        config.log_dir.as_deref(),
    );

    if let Some(dir) = config.log_dir.as_deref() {
        match cleanup_old_logs(dir, LOG_RETENTION_DAYS) {
            Ok(0) => {}
            Ok(removed) => tracing::info!(removed, "Removed old log files"),
            Err(e) => tracing::warn!(error = %e, "Failed to clean up old log files"),
        }
    }

    api::health::mark_started();
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
    ____             __
   / __ \____  _____/ /____  _____
  / /_/ / __ \/ ___/ __/ _ \/ ___/
 / _, _/ /_/ (__  ) /_/  __/ /
/_/ |_|\____/____/\__/\___/_/
    "#
    );
}
