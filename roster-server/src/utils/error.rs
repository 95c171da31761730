//! 统一错误处理
//!
//! 错误类型来自 `shared::error`，这里只负责把报名引擎的
//! [`ManagerError`] 转成 HTTP 层的 [`AppError`]。
//!
//! | ManagerError | ErrorCode | HTTP |
//! |--------------|-----------|------|
//! | ResourceNotFound | 4001 | 404 |
//! | ResourceNotBookable | 4002 | 409 |
//! | AlreadyRegistered | 4003 | 409 |
//! | NotRegistered | 4004 | 404 |
//! | ResourceFull | 4005 | 409 |
//! | OfferExpired | 4006 | 409 |
//! | InvalidOperation | 4007 | 400 |
//! | StoreUnavailable | 9400 / 9401 / 9403 | 503 / 503 / 500 |

use crate::registration::ManagerError;
use shared::registration::CommandError;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        let detail = match &err {
            ManagerError::ResourceNotFound(id)
            | ManagerError::ResourceNotBookable(id)
            | ManagerError::ResourceFull(id) => Some(("resource_id", id.clone())),
            ManagerError::AlreadyRegistered { party_id, .. }
            | ManagerError::NotRegistered { party_id, .. }
            | ManagerError::OfferExpired { party_id, .. } => Some(("party_id", party_id.clone())),
            ManagerError::InvalidOperation(_) | ManagerError::StoreUnavailable(_) => None,
        };

        let cmd: CommandError = err.into();
        let app = AppError::with_message(cmd.code.into(), cmd.message);
        match detail {
            Some((key, value)) => app.with_detail(key, value),
            None => app,
        }
    }
}
