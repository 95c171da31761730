use super::super::storage::StorageError;
use shared::registration::{CommandError, CommandErrorCode};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StorageError),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Resource {0} is not open for registration")]
    ResourceNotBookable(String),

    #[error("Party {party_id} already holds an active entry for {resource_id}")]
    AlreadyRegistered {
        resource_id: String,
        party_id: String,
    },

    #[error("Party {party_id} has no active entry for {resource_id}")]
    NotRegistered {
        resource_id: String,
        party_id: String,
    },

    #[error("Resource {0} is full")]
    ResourceFull(String),

    #[error("Offer for {party_id} on {resource_id} has expired")]
    OfferExpired {
        resource_id: String,
        party_id: String,
    },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl ManagerError {
    /// Whether the caller may retry the same operation
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ManagerError::StoreUnavailable(e) if classify_storage_error(e).is_transient()
        )
    }
}

/// 将存储错误转换为错误码
pub(crate) fn classify_storage_error(e: &StorageError) -> CommandErrorCode {
    match e {
        StorageError::Serialization(_) => return CommandErrorCode::InternalError,
        StorageError::Unavailable(_) => return CommandErrorCode::StoreUnavailable,
        _ => {}
    }

    // redb 错误通过字符串匹配分类
    let err_str = e.to_string().to_lowercase();

    // 磁盘空间不足
    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return CommandErrorCode::StorageFull;
    }

    // 数据损坏
    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return CommandErrorCode::StorageCorrupted;
    }

    // 默认：存储暂不可用（redb 的 Database/Transaction/Table/Storage/Commit 错误）
    CommandErrorCode::StoreUnavailable
}

impl From<ManagerError> for CommandError {
    fn from(err: ManagerError) -> Self {
        let message = err.to_string();
        let code = match &err {
            ManagerError::StoreUnavailable(e) => {
                let code = classify_storage_error(e);
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                code
            }
            ManagerError::ResourceNotFound(_) => CommandErrorCode::ResourceNotFound,
            ManagerError::ResourceNotBookable(_) => CommandErrorCode::ResourceNotBookable,
            ManagerError::AlreadyRegistered { .. } => CommandErrorCode::AlreadyRegistered,
            ManagerError::NotRegistered { .. } => CommandErrorCode::NotRegistered,
            ManagerError::ResourceFull(_) => CommandErrorCode::ResourceFull,
            ManagerError::OfferExpired { .. } => CommandErrorCode::OfferExpired,
            ManagerError::InvalidOperation(_) => CommandErrorCode::InvalidOperation,
        };
        CommandError::new(code, message)
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
