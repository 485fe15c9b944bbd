// ==========================================
// 库存台账清理工具 - API层错误类型
// ==========================================
// 职责: 汇总仓储层/引擎层错误，转换为面向调用方的错误消息
// ==========================================

use crate::domain::types::PassKind;
use crate::engine::error::{CleanupError, CleanupStage};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入与配置错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    // ==========================================
    // 清理执行错误
    // ==========================================
    /// 某一轮清理失败（已整轮回滚）
    #[error("清理失败(已回滚): pass={pass}, stage={stage}: {source}")]
    CleanupFailed {
        pass: PassKind,
        stage: CleanupStage,
        #[source]
        source: RepositoryError,
    },

    #[error("报告输出失败: {0}")]
    ReportError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }
            err @ RepositoryError::BatchDeleteFailed { .. } => ApiError::DatabaseError(err.to_string()),
            err @ RepositoryError::InvalidDirection { .. } => ApiError::DatabaseError(err.to_string()),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 CleanupError 转换
// ==========================================
impl From<CleanupError> for ApiError {
    fn from(err: CleanupError) -> Self {
        match err {
            CleanupError::PassFailed {
                pass,
                stage,
                source,
            } => ApiError::CleanupFailed {
                pass,
                stage,
                source,
            },
            CleanupError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            CleanupError::ReportFailed(msg) => ApiError::ReportError(msg),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
