// ==========================================
// 库存台账清理工具 - 引擎层错误类型
// ==========================================
// 约束: 任一阶段失败即整轮回滚，错误携带轮次与阶段上下文原样上抛
// ==========================================

use crate::domain::types::PassKind;
use crate::repository::error::RepositoryError;
use std::fmt;
use thiserror::Error;

// ==========================================
// CleanupStage - 清理阶段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStage {
    Aggregate,
    Resolve,
    BeginTransaction,
    Reconcile,
    DeleteLedgerEntries,
    DeleteLineItems,
    UpdateLineItems,
    FindOrphans,
    DeleteHeaders,
    FindZeroQuantity,
    Commit,
}

impl fmt::Display for CleanupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CleanupStage::Aggregate => "AGGREGATE",
            CleanupStage::Resolve => "RESOLVE",
            CleanupStage::BeginTransaction => "BEGIN_TRANSACTION",
            CleanupStage::Reconcile => "RECONCILE",
            CleanupStage::DeleteLedgerEntries => "DELETE_LEDGER_ENTRIES",
            CleanupStage::DeleteLineItems => "DELETE_LINE_ITEMS",
            CleanupStage::UpdateLineItems => "UPDATE_LINE_ITEMS",
            CleanupStage::FindOrphans => "FIND_ORPHANS",
            CleanupStage::DeleteHeaders => "DELETE_HEADERS",
            CleanupStage::FindZeroQuantity => "FIND_ZERO_QUANTITY",
            CleanupStage::Commit => "COMMIT",
        };
        f.write_str(s)
    }
}

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum CleanupError {
    #[error("清理失败: pass={pass}, stage={stage}: {source}")]
    PassFailed {
        pass: PassKind,
        stage: CleanupStage,
        #[source]
        source: RepositoryError,
    },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("清理计划输出失败: {0}")]
    ReportFailed(String),
}

impl CleanupError {
    /// 构造错误映射闭包，附加轮次与阶段上下文
    pub fn at(pass: PassKind, stage: CleanupStage) -> impl FnOnce(RepositoryError) -> CleanupError {
        move |source| CleanupError::PassFailed {
            pass,
            stage,
            source,
        }
    }

    pub fn stage(&self) -> Option<CleanupStage> {
        match self {
            CleanupError::PassFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type CleanupResult<T> = Result<T, CleanupError>;
