// ==========================================
// 库存台账清理工具 - 领域模型层
// ==========================================
// 职责: 定义台账实体、派生分组、清理计划与结果
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod balance;
pub mod cleanup;
pub mod ledger;
pub mod types;

// 重导出核心类型
pub use balance::{BalanceGroup, GroupKey, PositiveBalanceReport};
pub use cleanup::{
    CleanupSummary, DeletionStats, LineItemUpdate, OrphanPlan, PendingDeletion, ReconcilePlan,
    ZeroBalancePlan,
};
pub use ledger::{DocumentHeader, LedgerEntry, LineItem};
pub use types::{
    EntryDirection, PassKind, CUTOFF_DATE_FORMAT, DELETE_BATCH_SIZE, LEDGER_ACCOUNT_CLASS,
    POSITIVE_BALANCE_REPORT_LIMIT, QUANTITY_EPSILON,
};
