// ==========================================
// 库存台账清理工具 - 核心库
// ==========================================
// 职责: 清理截止日期前净余额为零的台账分组及其依赖记录，
//       再删除失去全部行项目的单据头
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与派生值
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 清理规则与事务编排
pub mod engine;

// 配置层 - 运行配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// SQL 性能统计
pub mod perf;

// 文本报告 / CSV 导出
pub mod report;

// API 层 - 步骤驱动
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    BalanceGroup, CleanupSummary, DocumentHeader, GroupKey, LedgerEntry, LineItem,
    PendingDeletion, ReconcilePlan,
};

// 引擎
pub use engine::{
    BalanceAggregator, CleanupError, CleanupOrchestrator, DependencyResolver, OrphanFinder,
    QuantityReconciler,
};

// API
pub use api::{ApiError, CleanupApi, CleanupRunReport};

// 配置
pub use config::CleanupConfig;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "库存台账清理工具";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
