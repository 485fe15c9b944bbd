// ==========================================
// 库存台账清理工具 - 引擎层
// ==========================================
// 职责: 清理规则与事务编排，不拼 SQL
// 流程: 余额聚合 → 依赖解析 → 数量核销 → 批量删除 → 孤立单据头清理
// ==========================================

pub mod aggregator;
pub mod error;
pub mod orchestrator;
pub mod orphan;
pub mod reconciler;
pub mod reporter;
pub mod resolver;

// 重导出核心引擎
pub use aggregator::BalanceAggregator;
pub use error::{CleanupError, CleanupResult, CleanupStage};
pub use orchestrator::{CleanupOrchestrator, PassOutcome};
pub use orphan::OrphanFinder;
pub use reconciler::{decide_line_item, LineItemDecision, QuantityReconciler};
pub use reporter::{CleanupReporter, NoOpCleanupReporter};
pub use resolver::DependencyResolver;
