// ==========================================
// 库存台账清理工具 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod batch_delete;
pub mod error;
pub mod header_repo;
pub mod ledger_repo;
pub mod line_item_repo;

// 重导出核心仓储
pub use batch_delete::{delete_by_ids, delete_by_ids_in_batches, CleanupTable};
pub use error::{RepositoryError, RepositoryResult};
pub use header_repo::DocumentHeaderRepository;
pub use ledger_repo::LedgerEntryRepository;
pub use line_item_repo::LineItemRepository;
