// ==========================================
// 库存台账清理工具 - 台账分录数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询参数化；分组键成员判断使用行值 IN (VALUES ...)
// ==========================================

mod aggregate;
mod core;


pub use self::core::LedgerEntryRepository;

/// 分组键成员查询每批键数（每个键 4 个绑定参数，SQLite 默认变量上限 999）
pub const GROUP_KEY_CHUNK_SIZE: usize = 200;
