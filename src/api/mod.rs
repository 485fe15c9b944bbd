// ==========================================
// 库存台账清理工具 - API 层
// ==========================================
// 职责: 输入校验、步骤编排、错误转换
// ==========================================

pub mod cleanup_api;
pub mod error;
pub mod validator;

pub use cleanup_api::{CleanupApi, CleanupRunReport};
pub use error::{ApiError, ApiResult};
pub use validator::{parse_cutoff_date, validate_config};
