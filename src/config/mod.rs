// ==========================================
// 库存台账清理工具 - 配置层
// ==========================================
// 职责: 运行配置加载（.env + 环境变量），构造一次后显式传递
// ==========================================

pub mod cleanup_config;

pub use cleanup_config::{default_log_file, env_keys, CleanupConfig, DEFAULT_CUTOFF_DATE};
