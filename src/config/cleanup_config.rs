// ==========================================
// 库存台账清理工具 - 运行配置
// ==========================================
// 来源: .env 文件 + 环境变量（命令行参数可再覆盖）
// 约束: 只在入口处加载一次，以显式值传入 API/引擎，引擎内部不读环境
// ==========================================

use crate::db::get_default_db_path;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 默认截止日期（含）
pub const DEFAULT_CUTOFF_DATE: &str = "2024-01-01";

/// 默认慢 SQL 阈值（毫秒）
pub const DEFAULT_SLOW_SQL_MS: u64 = 200;

/// 环境变量名
pub mod env_keys {
    pub const DB_PATH: &str = "LEDGER_CLEANUP_DB_PATH";
    pub const CUTOFF_DATE: &str = "CUTOFF_DATE";
    pub const DRY_RUN: &str = "DRY_RUN";
    pub const LOG_FILE: &str = "LOG_FILE";
    pub const SWEEP_ZERO_QUANTITY: &str = "SWEEP_ZERO_QUANTITY";
    pub const DRY_RUN_EXPORT: &str = "DRY_RUN_EXPORT";
    pub const SLOW_SQL_MS: &str = "SLOW_SQL_MS";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupConfig {
    pub db_path: String,
    /// 原样保留输入，由 API 层在任何查询之前校验
    pub cutoff_date: String,
    pub dry_run: bool,
    pub log_file: PathBuf,
    pub sweep_zero_quantity: bool,
    pub dry_run_export: Option<PathBuf>,
    /// 单条语句耗时超过该值时输出 slow_sql 日志，0 关闭
    pub slow_sql_ms: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            db_path: get_default_db_path(),
            cutoff_date: DEFAULT_CUTOFF_DATE.to_string(),
            dry_run: false,
            log_file: default_log_file(),
            sweep_zero_quantity: false,
            dry_run_export: None,
            slow_sql_ms: DEFAULT_SLOW_SQL_MS,
        }
    }
}

impl CleanupConfig {
    /// 读取 .env（若存在）与进程环境变量
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 通过任意键值来源构造配置（空值视为未设置）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            db_path: get(env_keys::DB_PATH).unwrap_or_else(get_default_db_path),
            cutoff_date: get(env_keys::CUTOFF_DATE)
                .unwrap_or_else(|| DEFAULT_CUTOFF_DATE.to_string()),
            dry_run: get(env_keys::DRY_RUN).map(|v| is_true(&v)).unwrap_or(false),
            log_file: get(env_keys::LOG_FILE)
                .map(PathBuf::from)
                .unwrap_or_else(default_log_file),
            sweep_zero_quantity: get(env_keys::SWEEP_ZERO_QUANTITY)
                .map(|v| is_true(&v))
                .unwrap_or(false),
            dry_run_export: get(env_keys::DRY_RUN_EXPORT).map(PathBuf::from),
            slow_sql_ms: get(env_keys::SLOW_SQL_MS)
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(DEFAULT_SLOW_SQL_MS),
        }
    }
}

fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// 默认日志文件名: cleanup_YYYYmmdd_HHMMSS.log
pub fn default_log_file() -> PathBuf {
    PathBuf::from(format!(
        "cleanup_{}.log",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ))
}
