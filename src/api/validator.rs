// ==========================================
// 库存台账清理工具 - 输入校验
// ==========================================
// 约束: 所有校验在任何数据库查询之前完成
// ==========================================

use chrono::NaiveDate;

use crate::api::error::{ApiError, ApiResult};
use crate::config::CleanupConfig;
use crate::domain::types::CUTOFF_DATE_FORMAT;

/// 解析截止日期（严格 YYYY-MM-DD）
pub fn parse_cutoff_date(input: &str) -> ApiResult<NaiveDate> {
    let value = input.trim();
    let bytes = value.as_bytes();

    let well_formed = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());

    if !well_formed {
        return Err(ApiError::InvalidInput(format!(
            "截止日期格式错误: '{}'，应为 YYYY-MM-DD",
            input
        )));
    }

    NaiveDate::parse_from_str(value, CUTOFF_DATE_FORMAT).map_err(|e| {
        ApiError::InvalidInput(format!("截止日期无效: '{}' ({})", input, e))
    })
}

/// 校验运行配置，返回解析后的截止日期
pub fn validate_config(config: &CleanupConfig) -> ApiResult<NaiveDate> {
    if config.db_path.trim().is_empty() {
        return Err(ApiError::ConfigError("数据库路径不能为空".to_string()));
    }

    if config.dry_run_export.is_some() && !config.dry_run {
        tracing::warn!("DRY_RUN_EXPORT 仅在 dry-run 模式下生效，本次忽略");
    }

    parse_cutoff_date(&config.cutoff_date)
}
