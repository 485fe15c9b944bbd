// ==========================================
// 库存台账清理工具 - 清理流程 API
// ==========================================
// 职责: 按步骤驱动整次清理
// - STEP 1: 零余额分组清理
// - (可选) 零数量行项目清扫
// - STEP 2: 孤立单据头清理
// - STEP 3: 剩余正余额分组汇总
// 说明: 任一步失败即停止，已提交的前序步骤不受影响
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{parse_cutoff_date, validate_config};
use crate::config::CleanupConfig;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::balance::PositiveBalanceReport;
use crate::domain::cleanup::{CleanupSummary, DeletionStats, ZeroBalancePlan};
use crate::engine::{CleanupOrchestrator, CleanupReporter, PassOutcome};
use crate::perf::install_sql_counter;

/// 单次清理运行的结果汇总
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupRunReport {
    pub cutoff_date: NaiveDate,
    pub dry_run: bool,
    pub zero_balance: CleanupSummary,
    pub zero_balance_stats: DeletionStats,
    pub zero_quantity: Option<CleanupSummary>,
    pub orphan: CleanupSummary,
    pub positive_balance: PositiveBalanceReport,
}

pub struct CleanupApi {
    orchestrator: CleanupOrchestrator,
    config: CleanupConfig,
}

impl CleanupApi {
    /// 创建清理 API
    ///
    /// # 参数
    /// - `conn`: 已完成 PRAGMA 配置的共享连接
    /// - `config`: 运行配置（dry-run、零数量清扫开关等）
    /// - `reporter`: dry-run 计划输出方
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        config: CleanupConfig,
        reporter: Option<Arc<dyn CleanupReporter>>,
    ) -> Self {
        Self {
            orchestrator: CleanupOrchestrator::new(conn, config.dry_run, reporter),
            config,
        }
    }

    /// 校验配置后打开数据库并创建 API
    ///
    /// 截止日期或数据库路径非法时直接返回，不打开（也不创建）数据库文件。
    /// `init_schema` 为 true 时补建缺失的台账表。
    pub fn open(
        config: CleanupConfig,
        reporter: Option<Arc<dyn CleanupReporter>>,
        init_schema: bool,
    ) -> ApiResult<Self> {
        validate_config(&config)?;

        let mut conn = open_sqlite_connection(&config.db_path).map_err(|e| {
            ApiError::DatabaseConnectionError(format!("{}: {}", config.db_path, e))
        })?;
        if init_schema {
            ensure_schema(&conn).map_err(|e| ApiError::DatabaseError(format!("建表失败: {}", e)))?;
        }
        install_sql_counter(&mut conn, config.slow_sql_ms);

        tracing::info!(db_path = %config.db_path, init_schema, "数据库已打开");
        Ok(Self::new(Arc::new(Mutex::new(conn)), config, reporter))
    }

    /// 按配置执行完整清理流程
    pub fn run(&self) -> ApiResult<CleanupRunReport> {
        // 配置与截止日期在任何查询之前校验
        let cutoff = validate_config(&self.config)?;

        tracing::info!(
            db_path = %self.config.db_path,
            cutoff = %cutoff,
            dry_run = self.config.dry_run,
            sweep_zero_quantity = self.config.sweep_zero_quantity,
            "开始库存台账清理"
        );

        let zero_balance = self.zero_balance_pass(cutoff)?;

        let zero_quantity = if self.config.sweep_zero_quantity {
            Some(self.run_zero_quantity_sweep()?)
        } else {
            None
        };

        let orphan = self.run_orphan_cleanup()?;

        tracing::info!("STEP 3: 剩余正余额分组汇总");
        let positive_balance = self.remaining_balance_summary()?;

        let report = CleanupRunReport {
            cutoff_date: cutoff,
            dry_run: self.config.dry_run,
            zero_balance_stats: zero_balance.plan.stats,
            zero_balance: zero_balance.summary,
            zero_quantity,
            orphan,
            positive_balance,
        };

        tracing::info!(
            ledger_entries = report.zero_balance.ledger_entries_affected,
            line_items_updated = report.zero_balance.line_items_updated,
            line_items_deleted = report.zero_balance.line_items_deleted,
            headers_deleted = report.orphan.headers_deleted,
            remaining_positive_groups = report.positive_balance.total_groups,
            "库存台账清理完成"
        );

        Ok(report)
    }

    /// 零余额清理（截止日期为字符串输入，先校验再查询）
    pub fn run_zero_balance(&self, cutoff_date: &str) -> ApiResult<PassOutcome<ZeroBalancePlan>> {
        let cutoff = parse_cutoff_date(cutoff_date)?;
        self.zero_balance_pass(cutoff)
    }

    fn zero_balance_pass(&self, cutoff: NaiveDate) -> ApiResult<PassOutcome<ZeroBalancePlan>> {
        Ok(self.orchestrator.execute_zero_balance_pass(cutoff)?)
    }

    /// 零数量行项目清扫
    pub fn run_zero_quantity_sweep(&self) -> ApiResult<CleanupSummary> {
        Ok(self.orchestrator.run_zero_quantity_pass()?)
    }

    /// 孤立单据头清理
    pub fn run_orphan_cleanup(&self) -> ApiResult<CleanupSummary> {
        Ok(self.orchestrator.run_orphan_pass()?)
    }

    /// 剩余正余额分组（前 10 + 总数）
    pub fn remaining_balance_summary(&self) -> ApiResult<PositiveBalanceReport> {
        Ok(self.orchestrator.positive_balance_report()?)
    }
}
