// ==========================================
// 库存台账清理工具 - 事务删除编排器
// ==========================================
// 职责: 串联 聚合 → 解析 → 核销 → 批量删除，每轮清理一个事务
// 红线:
// - 所有写入都在同一事务内，任一步失败整轮回滚（Transaction drop 即回滚）
// - 不自动重试；错误携带轮次与阶段原样上抛
// - dry-run 与正式执行走同一套计划计算，仅跳过写入与提交
// 并发: 单线程、单连接；调用方负责串行化多次调用
// ==========================================

use crate::db::begin_pass_transaction;
use crate::domain::balance::PositiveBalanceReport;
use crate::domain::cleanup::{CleanupSummary, DeletionStats, OrphanPlan, ZeroBalancePlan};
use crate::domain::types::{PassKind, QUANTITY_EPSILON};
use crate::engine::aggregator::BalanceAggregator;
use crate::engine::error::{CleanupError, CleanupResult, CleanupStage};
use crate::engine::orphan::OrphanFinder;
use crate::engine::reconciler::QuantityReconciler;
use crate::engine::reporter::{CleanupReporter, NoOpCleanupReporter};
use crate::engine::resolver::DependencyResolver;
use crate::perf::PassTimer;
use crate::repository::{
    delete_by_ids, CleanupTable, DocumentHeaderRepository, LedgerEntryRepository,
    LineItemRepository, RepositoryError,
};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// 单轮清理结果 + 所执行（或将执行）的计划
#[derive(Debug, Clone)]
pub struct PassOutcome<P> {
    pub summary: CleanupSummary,
    pub plan: P,
}

pub struct CleanupOrchestrator {
    conn: Arc<Mutex<Connection>>,
    aggregator: BalanceAggregator,
    resolver: DependencyResolver,
    reconciler: QuantityReconciler,
    orphan_finder: OrphanFinder,
    reporter: Arc<dyn CleanupReporter>,
    dry_run: bool,
}

impl CleanupOrchestrator {
    /// 基于共享连接创建编排器
    ///
    /// # 参数
    /// - `conn`: 共享连接（仓储与事务使用同一连接）
    /// - `dry_run`: 是否只计算计划不写入
    /// - `reporter`: dry-run 计划接收方（None 时不输出）
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        dry_run: bool,
        reporter: Option<Arc<dyn CleanupReporter>>,
    ) -> Self {
        let ledger_repo = Arc::new(LedgerEntryRepository::from_connection(conn.clone()));
        let line_item_repo = Arc::new(LineItemRepository::from_connection(conn.clone()));
        let header_repo = Arc::new(DocumentHeaderRepository::from_connection(conn.clone()));

        Self {
            aggregator: BalanceAggregator::new(ledger_repo.clone()),
            resolver: DependencyResolver::new(ledger_repo),
            reconciler: QuantityReconciler::new(),
            orphan_finder: OrphanFinder::new(header_repo, line_item_repo),
            reporter: reporter
                .unwrap_or_else(|| Arc::new(NoOpCleanupReporter) as Arc<dyn CleanupReporter>),
            dry_run,
            conn,
        }
    }

    fn lock_conn(&self) -> CleanupResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| CleanupError::LockError(e.to_string()))
    }

    // ==========================================
    // 零余额清理
    // ==========================================

    /// 执行零余额清理轮次，仅返回计数
    pub fn run_zero_balance_pass(&self, cutoff: NaiveDate) -> CleanupResult<CleanupSummary> {
        self.execute_zero_balance_pass(cutoff).map(|outcome| outcome.summary)
    }

    /// 执行零余额清理轮次，同时返回计划
    pub fn execute_zero_balance_pass(
        &self,
        cutoff: NaiveDate,
    ) -> CleanupResult<PassOutcome<ZeroBalancePlan>> {
        const PASS: PassKind = PassKind::ZeroBalance;
        let pass_id = Uuid::new_v4().to_string();
        let mut timer = PassTimer::new(PASS, &pass_id);

        tracing::info!(pass_id = %pass_id, cutoff = %cutoff, dry_run = self.dry_run, "STEP 1: 开始零余额清理");

        // 规划阶段（事务外读取）
        let groups = timer
            .measure(CleanupStage::Aggregate, || self.aggregator.find_zero_balance_groups(cutoff))
            .map_err(CleanupError::at(PASS, CleanupStage::Aggregate))?;
        if groups.is_empty() {
            tracing::info!(pass_id = %pass_id, "未找到零余额分组");
            return Ok(PassOutcome {
                summary: CleanupSummary::noop(pass_id, PASS, self.dry_run),
                plan: ZeroBalancePlan::default(),
            });
        }

        let pending = timer
            .measure(CleanupStage::Resolve, || self.resolver.resolve_deletion_set(&groups, cutoff))
            .map_err(CleanupError::at(PASS, CleanupStage::Resolve))?;
        if pending.is_empty() {
            tracing::info!(pass_id = %pass_id, groups = groups.len(), "零余额分组没有可删除的依赖记录");
            return Ok(PassOutcome {
                summary: CleanupSummary::noop(pass_id, PASS, self.dry_run),
                plan: ZeroBalancePlan {
                    groups,
                    ..ZeroBalancePlan::default()
                },
            });
        }

        let stats = DeletionStats::from_pending(&pending);
        tracing::info!(
            pass_id = %pass_id,
            groups = groups.len(),
            ledger_entries = stats.ledger_entries,
            line_items = stats.distinct_line_items,
            headers = stats.distinct_headers,
            "待处理记录统计"
        );

        let mut conn = self.lock_conn()?;

        if self.dry_run {
            // 只读事务：保证核销读取的一致快照，drop 时回滚
            let read_tx = conn
                .transaction()
                .map_err(|e| CleanupError::at(PASS, CleanupStage::BeginTransaction)(e.into()))?;
            let reconcile = timer
                .measure(CleanupStage::Reconcile, || self.reconciler.reconcile(&read_tx, &pending))
                .map_err(CleanupError::at(PASS, CleanupStage::Reconcile))?;
            drop(read_tx);

            let plan = ZeroBalancePlan {
                groups,
                pending,
                reconcile,
                stats,
            };
            self.reporter
                .report_zero_balance_plan(&plan)
                .map_err(|e| CleanupError::ReportFailed(e.to_string()))?;

            let summary = CleanupSummary {
                pass_id,
                pass: PASS,
                dry_run: true,
                ledger_entries_affected: plan.pending.len(),
                line_items_updated: plan.reconcile.to_update_line_items.len(),
                line_items_deleted: plan.reconcile.to_delete_line_items.len(),
                headers_deleted: 0,
            };
            tracing::info!(pass_id = %summary.pass_id, "DRY RUN: 零余额清理未写入任何数据");
            return Ok(PassOutcome { summary, plan });
        }

        // 写入阶段（单事务）
        let tx = begin_pass_transaction(&mut conn)
            .map_err(|e| CleanupError::at(PASS, CleanupStage::BeginTransaction)(e.into()))?;

        let reconcile = timer
            .measure(CleanupStage::Reconcile, || self.reconciler.reconcile(&tx, &pending))
            .map_err(CleanupError::at(PASS, CleanupStage::Reconcile))?;

        let plan = ZeroBalancePlan {
            groups,
            pending,
            reconcile,
            stats,
        };

        let ledger_ids = plan.ledger_entry_ids();
        tracing::info!(pass_id = %pass_id, count = ledger_ids.len(), "删除台账分录");
        let ledger_entries_affected = timer
            .measure(CleanupStage::DeleteLedgerEntries, || {
                delete_by_ids(&tx, CleanupTable::LedgerEntry, &ledger_ids)
            })
            .map_err(CleanupError::at(PASS, CleanupStage::DeleteLedgerEntries))?;

        timer
            .measure(CleanupStage::UpdateLineItems, || {
                plan.reconcile.to_update_line_items.iter().try_for_each(|update| {
                    LineItemRepository::update_quantity_in_tx(&tx, update.line_item_id, update.new_quantity)
                        .map(|_| ())
                })
            })
            .map_err(CleanupError::at(PASS, CleanupStage::UpdateLineItems))?;

        tracing::info!(
            pass_id = %pass_id,
            count = plan.reconcile.to_delete_line_items.len(),
            "删除数量归零的行项目"
        );
        let line_items_deleted = timer
            .measure(CleanupStage::DeleteLineItems, || {
                delete_by_ids(&tx, CleanupTable::LineItem, &plan.reconcile.to_delete_line_items)
            })
            .map_err(CleanupError::at(PASS, CleanupStage::DeleteLineItems))?;

        timer.measure(CleanupStage::Commit, || tx.commit()).map_err(|e| {
            CleanupError::at(PASS, CleanupStage::Commit)(RepositoryError::DatabaseTransactionError(
                e.to_string(),
            ))
        })?;

        let summary = CleanupSummary {
            pass_id,
            pass: PASS,
            dry_run: false,
            ledger_entries_affected,
            line_items_updated: plan.reconcile.to_update_line_items.len(),
            line_items_deleted,
            headers_deleted: 0,
        };

        tracing::info!(
            pass_id = %summary.pass_id,
            ledger_entries = summary.ledger_entries_affected,
            line_items_updated = summary.line_items_updated,
            line_items_deleted = summary.line_items_deleted,
            "零余额清理完成"
        );

        Ok(PassOutcome { summary, plan })
    }

    // ==========================================
    // 零数量行项目清扫
    // ==========================================

    pub fn run_zero_quantity_pass(&self) -> CleanupResult<CleanupSummary> {
        const PASS: PassKind = PassKind::ZeroQuantity;
        let pass_id = Uuid::new_v4().to_string();
        let mut timer = PassTimer::new(PASS, &pass_id);

        let planned = timer
            .measure(CleanupStage::FindZeroQuantity, || {
                self.orphan_finder.find_zero_quantity_line_items()
            })
            .map_err(CleanupError::at(PASS, CleanupStage::FindZeroQuantity))?;

        tracing::info!(pass_id = %pass_id, count = planned.len(), "零数量行项目查询完成");
        if planned.is_empty() {
            return Ok(CleanupSummary::noop(pass_id, PASS, self.dry_run));
        }

        if self.dry_run {
            self.reporter
                .report_zero_quantity_plan(&planned)
                .map_err(|e| CleanupError::ReportFailed(e.to_string()))?;
            return Ok(CleanupSummary {
                line_items_deleted: planned.len(),
                ..CleanupSummary::noop(pass_id, PASS, true)
            });
        }

        let mut conn = self.lock_conn()?;
        let tx = begin_pass_transaction(&mut conn)
            .map_err(|e| CleanupError::at(PASS, CleanupStage::BeginTransaction)(e.into()))?;

        let confirmed = timer
            .measure(CleanupStage::FindZeroQuantity, || {
                LineItemRepository::retain_zero_quantity_in_tx(&tx, &planned, QUANTITY_EPSILON)
            })
            .map_err(CleanupError::at(PASS, CleanupStage::FindZeroQuantity))?;
        if confirmed.len() != planned.len() {
            tracing::warn!(
                pass_id = %pass_id,
                planned = planned.len(),
                confirmed = confirmed.len(),
                "部分行项目数量已变化，跳过"
            );
        }

        let line_items_deleted = timer
            .measure(CleanupStage::DeleteLineItems, || {
                delete_by_ids(&tx, CleanupTable::LineItem, &confirmed)
            })
            .map_err(CleanupError::at(PASS, CleanupStage::DeleteLineItems))?;

        timer.measure(CleanupStage::Commit, || tx.commit()).map_err(|e| {
            CleanupError::at(PASS, CleanupStage::Commit)(RepositoryError::DatabaseTransactionError(
                e.to_string(),
            ))
        })?;

        tracing::info!(pass_id = %pass_id, line_items_deleted, "零数量行项目清扫完成");

        Ok(CleanupSummary {
            line_items_deleted,
            ..CleanupSummary::noop(pass_id, PASS, false)
        })
    }

    // ==========================================
    // 孤立单据头清理
    // ==========================================

    pub fn run_orphan_pass(&self) -> CleanupResult<CleanupSummary> {
        self.execute_orphan_pass().map(|outcome| outcome.summary)
    }

    pub fn execute_orphan_pass(&self) -> CleanupResult<PassOutcome<OrphanPlan>> {
        const PASS: PassKind = PassKind::Orphan;
        let pass_id = Uuid::new_v4().to_string();
        let mut timer = PassTimer::new(PASS, &pass_id);

        tracing::info!(pass_id = %pass_id, dry_run = self.dry_run, "STEP 2: 开始孤立单据头清理");

        let headers = timer
            .measure(CleanupStage::FindOrphans, || self.orphan_finder.find_orphaned_headers())
            .map_err(CleanupError::at(PASS, CleanupStage::FindOrphans))?;
        let plan = OrphanPlan { headers };

        tracing::info!(pass_id = %pass_id, count = plan.headers.len(), "孤立单据头查询完成");
        if plan.headers.is_empty() {
            return Ok(PassOutcome {
                summary: CleanupSummary::noop(pass_id, PASS, self.dry_run),
                plan,
            });
        }

        if self.dry_run {
            self.reporter
                .report_orphan_plan(&plan)
                .map_err(|e| CleanupError::ReportFailed(e.to_string()))?;
            let summary = CleanupSummary {
                headers_deleted: plan.headers.len(),
                ..CleanupSummary::noop(pass_id, PASS, true)
            };
            return Ok(PassOutcome { summary, plan });
        }

        let mut conn = self.lock_conn()?;
        let tx = begin_pass_transaction(&mut conn)
            .map_err(|e| CleanupError::at(PASS, CleanupStage::BeginTransaction)(e.into()))?;

        // 单据头只有在此刻仍没有行项目时才允许删除
        let confirmed = timer
            .measure(CleanupStage::FindOrphans, || {
                DocumentHeaderRepository::retain_orphaned_in_tx(&tx, &plan.header_ids())
            })
            .map_err(CleanupError::at(PASS, CleanupStage::FindOrphans))?;
        if confirmed.len() != plan.headers.len() {
            tracing::warn!(
                pass_id = %pass_id,
                planned = plan.headers.len(),
                confirmed = confirmed.len(),
                "部分单据头已有新的行项目，跳过"
            );
        }

        let headers_deleted = timer
            .measure(CleanupStage::DeleteHeaders, || {
                delete_by_ids(&tx, CleanupTable::DocumentHeader, &confirmed)
            })
            .map_err(CleanupError::at(PASS, CleanupStage::DeleteHeaders))?;

        timer.measure(CleanupStage::Commit, || tx.commit()).map_err(|e| {
            CleanupError::at(PASS, CleanupStage::Commit)(RepositoryError::DatabaseTransactionError(
                e.to_string(),
            ))
        })?;

        tracing::info!(pass_id = %pass_id, headers_deleted, "孤立单据头清理完成");

        Ok(PassOutcome {
            summary: CleanupSummary {
                headers_deleted,
                ..CleanupSummary::noop(pass_id, PASS, false)
            },
            plan,
        })
    }

    // ==========================================
    // 汇总报表
    // ==========================================

    /// 剩余正余额分组（前 10 + 总数）
    pub fn positive_balance_report(&self) -> CleanupResult<PositiveBalanceReport> {
        self.aggregator
            .find_positive_balance_groups()
            .map_err(CleanupError::at(PassKind::ZeroBalance, CleanupStage::Aggregate))
    }
}
