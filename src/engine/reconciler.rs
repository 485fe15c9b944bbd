// ==========================================
// 库存台账清理工具 - 数量核销器
// ==========================================
// 职责: 按行项目累计待删除分录的贡献，决定更新数量还是删除行项目
// 约束:
// - 分录贡献与行项目数量都在调用方事务内重读，不使用规划快照
// - 同一分录只计一次
// - 核减量取累计净贡献的绝对值，行项目数量只减不增
// - 累计贡献为零的行项目保持原数量
// - 剩余数量 ≤ QUANTITY_EPSILON 时删除，不写入负数
// 副作用: 无（写入由编排器执行）
// ==========================================

use crate::domain::cleanup::{LineItemUpdate, PendingDeletion, ReconcilePlan};
use crate::domain::types::QUANTITY_EPSILON;
use crate::repository::{LedgerEntryRepository, LineItemRepository, RepositoryResult};
use rusqlite::Connection;
use std::collections::{BTreeMap, HashSet};

/// 单个行项目的核销结论
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineItemDecision {
    Delete,
    Update { new_quantity: f64 },
}

/// 根据当前数量与核减量得出结论
pub fn decide_line_item(current_quantity: f64, reduction: f64) -> LineItemDecision {
    let new_quantity = current_quantity - reduction;
    if new_quantity <= QUANTITY_EPSILON {
        LineItemDecision::Delete
    } else {
        LineItemDecision::Update { new_quantity }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuantityReconciler;

impl QuantityReconciler {
    pub fn new() -> Self {
        Self
    }

    /// 计算核销计划
    ///
    /// 核减量取同一行项目下累计有符号贡献的绝对值，正负混合的分录会先相互抵消再核减。
    /// 累计贡献恰为零的行项目不进入计划。
    ///
    /// # 参数
    /// - `conn`: 当前清理事务（或 dry-run 的只读事务）
    /// - `pending`: 依赖记录解析器输出
    pub fn reconcile(&self, conn: &Connection, pending: &[PendingDeletion]) -> RepositoryResult<ReconcilePlan> {
        let mut reductions: BTreeMap<i64, f64> = BTreeMap::new();
        let mut seen: HashSet<i64> = HashSet::with_capacity(pending.len());

        for record in pending {
            if !seen.insert(record.ledger_entry_id) {
                continue;
            }
            let contribution = LedgerEntryRepository::signed_contribution_in_tx(conn, record.ledger_entry_id)?;
            *reductions.entry(record.line_item_id).or_insert(0.0) += contribution;
        }

        let mut plan = ReconcilePlan::default();
        for (line_item_id, accumulated) in reductions {
            let reduction = accumulated.abs();
            if reduction == 0.0 {
                tracing::debug!(line_item_id, "行项目累计贡献为零，跳过");
                continue;
            }
            let current_quantity = LineItemRepository::quantity_in_tx(conn, line_item_id)?;

            match decide_line_item(current_quantity, reduction) {
                LineItemDecision::Delete => {
                    tracing::debug!(
                        line_item_id,
                        current_quantity,
                        reduction,
                        "行项目数量归零，标记删除"
                    );
                    plan.to_delete_line_items.push(line_item_id);
                }
                LineItemDecision::Update { new_quantity } => {
                    tracing::debug!(
                        line_item_id,
                        current_quantity,
                        reduction,
                        new_quantity,
                        "行项目数量核减"
                    );
                    plan.to_update_line_items.push(LineItemUpdate {
                        line_item_id,
                        current_quantity,
                        reduction,
                        new_quantity,
                    });
                }
            }
        }

        Ok(plan)
    }
}
