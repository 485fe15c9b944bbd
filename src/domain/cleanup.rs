// ==========================================
// 库存台账清理工具 - 清理计划与结果
// ==========================================
// 生命周期: 仅存在于单轮清理期间（内存中，不落库）
// ==========================================

use super::balance::{BalanceGroup, GroupKey};
use super::ledger::DocumentHeader;
use super::types::PassKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// PendingDeletion - 待删除台账分录
// ==========================================
// 每条被选中的台账分录一行，由依赖记录解析器生成
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDeletion {
    pub ledger_entry_id: i64,
    pub line_item_id: i64,
    pub header_id: i64,
    pub entry_date: String,
    pub group_key: GroupKey,
}

// ==========================================
// DeletionStats - 待删除集合统计
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionStats {
    pub ledger_entries: usize,
    pub distinct_line_items: usize,
    pub distinct_headers: usize,
}

impl DeletionStats {
    pub fn from_pending(pending: &[PendingDeletion]) -> Self {
        let line_items: BTreeSet<i64> = pending.iter().map(|p| p.line_item_id).collect();
        let headers: BTreeSet<i64> = pending.iter().map(|p| p.header_id).collect();

        Self {
            ledger_entries: pending.len(),
            distinct_line_items: line_items.len(),
            distinct_headers: headers.len(),
        }
    }
}

// ==========================================
// LineItemUpdate - 行项目数量调整
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemUpdate {
    pub line_item_id: i64,
    pub current_quantity: f64,
    pub reduction: f64,
    pub new_quantity: f64,
}

// ==========================================
// ReconcilePlan - 数量核销计划
// ==========================================
// 行项目 ID 升序，保证 dry-run 与正式执行输出一致
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcilePlan {
    pub to_delete_line_items: Vec<i64>,
    pub to_update_line_items: Vec<LineItemUpdate>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.to_delete_line_items.is_empty() && self.to_update_line_items.is_empty()
    }
}

// ==========================================
// ZeroBalancePlan - 零余额清理计划
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZeroBalancePlan {
    pub groups: Vec<BalanceGroup>,
    pub pending: Vec<PendingDeletion>,
    pub reconcile: ReconcilePlan,
    pub stats: DeletionStats,
}

impl ZeroBalancePlan {
    pub fn ledger_entry_ids(&self) -> Vec<i64> {
        self.pending.iter().map(|p| p.ledger_entry_id).collect()
    }
}

// ==========================================
// OrphanPlan - 孤立单据头清理计划
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrphanPlan {
    pub headers: Vec<DocumentHeader>,
}

impl OrphanPlan {
    pub fn header_ids(&self) -> Vec<i64> {
        self.headers.iter().map(|h| h.id).collect()
    }
}

// ==========================================
// CleanupSummary - 单轮清理结果
// ==========================================
// 只返回结构化计数，不负责格式化输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupSummary {
    pub pass_id: String,
    pub pass: PassKind,
    pub dry_run: bool,
    pub ledger_entries_affected: usize,
    pub line_items_updated: usize,
    pub line_items_deleted: usize,
    pub headers_deleted: usize,
}

impl CleanupSummary {
    /// 空候选集合时的无操作结果
    pub fn noop(pass_id: impl Into<String>, pass: PassKind, dry_run: bool) -> Self {
        Self {
            pass_id: pass_id.into(),
            pass,
            dry_run,
            ledger_entries_affected: 0,
            line_items_updated: 0,
            line_items_deleted: 0,
            headers_deleted: 0,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.ledger_entries_affected == 0
            && self.line_items_updated == 0
            && self.line_items_deleted == 0
            && self.headers_deleted == 0
    }
}
