// ==========================================
// 库存台账清理工具 - 孤立记录查找
// ==========================================
// 职责:
// - 孤立单据头：没有任何行项目的单据头
// - 零数量行项目：存量数量已 ≤ QUANTITY_EPSILON 的行项目
// 说明: 结构性判断，不受截止日期限制；只读
// ==========================================

use crate::domain::ledger::DocumentHeader;
use crate::domain::types::QUANTITY_EPSILON;
use crate::repository::{DocumentHeaderRepository, LineItemRepository, RepositoryResult};
use std::sync::Arc;

pub struct OrphanFinder {
    header_repo: Arc<DocumentHeaderRepository>,
    line_item_repo: Arc<LineItemRepository>,
}

impl OrphanFinder {
    pub fn new(header_repo: Arc<DocumentHeaderRepository>, line_item_repo: Arc<LineItemRepository>) -> Self {
        Self {
            header_repo,
            line_item_repo,
        }
    }

    /// 孤立单据头，按 ID 升序
    pub fn find_orphaned_headers(&self) -> RepositoryResult<Vec<DocumentHeader>> {
        self.header_repo.find_orphaned_headers()
    }

    /// 数量已归零的行项目 ID，按 ID 升序
    pub fn find_zero_quantity_line_items(&self) -> RepositoryResult<Vec<i64>> {
        self.line_item_repo.find_zero_quantity_ids(QUANTITY_EPSILON)
    }
}
