// ==========================================
// 库存台账清理工具 - 依赖记录解析器
// ==========================================
// 职责: 把零余额分组展开为待删除的台账分录（含行项目、单据头）
// 约束:
// - 空分组列表返回空结果，绝不退化为"全部删除"
// - 按完整分组键集合做成员判断，不做范围扫描
// ==========================================

use crate::domain::balance::{BalanceGroup, GroupKey};
use crate::domain::cleanup::PendingDeletion;
use crate::repository::{LedgerEntryRepository, RepositoryResult};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::sync::Arc;

pub struct DependencyResolver {
    ledger_repo: Arc<LedgerEntryRepository>,
}

impl DependencyResolver {
    pub fn new(ledger_repo: Arc<LedgerEntryRepository>) -> Self {
        Self { ledger_repo }
    }

    /// 解析待删除集合，按 (分组键, 分录日期) 排序
    pub fn resolve_deletion_set(
        &self,
        groups: &[BalanceGroup],
        cutoff: NaiveDate,
    ) -> RepositoryResult<Vec<PendingDeletion>> {
        if groups.is_empty() {
            return Ok(vec![]);
        }

        let keys: Vec<GroupKey> = groups
            .iter()
            .map(|g| g.key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let pending = self.ledger_repo.find_deletion_candidates(&keys, cutoff)?;

        tracing::info!(
            groups = keys.len(),
            ledger_entries = pending.len(),
            "依赖记录解析完成"
        );

        Ok(pending)
    }
}
