// ==========================================
// 库存台账清理工具 - 余额聚合器
// ==========================================
// 职责: 按分组键聚合台账分录，筛选零余额 / 正余额分组
// 红线: 只读，无副作用；Engine 不拼 SQL
// ==========================================

use crate::domain::balance::{BalanceGroup, PositiveBalanceReport};
use crate::domain::types::POSITIVE_BALANCE_REPORT_LIMIT;
use crate::repository::{LedgerEntryRepository, RepositoryResult};
use chrono::NaiveDate;
use std::sync::Arc;

pub struct BalanceAggregator {
    ledger_repo: Arc<LedgerEntryRepository>,
}

impl BalanceAggregator {
    pub fn new(ledger_repo: Arc<LedgerEntryRepository>) -> Self {
        Self { ledger_repo }
    }

    /// 截止日期（含）前净余额严格为零的分组，按分组键升序
    pub fn find_zero_balance_groups(&self, cutoff: NaiveDate) -> RepositoryResult<Vec<BalanceGroup>> {
        let groups = self.ledger_repo.find_zero_balance_groups(cutoff)?;
        tracing::info!(cutoff = %cutoff, groups = groups.len(), "零余额分组查询完成");
        Ok(groups)
    }

    /// 正余额分组报表：前 10 个分组 + 总数（不限截止日期）
    pub fn find_positive_balance_groups(&self) -> RepositoryResult<PositiveBalanceReport> {
        let groups = self
            .ledger_repo
            .find_positive_balance_groups(POSITIVE_BALANCE_REPORT_LIMIT)?;
        let total_groups = self.ledger_repo.count_positive_balance_groups()?;

        Ok(PositiveBalanceReport {
            groups,
            total_groups,
        })
    }
}
