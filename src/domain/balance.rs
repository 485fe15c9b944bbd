// ==========================================
// 库存台账清理工具 - 余额分组（派生值，不落库）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// GroupKey - 分组键
// ==========================================
// (document_group_id, item_id, location_id, shop_id)
// Ord 按字段顺序比较，保证下游分批结果确定
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub document_group_id: i64,
    pub item_id: i64,
    pub location_id: i64,
    pub shop_id: i64,
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.document_group_id, self.item_id, self.location_id, self.shop_id
        )
    }
}

// ==========================================
// BalanceGroup - 余额分组
// ==========================================
// 对固定账户类别、截止日期内的台账分录按分组键聚合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceGroup {
    pub key: GroupKey,
    pub total_purchases: f64, // signed_type > 0 的数量合计
    pub total_sales: f64,     // signed_type < 0 的数量合计（正数）
    pub net_balance: f64,     // Σ signed_type × quantity
    pub last_entry_date: Option<String>,
    pub entry_count: i64,
}

// ==========================================
// PositiveBalanceReport - 正余额分组报表
// ==========================================
// 仅用于汇总展示：前 N 个分组 + 总数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositiveBalanceReport {
    pub groups: Vec<BalanceGroup>,
    pub total_groups: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(document_group_id: i64, item_id: i64) -> GroupKey {
        GroupKey {
            document_group_id,
            item_id,
            location_id: 1,
            shop_id: 1,
        }
    }

    #[test]
    fn test_group_key_ordering() {
        let mut keys = vec![key(2, 1), key(1, 5), key(1, 2)];
        keys.sort();
        assert_eq!(keys, vec![key(1, 2), key(1, 5), key(2, 1)]);
    }
}
