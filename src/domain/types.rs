// ==========================================
// 库存台账清理工具 - 领域类型定义
// ==========================================
// 约束: 账户类别固定为 2（库存类），不支持其他账户类别
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 参与清理的固定账户类别
pub const LEDGER_ACCOUNT_CLASS: i64 = 2;

/// 行项目数量归零阈值：剩余数量 ≤ 该值时删除行项目而不是更新
pub const QUANTITY_EPSILON: f64 = 0.001;

/// 批量删除每批 ID 数量
pub const DELETE_BATCH_SIZE: usize = 1000;

/// 正余额报表默认展示条数
pub const POSITIVE_BALANCE_REPORT_LIMIT: usize = 10;

/// 截止日期格式 (YYYY-MM-DD)
pub const CUTOFF_DATE_FORMAT: &str = "%Y-%m-%d";

// ==========================================
// 清理轮次类型 (Pass Kind)
// ==========================================
// 每一轮清理对应一个独立事务
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassKind {
    ZeroBalance,  // 零余额分组清理（台账 + 行项目）
    ZeroQuantity, // 零数量行项目清扫
    Orphan,       // 孤立单据头清理
}

impl fmt::Display for PassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassKind::ZeroBalance => write!(f, "ZERO_BALANCE"),
            PassKind::ZeroQuantity => write!(f, "ZERO_QUANTITY"),
            PassKind::Orphan => write!(f, "ORPHAN"),
        }
    }
}

// ==========================================
// 台账方向 (Entry Direction)
// ==========================================
// 数据库中存储为 +1 / -1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryDirection {
    Inbound,  // 入库 / 采购 (+1)
    Outbound, // 出库 / 销售 (-1)
}

impl EntryDirection {
    /// 从数据库中的有符号类型解析；仅接受 +1 / -1
    pub fn from_signed_type(signed_type: i64) -> Option<Self> {
        match signed_type {
            1 => Some(EntryDirection::Inbound),
            -1 => Some(EntryDirection::Outbound),
            _ => None,
        }
    }

    pub fn sign(&self) -> i64 {
        match self {
            EntryDirection::Inbound => 1,
            EntryDirection::Outbound => -1,
        }
    }

    /// 有符号贡献 = 方向 × 数量
    pub fn contribution(&self, quantity: f64) -> f64 {
        self.sign() as f64 * quantity
    }
}

impl fmt::Display for EntryDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryDirection::Inbound => write!(f, "INBOUND"),
            EntryDirection::Outbound => write!(f, "OUTBOUND"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_direction_from_signed_type() {
        assert_eq!(EntryDirection::from_signed_type(1), Some(EntryDirection::Inbound));
        assert_eq!(EntryDirection::from_signed_type(-1), Some(EntryDirection::Outbound));
        assert_eq!(EntryDirection::from_signed_type(0), None);
        assert_eq!(EntryDirection::from_signed_type(2), None);
        assert_eq!(EntryDirection::Outbound.sign(), -1);
        assert_eq!(EntryDirection::Outbound.contribution(6.5), -6.5);
        assert_eq!(EntryDirection::Inbound.contribution(4.0), 4.0);
    }

    #[test]
    fn test_pass_kind_display() {
        assert_eq!(PassKind::ZeroBalance.to_string(), "ZERO_BALANCE");
        assert_eq!(PassKind::Orphan.to_string(), "ORPHAN");
    }
}
