// ==========================================
// 库存台账清理工具 - 台账实体
// ==========================================
// 层级: 台账分录 (ledger_entry) → 行项目 (line_item) → 单据头 (document_header)
// 红线: 清理只读取、删除或减少数量，不新增记录
// ==========================================

use super::balance::GroupKey;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// LedgerEntry - 台账分录
// ==========================================
// 对齐: ledger_entry 表
// 过账后不可变，只能被删除
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub account_class: i64,
    pub document_group_id: Option<i64>, // 分组键，可为空（为空时不参与零余额清理）
    pub item_id: i64,
    pub location_id: i64,
    pub shop_id: i64,
    pub signed_type: i64, // +1 / -1
    pub quantity: f64,    // 非负数量
    pub entry_date: NaiveDate,
    pub line_item_id: i64,
}

impl LedgerEntry {
    /// 分组键（document_group_id 为空时返回 None）
    pub fn group_key(&self) -> Option<GroupKey> {
        self.document_group_id.map(|document_group_id| GroupKey {
            document_group_id,
            item_id: self.item_id,
            location_id: self.location_id,
            shop_id: self.shop_id,
        })
    }
}

// ==========================================
// LineItem - 单据行项目
// ==========================================
// 对齐: line_item 表
// 数量在清理过程中只减不增
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: i64,
    pub header_id: i64,
    pub quantity: f64,
}

// ==========================================
// DocumentHeader - 单据头
// ==========================================
// 对齐: document_header 表
// 没有任何行项目的单据头为"孤立单据头"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHeader {
    pub id: i64,
    pub header_no: String,
    pub form_date: String,
    pub partner_id: i64,
    pub form_type: i64,
}
