// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库初始化、台账测试数据构建
// ==========================================

#![allow(dead_code)]

use chrono::NaiveDate;
use ledger_cleanup::db::{ensure_schema, open_sqlite_connection};
use ledger_cleanup::domain::types::LEDGER_ACCOUNT_CLASS;
use ledger_cleanup::domain::{DocumentHeader, GroupKey, LedgerEntry, LineItem};
use ledger_cleanup::repository::{
    DocumentHeaderRepository, LedgerEntryRepository, LineItemRepository,
};
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接（仓储与编排器共用）
pub fn open_shared(db_path: &str) -> Arc<Mutex<Connection>> {
    Arc::new(Mutex::new(open_sqlite_connection(db_path).unwrap()))
}

pub fn count_rows(conn: &Arc<Mutex<Connection>>, table: &str) -> i64 {
    conn.lock()
        .unwrap()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .unwrap()
}

pub fn line_item_quantity(conn: &Arc<Mutex<Connection>>, id: i64) -> Option<f64> {
    use rusqlite::OptionalExtension;
    conn.lock()
        .unwrap()
        .query_row("SELECT quantity FROM line_item WHERE id = ?", [id], |row| {
            row.get(0)
        })
        .optional()
        .unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn key(document_group_id: i64, item_id: i64, location_id: i64, shop_id: i64) -> GroupKey {
    GroupKey {
        document_group_id,
        item_id,
        location_id,
        shop_id,
    }
}

// ==========================================
// LedgerFixture - 台账测试数据构建器
// ==========================================

#[derive(Default)]
pub struct LedgerFixture {
    headers: Vec<DocumentHeader>,
    line_items: Vec<LineItem>,
    entries: Vec<LedgerEntry>,
}

impl LedgerFixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, id: i64, form_date: &str) -> Self {
        self.headers.push(DocumentHeader {
            id,
            header_no: format!("H-{:05}", id),
            form_date: form_date.to_string(),
            partner_id: 1,
            form_type: 1,
        });
        self
    }

    pub fn line_item(mut self, id: i64, header_id: i64, quantity: f64) -> Self {
        self.line_items.push(LineItem {
            id,
            header_id,
            quantity,
        });
        self
    }

    /// 固定账户类别下的台账分录
    pub fn entry(
        self,
        id: i64,
        key: GroupKey,
        signed_type: i64,
        quantity: f64,
        entry_date: &str,
        line_item_id: i64,
    ) -> Self {
        self.raw_entry(
            id,
            LEDGER_ACCOUNT_CLASS,
            Some(key.document_group_id),
            key,
            signed_type,
            quantity,
            entry_date,
            line_item_id,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn raw_entry(
        mut self,
        id: i64,
        account_class: i64,
        document_group_id: Option<i64>,
        key: GroupKey,
        signed_type: i64,
        quantity: f64,
        entry_date: &str,
        line_item_id: i64,
    ) -> Self {
        self.entries.push(LedgerEntry {
            id,
            account_class,
            document_group_id,
            item_id: key.item_id,
            location_id: key.location_id,
            shop_id: key.shop_id,
            signed_type,
            quantity,
            entry_date: date(entry_date),
            line_item_id,
        });
        self
    }

    /// 写入数据库（单据头 → 行项目 → 台账分录）
    pub fn apply(self, conn: &Arc<Mutex<Connection>>) {
        let header_repo = DocumentHeaderRepository::from_connection(conn.clone());
        let line_item_repo = LineItemRepository::from_connection(conn.clone());
        let ledger_repo = LedgerEntryRepository::from_connection(conn.clone());

        for header in &self.headers {
            header_repo.insert(header).unwrap();
        }
        for item in &self.line_items {
            line_item_repo.insert(item).unwrap();
        }
        ledger_repo.batch_insert(&self.entries).unwrap();
    }
}

/// 标准场景: 一个分组 (+10, -6, -4)，进货行项目数量为 `purchase_quantity`
///
/// - header 1 / line_item 11: 进货 +10
/// - header 2 / line_item 21: 销售 -6
/// - header 3 / line_item 31: 销售 -4
pub fn three_entry_group(purchase_quantity: f64) -> LedgerFixture {
    let k = key(100, 1, 1, 1);
    LedgerFixture::new()
        .header(1, "2023-01-05")
        .header(2, "2023-02-10")
        .header(3, "2023-03-15")
        .line_item(11, 1, purchase_quantity)
        .line_item(21, 2, 6.0)
        .line_item(31, 3, 4.0)
        .entry(1, k, 1, 10.0, "2023-01-05", 11)
        .entry(2, k, -1, 6.0, "2023-02-10", 21)
        .entry(3, k, -1, 4.0, "2023-03-15", 31)
}
