// ==========================================
// 测试台账数据生成器
// ==========================================
// 用法: seed_test_ledger [db_path] [group_count]
// db_path 缺省时取 LEDGER_CLEANUP_DB_PATH（.env / 环境变量），再缺省为用户数据目录
// 生成内容:
// - 零余额分组（进货行项目全部消耗 / 部分消耗）
// - 正余额分组
// - 截止日期之后的分录
// - 数量已归零的行项目
// - 预先存在的孤立单据头
// ==========================================

use chrono::{Duration, Local, NaiveDate};
use ledger_cleanup::config::CleanupConfig;
use ledger_cleanup::db::{ensure_schema, open_sqlite_connection};
use ledger_cleanup::domain::types::LEDGER_ACCOUNT_CLASS;
use ledger_cleanup::domain::{DocumentHeader, LedgerEntry, LineItem};
use ledger_cleanup::repository::{
    DocumentHeaderRepository, LedgerEntryRepository, LineItemRepository,
};
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

const DEFAULT_GROUP_COUNT: i64 = 500;

/// 生成数据的基准日期（默认截止日期 2024-01-01 之前）
const BASE_DATE: &str = "2023-01-01";

struct Seeder {
    headers: DocumentHeaderRepository,
    line_items: LineItemRepository,
    entries: Vec<LedgerEntry>,
    next_header_id: i64,
    next_line_item_id: i64,
    next_entry_id: i64,
}

impl Seeder {
    fn new(conn: Arc<Mutex<rusqlite::Connection>>) -> Self {
        Self {
            headers: DocumentHeaderRepository::from_connection(conn.clone()),
            line_items: LineItemRepository::from_connection(conn),
            entries: Vec::new(),
            next_header_id: 1,
            next_line_item_id: 1,
            next_entry_id: 1,
        }
    }

    fn header(&mut self, form_date: NaiveDate, form_type: i64) -> Result<i64, Box<dyn Error>> {
        let id = self.next_header_id;
        self.next_header_id += 1;
        self.headers.insert(&DocumentHeader {
            id,
            header_no: format!("F{:07}", id),
            form_date: form_date.format("%Y-%m-%d").to_string(),
            partner_id: id % 37,
            form_type,
        })?;
        Ok(id)
    }

    fn line_item(&mut self, header_id: i64, quantity: f64) -> Result<i64, Box<dyn Error>> {
        let id = self.next_line_item_id;
        self.next_line_item_id += 1;
        self.line_items.insert(&LineItem {
            id,
            header_id,
            quantity,
        })?;
        Ok(id)
    }

    /// 单据头 + 行项目 + 台账分录
    fn posting(
        &mut self,
        group: i64,
        signed_type: i64,
        quantity: f64,
        line_quantity: f64,
        entry_date: NaiveDate,
    ) -> Result<(), Box<dyn Error>> {
        let header_id = self.header(entry_date, if signed_type > 0 { 1 } else { 2 })?;
        let line_item_id = self.line_item(header_id, line_quantity)?;

        self.entries.push(LedgerEntry {
            id: self.next_entry_id,
            account_class: LEDGER_ACCOUNT_CLASS,
            document_group_id: Some(group),
            item_id: group % 101,
            location_id: 1 + group % 3,
            shop_id: 1 + group % 2,
            signed_type,
            quantity,
            entry_date,
            line_item_id,
        });
        self.next_entry_id += 1;
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| CleanupConfig::from_env().db_path);

    let group_count = std::env::args()
        .nth(2)
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(DEFAULT_GROUP_COUNT)
        .max(10);

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    seed_ledger(conn.clone(), group_count)?;
    print_quick_counts(&conn)?;

    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_ledger(conn: Arc<Mutex<rusqlite::Connection>>, group_count: i64) -> Result<(), Box<dyn Error>> {
    let base = NaiveDate::parse_from_str(BASE_DATE, "%Y-%m-%d")?;
    let mut seeder = Seeder::new(conn.clone());

    for group in 1..=group_count {
        let day = base + Duration::days(group % 300);
        match group % 5 {
            // 零余额：进货 10，销售 6 + 4，进货行项目全部消耗
            0 | 1 => {
                seeder.posting(group, 1, 10.0, 10.0, day)?;
                seeder.posting(group, -1, 6.0, 6.0, day + Duration::days(1))?;
                seeder.posting(group, -1, 4.0, 4.0, day + Duration::days(2))?;
            }
            // 零余额：进货行项目数量大于本组消耗，清理后保留差额
            2 => {
                seeder.posting(group, 1, 8.0, 12.5, day)?;
                seeder.posting(group, -1, 8.0, 8.0, day + Duration::days(3))?;
            }
            // 正余额
            3 => {
                seeder.posting(group, 1, 20.0, 20.0, day)?;
                seeder.posting(group, -1, 7.5, 7.5, day + Duration::days(5))?;
            }
            // 截止日期前为零，之后又有进货
            _ => {
                seeder.posting(group, 1, 3.0, 3.0, day)?;
                seeder.posting(group, -1, 3.0, 3.0, day + Duration::days(1))?;
                seeder.posting(group, 1, 5.0, 5.0, base + Duration::days(400))?;
            }
        }
    }

    // 数量已归零的行项目与孤立单据头
    for i in 0..(group_count / 10) {
        let header_id = seeder.header(base + Duration::days(i), 3)?;
        seeder.line_item(header_id, 0.0)?;
        seeder.header(base + Duration::days(i), 4)?;
    }

    let ledger_repo = LedgerEntryRepository::from_connection(conn);
    let inserted = ledger_repo.batch_insert(&seeder.entries)?;
    println!("✓ 生成台账分录 {} 条（{} 个分组）", inserted, group_count);
    Ok(())
}

fn print_quick_counts(conn: &Arc<Mutex<rusqlite::Connection>>) -> Result<(), Box<dyn Error>> {
    let conn = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
    for table in ["ledger_entry", "line_item", "document_header"] {
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        println!("  {}: {}", table, count);
    }
    Ok(())
}
