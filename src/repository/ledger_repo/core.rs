use crate::domain::ledger::LedgerEntry;
use crate::domain::types::EntryDirection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// LedgerEntryRepository - 台账分录仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct LedgerEntryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LedgerEntryRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作（上游业务/测试数据使用，清理流程不新增分录）
    // ==========================================

    /// 插入台账分录
    pub fn insert(&self, entry: &LedgerEntry) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::insert_with(&conn, entry)?;
        Ok(entry.id)
    }

    /// 批量插入台账分录（单事务）
    pub fn batch_insert(&self, entries: &[LedgerEntry]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        for entry in entries {
            Self::insert_with(&tx, entry)?;
        }

        tx.commit()?;
        Ok(entries.len())
    }

    fn insert_with(conn: &Connection, entry: &LedgerEntry) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO ledger_entry (
                id, account_class, document_group_id, item_id, location_id,
                shop_id, signed_type, quantity, entry_date, line_item_id
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                entry.id,
                entry.account_class,
                entry.document_group_id,
                entry.item_id,
                entry.location_id,
                entry.shop_id,
                entry.signed_type,
                entry.quantity,
                entry.entry_date.format("%Y-%m-%d").to_string(),
                entry.line_item_id,
            ],
        )?;
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 ID 查询台账分录
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<LedgerEntry>> {
        let conn = self.get_conn()?;

        let entry = conn
            .query_row(
                r#"
                SELECT id, account_class, document_group_id, item_id, location_id,
                       shop_id, signed_type, quantity, entry_date, line_item_id
                FROM ledger_entry
                WHERE id = ?
                "#,
                params![id],
                Self::map_row,
            )
            .optional()?;

        Ok(entry)
    }

    // ==========================================
    // 事务内读取
    // ==========================================

    /// 在调用方事务内读取分录当前的有符号贡献 (signed_type × quantity)
    ///
    /// 核销阶段必须使用该方法重读，不能信任规划阶段的快照。
    /// signed_type 不是 +1 / -1 时返回 `InvalidDirection`，整轮回滚。
    pub fn signed_contribution_in_tx(
        conn: &Connection,
        ledger_entry_id: i64,
    ) -> RepositoryResult<f64> {
        let row: Option<(f64, i64)> = conn
            .query_row(
                "SELECT quantity, signed_type FROM ledger_entry WHERE id = ?",
                params![ledger_entry_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((quantity, signed_type)) => EntryDirection::from_signed_type(signed_type)
                .map(|direction| direction.contribution(quantity))
                .ok_or(RepositoryError::InvalidDirection {
                    ledger_entry_id,
                    signed_type,
                }),
            None => Err(RepositoryError::NotFound {
                entity: "ledger_entry".to_string(),
                id: ledger_entry_id.to_string(),
            }),
        }
    }

    pub(super) fn map_row(row: &Row) -> rusqlite::Result<LedgerEntry> {
        Ok(LedgerEntry {
            id: row.get(0)?,
            account_class: row.get(1)?,
            document_group_id: row.get(2)?,
            item_id: row.get(3)?,
            location_id: row.get(4)?,
            shop_id: row.get(5)?,
            signed_type: row.get(6)?,
            quantity: row.get(7)?,
            entry_date: row.get(8)?,
            line_item_id: row.get(9)?,
        })
    }
}
