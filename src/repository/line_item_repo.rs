// ==========================================
// 库存台账清理工具 - 行项目数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑（是否删除/更新由核销器决定）
// ==========================================

use crate::domain::ledger::LineItem;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, ToSql};
use std::sync::{Arc, Mutex, MutexGuard};

/// 事务内复核时每批 ID 数量（SQLite 默认变量上限通常为 999）
const RECHECK_CHUNK_SIZE: usize = 900;

pub struct LineItemRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LineItemRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, item: &LineItem) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO line_item (id, header_id, quantity) VALUES (?, ?, ?)",
            params![item.id, item.header_id, item.quantity],
        )?;
        Ok(item.id)
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<LineItem>> {
        let conn = self.get_conn()?;
        let item = conn
            .query_row(
                "SELECT id, header_id, quantity FROM line_item WHERE id = ?",
                params![id],
                Self::map_row,
            )
            .optional()?;
        Ok(item)
    }

    /// 查询存量数量 ≤ threshold 的行项目 ID（按 ID 升序）
    pub fn find_zero_quantity_ids(&self, threshold: f64) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT id FROM line_item WHERE quantity <= ? ORDER BY id")?;
        let ids = stmt
            .query_map(params![threshold], |row| row.get(0))?
            .collect::<SqliteResult<Vec<i64>>>()?;
        Ok(ids)
    }

    // ==========================================
    // 事务内读写
    // ==========================================

    /// 在调用方事务内读取行项目当前数量（不使用任何缓存）
    pub fn quantity_in_tx(conn: &Connection, line_item_id: i64) -> RepositoryResult<f64> {
        conn.query_row(
            "SELECT quantity FROM line_item WHERE id = ?",
            params![line_item_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| RepositoryError::NotFound {
            entity: "line_item".to_string(),
            id: line_item_id.to_string(),
        })
    }

    /// 在调用方事务内更新行项目数量
    pub fn update_quantity_in_tx(
        conn: &Connection,
        line_item_id: i64,
        quantity: f64,
    ) -> RepositoryResult<usize> {
        let rows = conn.execute(
            "UPDATE line_item SET quantity = ? WHERE id = ?",
            params![quantity, line_item_id],
        )?;
        if rows == 0 {
            return Err(RepositoryError::NotFound {
                entity: "line_item".to_string(),
                id: line_item_id.to_string(),
            });
        }
        Ok(rows)
    }

    /// 在调用方事务内复核：仅保留此刻数量仍 ≤ threshold 的行项目 ID
    pub fn retain_zero_quantity_in_tx(
        conn: &Connection,
        line_item_ids: &[i64],
        threshold: f64,
    ) -> RepositoryResult<Vec<i64>> {
        let mut out = Vec::with_capacity(line_item_ids.len());

        for chunk in line_item_ids.chunks(RECHECK_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT id FROM line_item WHERE quantity <= ? AND id IN ({}) ORDER BY id",
                placeholders
            );

            let mut params_vec: Vec<&dyn ToSql> = Vec::with_capacity(chunk.len() + 1);
            params_vec.push(&threshold);
            for id in chunk {
                params_vec.push(id);
            }

            let mut stmt = conn.prepare(&sql)?;
            let ids = stmt
                .query_map(params_vec.as_slice(), |row| row.get::<_, i64>(0))?
                .collect::<SqliteResult<Vec<_>>>()?;
            out.extend(ids);
        }

        Ok(out)
    }

    fn map_row(row: &Row) -> SqliteResult<LineItem> {
        Ok(LineItem {
            id: row.get(0)?,
            header_id: row.get(1)?,
            quantity: row.get(2)?,
        })
    }
}
