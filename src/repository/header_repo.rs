// ==========================================
// 库存台账清理工具 - 单据头数据仓储
// ==========================================
// 孤立单据头: 没有任何行项目的单据头（结构性判断，不受截止日期限制）
// ==========================================

use crate::domain::ledger::DocumentHeader;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, params_from_iter, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex, MutexGuard};

/// 事务内复核孤立状态时每批 ID 数量
const ORPHAN_RECHECK_CHUNK_SIZE: usize = 900;

pub struct DocumentHeaderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DocumentHeaderRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, header: &DocumentHeader) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO document_header (id, header_no, form_date, partner_id, form_type)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                header.id,
                header.header_no,
                header.form_date,
                header.partner_id,
                header.form_type,
            ],
        )?;
        Ok(header.id)
    }

    /// 查询孤立单据头（LEFT JOIN 行项目为空），按 ID 升序
    pub fn find_orphaned_headers(&self) -> RepositoryResult<Vec<DocumentHeader>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT dh.id, dh.header_no, dh.form_date, dh.partner_id, dh.form_type
            FROM document_header dh
            LEFT JOIN line_item li ON dh.id = li.header_id
            WHERE li.id IS NULL
            ORDER BY dh.id
            "#,
        )?;

        let headers = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(headers)
    }

    /// 在调用方事务内复核：仅保留此刻仍没有任何行项目的单据头 ID
    ///
    /// 规划阶段在事务外读取，删除前必须在事务内重新确认。
    pub fn retain_orphaned_in_tx(conn: &Connection, header_ids: &[i64]) -> RepositoryResult<Vec<i64>> {
        if header_ids.is_empty() {
            return Ok(vec![]);
        }

        let mut out = Vec::with_capacity(header_ids.len());
        for chunk in header_ids.chunks(ORPHAN_RECHECK_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                r#"
                SELECT dh.id
                FROM document_header dh
                WHERE dh.id IN ({})
                  AND NOT EXISTS (SELECT 1 FROM line_item li WHERE li.header_id = dh.id)
                ORDER BY dh.id
                "#,
                placeholders
            );

            let mut stmt = conn.prepare(&sql)?;
            let ids = stmt
                .query_map(params_from_iter(chunk.iter()), |row| row.get::<_, i64>(0))?
                .collect::<SqliteResult<Vec<_>>>()?;
            out.extend(ids);
        }

        Ok(out)
    }

    fn map_row(row: &Row) -> SqliteResult<DocumentHeader> {
        Ok(DocumentHeader {
            id: row.get(0)?,
            header_no: row.get(1)?,
            form_date: row.get(2)?,
            partner_id: row.get(3)?,
            form_type: row.get(4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, ensure_schema};

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn header(id: i64) -> DocumentHeader {
        DocumentHeader {
            id,
            header_no: format!("H-{:03}", id),
            form_date: "2023-01-15".to_string(),
            partner_id: 5,
            form_type: 1,
        }
    }

    #[test]
    fn test_find_orphaned_headers() {
        let conn = setup_test_db();
        let repo = DocumentHeaderRepository::from_connection(conn.clone());
        for id in [3, 1, 2] {
            repo.insert(&header(id)).unwrap();
        }
        conn.lock()
            .unwrap()
            .execute("INSERT INTO line_item (id, header_id, quantity) VALUES (10, 2, 1.0)", [])
            .unwrap();

        let orphans = repo.find_orphaned_headers().unwrap();
        let ids: Vec<i64> = orphans.iter().map(|h| h.id).collect();

        assert_eq!(ids, vec![1, 3]);
        assert_eq!(orphans[0], header(1));
    }

    #[test]
    fn test_retain_orphaned_in_tx_drops_headers_that_gained_items() {
        let conn = setup_test_db();
        let repo = DocumentHeaderRepository::from_connection(conn.clone());
        repo.insert(&header(1)).unwrap();
        repo.insert(&header(2)).unwrap();

        let planned: Vec<i64> = repo.find_orphaned_headers().unwrap().iter().map(|h| h.id).collect();
        assert_eq!(planned, vec![1, 2]);

        let guard = conn.lock().unwrap();
        guard
            .execute("INSERT INTO line_item (id, header_id, quantity) VALUES (10, 1, 1.0)", [])
            .unwrap();

        let still_orphaned = DocumentHeaderRepository::retain_orphaned_in_tx(&guard, &planned).unwrap();
        assert_eq!(still_orphaned, vec![2]);
        assert!(DocumentHeaderRepository::retain_orphaned_in_tx(&guard, &[]).unwrap().is_empty());
    }
}
