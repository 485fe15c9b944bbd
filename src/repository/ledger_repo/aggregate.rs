use super::core::LedgerEntryRepository;
use super::GROUP_KEY_CHUNK_SIZE;
use crate::domain::balance::{BalanceGroup, GroupKey};
use crate::domain::cleanup::PendingDeletion;
use crate::domain::types::LEDGER_ACCOUNT_CLASS;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;
use rusqlite::{params, Result as SqliteResult, Row, ToSql};

impl LedgerEntryRepository {
    // ==========================================
    // 余额聚合查询
    // ==========================================

    /// 查询截止日期（含）前净余额严格为零的分组
    ///
    /// 说明：
    /// - 仅统计固定账户类别、分组键非空的分录；
    /// - HAVING 使用精确相等比较（不设容差）；
    /// - 按分组键升序，保证下游分批确定。
    pub fn find_zero_balance_groups(&self, cutoff: NaiveDate) -> RepositoryResult<Vec<BalanceGroup>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT
                document_group_id,
                item_id,
                location_id,
                shop_id,
                SUM(CASE WHEN signed_type > 0 THEN quantity ELSE 0.0 END) AS total_purchases,
                SUM(CASE WHEN signed_type < 0 THEN quantity ELSE 0.0 END) AS total_sales,
                SUM(signed_type * quantity) AS net_balance,
                MAX(entry_date) AS last_entry_date,
                COUNT(*) AS entry_count
            FROM ledger_entry
            WHERE account_class = ?
              AND entry_date <= ?
              AND document_group_id IS NOT NULL
            GROUP BY document_group_id, item_id, location_id, shop_id
            HAVING SUM(signed_type * quantity) = 0
            ORDER BY document_group_id, item_id, location_id, shop_id
            "#,
        )?;

        let groups = stmt
            .query_map(
                params![LEDGER_ACCOUNT_CLASS, cutoff.format("%Y-%m-%d").to_string()],
                map_balance_row,
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(groups)
    }

    /// 查询净余额大于零的分组（不限截止日期，仅用于报表）
    pub fn find_positive_balance_groups(&self, limit: usize) -> RepositoryResult<Vec<BalanceGroup>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT
                document_group_id,
                item_id,
                location_id,
                shop_id,
                SUM(CASE WHEN signed_type > 0 THEN quantity ELSE 0.0 END) AS total_purchases,
                SUM(CASE WHEN signed_type < 0 THEN quantity ELSE 0.0 END) AS total_sales,
                SUM(signed_type * quantity) AS net_balance,
                MAX(entry_date) AS last_entry_date,
                COUNT(*) AS entry_count
            FROM ledger_entry
            WHERE account_class = ?
              AND document_group_id IS NOT NULL
            GROUP BY document_group_id, item_id, location_id, shop_id
            HAVING SUM(signed_type * quantity) > 0
            ORDER BY document_group_id, item_id, location_id, shop_id
            LIMIT ?
            "#,
        )?;

        let groups = stmt
            .query_map(params![LEDGER_ACCOUNT_CLASS, limit as i64], map_balance_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(groups)
    }

    /// 净余额大于零的分组总数
    pub fn count_positive_balance_groups(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let count = conn.query_row(
            r#"
            SELECT COUNT(*) FROM (
                SELECT document_group_id
                FROM ledger_entry
                WHERE account_class = ?
                  AND document_group_id IS NOT NULL
                GROUP BY document_group_id, item_id, location_id, shop_id
                HAVING SUM(signed_type * quantity) > 0
            )
            "#,
            params![LEDGER_ACCOUNT_CLASS],
            |row| row.get(0),
        )?;

        Ok(count)
    }

    // ==========================================
    // 依赖记录查询
    // ==========================================

    /// 查询属于指定分组键集合、截止日期（含）前的全部分录及其行项目/单据头
    ///
    /// 说明：
    /// - 使用完整分组键元组做成员判断，不会误选仅部分键相同的其他分组；
    /// - 由于 SQLite 参数数量限制，内部按 GROUP_KEY_CHUNK_SIZE 分块查询；
    /// - 结果按 (分组键, 分录日期, 分录ID) 排序。
    pub fn find_deletion_candidates(
        &self,
        keys: &[GroupKey],
        cutoff: NaiveDate,
    ) -> RepositoryResult<Vec<PendingDeletion>> {
        if keys.is_empty() {
            return Ok(vec![]);
        }

        let conn = self.get_conn()?;
        let cutoff_str = cutoff.format("%Y-%m-%d").to_string();
        let mut out: Vec<PendingDeletion> = Vec::new();

        for chunk in keys.chunks(GROUP_KEY_CHUNK_SIZE) {
            let tuples = vec!["(?, ?, ?, ?)"; chunk.len()].join(", ");

            let sql = format!(
                r#"
                SELECT
                    le.id,
                    le.line_item_id,
                    li.header_id,
                    le.entry_date,
                    le.document_group_id,
                    le.item_id,
                    le.location_id,
                    le.shop_id
                FROM ledger_entry le
                INNER JOIN line_item li ON le.line_item_id = li.id
                INNER JOIN document_header dh ON li.header_id = dh.id
                WHERE le.account_class = ?
                  AND le.entry_date <= ?
                  AND (le.document_group_id, le.item_id, le.location_id, le.shop_id)
                      IN (VALUES {})
                "#,
                tuples
            );

            let mut params_vec: Vec<&dyn ToSql> = Vec::with_capacity(2 + chunk.len() * 4);
            params_vec.push(&LEDGER_ACCOUNT_CLASS);
            params_vec.push(&cutoff_str);
            for key in chunk {
                params_vec.push(&key.document_group_id);
                params_vec.push(&key.item_id);
                params_vec.push(&key.location_id);
                params_vec.push(&key.shop_id);
            }

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_vec.as_slice(), map_pending_row)?
                .collect::<SqliteResult<Vec<_>>>()?;
            out.extend(rows);
        }

        out.sort_by(|a, b| {
            a.group_key
                .cmp(&b.group_key)
                .then_with(|| a.entry_date.cmp(&b.entry_date))
                .then_with(|| a.ledger_entry_id.cmp(&b.ledger_entry_id))
        });

        Ok(out)
    }
}

fn map_balance_row(row: &Row) -> SqliteResult<BalanceGroup> {
    Ok(BalanceGroup {
        key: GroupKey {
            document_group_id: row.get(0)?,
            item_id: row.get(1)?,
            location_id: row.get(2)?,
            shop_id: row.get(3)?,
        },
        total_purchases: row.get(4)?,
        total_sales: row.get(5)?,
        net_balance: row.get(6)?,
        last_entry_date: row.get(7)?,
        entry_count: row.get(8)?,
    })
}

fn map_pending_row(row: &Row) -> SqliteResult<PendingDeletion> {
    Ok(PendingDeletion {
        ledger_entry_id: row.get(0)?,
        line_item_id: row.get(1)?,
        header_id: row.get(2)?,
        entry_date: row.get(3)?,
        group_key: GroupKey {
            document_group_id: row.get(4)?,
            item_id: row.get(5)?,
            location_id: row.get(6)?,
            shop_id: row.get(7)?,
        },
    })
}
