// ==========================================
// 库存台账清理工具 - 批量删除器
// ==========================================
// 职责: 按固定批次大小删除指定表中的 ID 集合
// 约束:
// - 只能在已开启的事务内调用（参数类型为 &Transaction）
// - 各批次共享调用方事务，批次边界无业务含义，不单独提交
// - 表名来自封闭枚举，不拼接外部数据；ID 全部参数绑定
// ==========================================

use crate::domain::types::DELETE_BATCH_SIZE;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params_from_iter, Transaction};
use std::fmt;

// ==========================================
// CleanupTable - 可被清理的表
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleanupTable {
    LedgerEntry,
    LineItem,
    DocumentHeader,
}

impl CleanupTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            CleanupTable::LedgerEntry => "ledger_entry",
            CleanupTable::LineItem => "line_item",
            CleanupTable::DocumentHeader => "document_header",
        }
    }
}

impl fmt::Display for CleanupTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// 按默认批次大小 (1000) 删除
///
/// # 返回
/// - Ok(rows): 实际删除的行数
/// - Err(BatchDeleteFailed): 携带表名、批次位置与 ID 总数
pub fn delete_by_ids(
    tx: &Transaction<'_>,
    table: CleanupTable,
    ids: &[i64],
) -> RepositoryResult<usize> {
    delete_by_ids_in_batches(tx, table, ids, DELETE_BATCH_SIZE)
}

/// 按指定批次大小删除
pub fn delete_by_ids_in_batches(
    tx: &Transaction<'_>,
    table: CleanupTable,
    ids: &[i64],
    batch_size: usize,
) -> RepositoryResult<usize> {
    if ids.is_empty() {
        return Ok(0);
    }
    if batch_size == 0 {
        return Err(RepositoryError::InternalError(
            "batch_size 必须大于 0".to_string(),
        ));
    }

    let mut deleted = 0usize;
    for (batch_index, chunk) in ids.chunks(batch_size).enumerate() {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!(
            "DELETE FROM {} WHERE id IN ({})",
            table.table_name(),
            placeholders
        );

        let rows = tx
            .execute(&sql, params_from_iter(chunk.iter()))
            .map_err(|e| RepositoryError::BatchDeleteFailed {
                table: table.table_name().to_string(),
                batch_offset: batch_index * batch_size,
                batch_size: chunk.len(),
                total_ids: ids.len(),
                message: e.to_string(),
            })?;

        tracing::debug!(
            table = table.table_name(),
            batch = batch_index,
            requested = chunk.len(),
            rows,
            "batch delete"
        );
        deleted += rows;
    }

    Ok(deleted)
}
