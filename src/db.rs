// ==========================================
// 库存台账清理工具 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少外部写入并发时的偶发 busy 错误
// - 统一清理事务的开启方式（IMMEDIATE）
// ==========================================

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 台账相关表结构（仅用于新库/测试库初始化，不做迁移）
const LEDGER_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS document_header (
    id          INTEGER PRIMARY KEY,
    header_no   TEXT    NOT NULL,
    form_date   TEXT    NOT NULL,
    partner_id  INTEGER NOT NULL DEFAULT 0,
    form_type   INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS line_item (
    id          INTEGER PRIMARY KEY,
    header_id   INTEGER NOT NULL REFERENCES document_header(id),
    quantity    REAL    NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS ledger_entry (
    id                 INTEGER PRIMARY KEY,
    account_class      INTEGER NOT NULL,
    document_group_id  INTEGER,
    item_id            INTEGER NOT NULL,
    location_id        INTEGER NOT NULL,
    shop_id            INTEGER NOT NULL,
    signed_type        INTEGER NOT NULL,
    quantity           REAL    NOT NULL,
    entry_date         TEXT    NOT NULL,
    line_item_id       INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ledger_entry_group
    ON ledger_entry(account_class, document_group_id, item_id, location_id, shop_id, entry_date);
CREATE INDEX IF NOT EXISTS idx_ledger_entry_line_item
    ON ledger_entry(line_item_id);
CREATE INDEX IF NOT EXISTS idx_line_item_header
    ON line_item(header_id);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 创建台账相关表（若不存在）
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(LEDGER_SCHEMA_SQL)
}

/// 开启一轮清理的事务
///
/// 使用 IMMEDIATE：在 BEGIN 时即获取写锁，核销阶段的重读与写入
/// 对其他写入方串行化（避免规划快照与重读之间的不可重复读）。
/// 事务对象 drop 时若未 commit 自动回滚。
pub fn begin_pass_transaction(conn: &mut Connection) -> rusqlite::Result<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
}

/// 默认数据库路径（用户数据目录，不读取环境变量）
pub fn get_default_db_path() -> String {
    let mut path = PathBuf::from("./ledger.db");
    if let Some(data_dir) = dirs::data_dir() {
        path = data_dir.join("ledger-cleanup").join("ledger.db");
    }

    path.to_string_lossy().to_string()
}
