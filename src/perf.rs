// ==========================================
// 库存台账清理工具 - 清理轮次计时
// ==========================================
// 每轮清理按阶段记录耗时与 SQL 语句数，轮次结束时输出一条汇总日志
// 日志 target:
// - "perf": 阶段明细（debug）与轮次汇总（info）
// - "slow_sql": 超过阈值的单条语句（warn）
// ==========================================

use crate::domain::types::PassKind;
use crate::engine::error::CleanupStage;
use rusqlite::Connection;
use std::cell::Cell;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 慢 SQL 阈值（毫秒），0 表示不输出慢 SQL 日志
static SLOW_SQL_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);

thread_local! {
    // 清理是单线程、单连接，语句统计按线程累计
    static SQL_COUNT: Cell<u64> = Cell::new(0);
}

/// 在连接上安装语句统计
///
/// 安装后每条执行完成的语句都会计入当前线程的 SQL 计数；
/// 耗时 ≥ `slow_sql_ms` 的语句额外输出 warn 日志。
pub fn install_sql_counter(conn: &mut Connection, slow_sql_ms: u64) {
    SLOW_SQL_THRESHOLD_MS.store(slow_sql_ms, Ordering::Relaxed);
    conn.profile(Some(sql_profile_callback));
}

fn sql_profile_callback(sql: &str, duration: Duration) {
    SQL_COUNT.with(|c| c.set(c.get().saturating_add(1)));

    let ms = duration.as_millis() as u64;
    let threshold = SLOW_SQL_THRESHOLD_MS.load(Ordering::Relaxed);
    if threshold > 0 && ms >= threshold {
        tracing::warn!(
            target: "slow_sql",
            duration_ms = ms,
            sql = %truncate_sql(sql, 420),
            "slow sql"
        );
    }
}

/// 当前线程累计执行的语句数
pub fn sql_count() -> u64 {
    SQL_COUNT.with(|c| c.get())
}

fn truncate_sql(sql: &str, max_len: usize) -> String {
    let s = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if s.chars().count() <= max_len {
        return s;
    }
    let head: String = s.chars().take(max_len).collect();
    format!("{}…", head)
}

// ==========================================
// StageTiming - 单个阶段的耗时与语句数
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct StageTiming {
    pub stage: CleanupStage,
    pub elapsed_ms: u64,
    pub sql_count: u64,
}

// ==========================================
// PassTimer - 单轮清理计时器
// ==========================================
// drop 时输出汇总（提前返回与失败路径同样记录）
pub struct PassTimer {
    pass: PassKind,
    pass_id: String,
    start: Instant,
    sql_start: u64,
    stages: Vec<StageTiming>,
}

impl PassTimer {
    pub fn new(pass: PassKind, pass_id: &str) -> Self {
        Self {
            pass,
            pass_id: pass_id.to_string(),
            start: Instant::now(),
            sql_start: sql_count(),
            stages: Vec::new(),
        }
    }

    /// 执行一个阶段并记录耗时（无论成功与否）
    pub fn measure<T>(&mut self, stage: CleanupStage, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let sql_before = sql_count();

        let result = f();

        let timing = StageTiming {
            stage,
            elapsed_ms: start.elapsed().as_millis() as u64,
            sql_count: sql_count().saturating_sub(sql_before),
        };
        tracing::debug!(
            target: "perf",
            pass = %self.pass,
            pass_id = %self.pass_id,
            stage = %timing.stage,
            elapsed_ms = timing.elapsed_ms,
            sql_count = timing.sql_count,
            "stage done"
        );
        self.stages.push(timing);

        result
    }

    pub fn stages(&self) -> &[StageTiming] {
        &self.stages
    }

    /// 阶段明细: "AGGREGATE=3ms/1sql RESOLVE=5ms/2sql"
    fn stage_breakdown(&self) -> String {
        let mut out = String::new();
        for (i, timing) in self.stages.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(
                out,
                "{}={}ms/{}sql",
                timing.stage, timing.elapsed_ms, timing.sql_count
            );
        }
        out
    }
}

impl Drop for PassTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        let sql_count = sql_count().saturating_sub(self.sql_start);

        tracing::info!(
            target: "perf",
            pass = %self.pass,
            pass_id = %self.pass_id,
            elapsed_ms,
            sql_count,
            stages = %self.stage_breakdown(),
            "pass done"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_sql() {
        assert_eq!(truncate_sql("SELECT 1", 100), "SELECT 1");
        assert_eq!(truncate_sql("SELECT\n    1", 100), "SELECT 1");
        assert_eq!(truncate_sql("SELECT * FROM ledger_entry", 6), "SELECT…");
    }

    #[test]
    fn test_stages_recorded_in_order_with_sql_counts() {
        let mut conn = Connection::open_in_memory().unwrap();
        install_sql_counter(&mut conn, 0);
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY)").unwrap();

        let mut timer = PassTimer::new(PassKind::ZeroBalance, "pass-1");
        let inserted = timer.measure(CleanupStage::DeleteLedgerEntries, || {
            conn.execute("INSERT INTO t (id) VALUES (1)", []).unwrap()
                + conn.execute("INSERT INTO t (id) VALUES (2)", []).unwrap()
        });
        timer.measure(CleanupStage::Commit, || ());

        assert_eq!(inserted, 2);
        let stages: Vec<CleanupStage> = timer.stages().iter().map(|t| t.stage).collect();
        assert_eq!(
            stages,
            vec![CleanupStage::DeleteLedgerEntries, CleanupStage::Commit]
        );
        assert_eq!(timer.stages()[0].sql_count, 2);
        assert_eq!(timer.stages()[1].sql_count, 0);
    }

    #[test]
    fn test_failed_stage_is_still_recorded() {
        let mut timer = PassTimer::new(PassKind::Orphan, "pass-2");
        let result: Result<(), &str> = timer.measure(CleanupStage::FindOrphans, || Err("boom"));

        assert!(result.is_err());
        assert_eq!(timer.stages().len(), 1);
        assert_eq!(timer.stages()[0].stage, CleanupStage::FindOrphans);
        assert!(timer.stage_breakdown().starts_with("FIND_ORPHANS="));
    }
}
