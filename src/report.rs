// ==========================================
// 库存台账清理工具 - 文本报告与 CSV 导出
// ==========================================
// 职责:
// - dry-run 计划输出（前 20 条 + "... and N more"）
// - 运行结果汇总文本
// - dry-run 待删除集合 CSV 导出
// 说明: 引擎只返回结构化数据，所有文本格式化集中在此
// ==========================================

use crate::api::CleanupRunReport;
use crate::domain::balance::PositiveBalanceReport;
use crate::domain::cleanup::{OrphanPlan, PendingDeletion, ZeroBalancePlan};
use crate::engine::CleanupReporter;
use std::error::Error;
use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};

/// dry-run 明细预览条数
pub const DRY_RUN_PREVIEW_LIMIT: usize = 20;

const RULE: &str = "==================================================";

// ==========================================
// TextReporter - 控制台文本报告
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct TextReporter {
    export_path: Option<PathBuf>,
}

impl TextReporter {
    pub fn new(export_path: Option<PathBuf>) -> Self {
        Self { export_path }
    }
}

impl CleanupReporter for TextReporter {
    fn report_zero_balance_plan(
        &self,
        plan: &ZeroBalancePlan,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        print!("{}", render_zero_balance_plan(plan));

        if let Some(path) = &self.export_path {
            export_pending_csv(path, &plan.pending)?;
            println!("待删除明细已导出: {}", path.display());
            tracing::info!(path = %path.display(), rows = plan.pending.len(), "dry-run 计划已导出");
        }
        Ok(())
    }

    fn report_zero_quantity_plan(&self, line_item_ids: &[i64]) -> Result<(), Box<dyn Error + Send + Sync>> {
        print!("{}", render_zero_quantity_plan(line_item_ids));
        Ok(())
    }

    fn report_orphan_plan(&self, plan: &OrphanPlan) -> Result<(), Box<dyn Error + Send + Sync>> {
        print!("{}", render_orphan_plan(plan));
        Ok(())
    }
}

// ==========================================
// 文本渲染
// ==========================================

fn push_more_line(out: &mut String, total: usize) {
    if total > DRY_RUN_PREVIEW_LIMIT {
        let _ = writeln!(out, "  ... and {} more", total - DRY_RUN_PREVIEW_LIMIT);
    }
}

pub fn render_zero_balance_plan(plan: &ZeroBalancePlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[DRY RUN] 零余额清理计划");
    let _ = writeln!(out, "  零余额分组: {}", plan.groups.len());
    let _ = writeln!(out, "  台账分录: {}", plan.stats.ledger_entries);
    let _ = writeln!(out, "  涉及行项目: {}", plan.stats.distinct_line_items);
    let _ = writeln!(out, "  涉及单据头: {}", plan.stats.distinct_headers);

    if !plan.pending.is_empty() {
        let _ = writeln!(
            out,
            "  {:>12} {:>12} {:>12} {:>12}  {}",
            "ledger_id", "line_item", "header", "entry_date", "group_key"
        );
        for p in plan.pending.iter().take(DRY_RUN_PREVIEW_LIMIT) {
            let _ = writeln!(
                out,
                "  {:>12} {:>12} {:>12} {:>12}  {}",
                p.ledger_entry_id, p.line_item_id, p.header_id, p.entry_date, p.group_key
            );
        }
        push_more_line(&mut out, plan.pending.len());
    }

    let _ = writeln!(
        out,
        "  行项目: 删除 {}，调整数量 {}",
        plan.reconcile.to_delete_line_items.len(),
        plan.reconcile.to_update_line_items.len()
    );
    for update in plan.reconcile.to_update_line_items.iter().take(DRY_RUN_PREVIEW_LIMIT) {
        let _ = writeln!(
            out,
            "    line_item={} {:.3} -> {:.3}",
            update.line_item_id, update.current_quantity, update.new_quantity
        );
    }
    push_more_line(&mut out, plan.reconcile.to_update_line_items.len());
    out
}

pub fn render_zero_quantity_plan(line_item_ids: &[i64]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[DRY RUN] 零数量行项目: {}", line_item_ids.len());
    for id in line_item_ids.iter().take(DRY_RUN_PREVIEW_LIMIT) {
        let _ = writeln!(out, "  line_item={}", id);
    }
    push_more_line(&mut out, line_item_ids.len());
    out
}

pub fn render_orphan_plan(plan: &OrphanPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[DRY RUN] 孤立单据头: {}", plan.headers.len());
    for h in plan.headers.iter().take(DRY_RUN_PREVIEW_LIMIT) {
        let _ = writeln!(
            out,
            "  header={} no={} form_date={} partner={} form_type={}",
            h.id, h.header_no, h.form_date, h.partner_id, h.form_type
        );
    }
    push_more_line(&mut out, plan.headers.len());
    out
}

pub fn render_positive_balance(report: &PositiveBalanceReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "剩余正余额分组: {}", report.total_groups);
    if report.groups.is_empty() {
        return out;
    }

    let _ = writeln!(
        out,
        "  {:>10} {:>10} {:>10} {:>10} {:>12} {:>8}",
        "group", "item", "location", "shop", "net_balance", "entries"
    );
    for g in &report.groups {
        let _ = writeln!(
            out,
            "  {:>10} {:>10} {:>10} {:>10} {:>12.3} {:>8}",
            g.key.document_group_id,
            g.key.item_id,
            g.key.location_id,
            g.key.shop_id,
            g.net_balance,
            g.entry_count
        );
    }
    let shown = report.groups.len() as i64;
    if report.total_groups > shown {
        let _ = writeln!(out, "  ... and {} more", report.total_groups - shown);
    }
    out
}

pub fn render_run_report(report: &CleanupRunReport) -> String {
    let mut out = String::new();
    let mode = if report.dry_run { "DRY RUN" } else { "LIVE" };

    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "库存台账清理结果 ({}) 截止日期: {}", mode, report.cutoff_date);
    let _ = writeln!(out, "{}", RULE);

    let zb = &report.zero_balance;
    let _ = writeln!(out, "STEP 1 零余额清理 [{}]", zb.pass_id);
    let _ = writeln!(out, "  台账分录删除: {}", zb.ledger_entries_affected);
    let _ = writeln!(out, "  行项目更新: {}", zb.line_items_updated);
    let _ = writeln!(out, "  行项目删除: {}", zb.line_items_deleted);

    if let Some(zq) = &report.zero_quantity {
        let _ = writeln!(out, "零数量行项目清扫 [{}]", zq.pass_id);
        let _ = writeln!(out, "  行项目删除: {}", zq.line_items_deleted);
    }

    let _ = writeln!(out, "STEP 2 孤立单据头清理 [{}]", report.orphan.pass_id);
    let _ = writeln!(out, "  单据头删除: {}", report.orphan.headers_deleted);

    let _ = writeln!(out, "STEP 3 汇总");
    out.push_str(&render_positive_balance(&report.positive_balance));
    let _ = writeln!(out, "{}", RULE);
    out
}

// ==========================================
// CSV 导出
// ==========================================

const PENDING_CSV_HEADERS: [&str; 8] = [
    "ledger_entry_id",
    "line_item_id",
    "header_id",
    "entry_date",
    "document_group_id",
    "item_id",
    "location_id",
    "shop_id",
];

/// 把待删除集合写入任意 writer
pub fn write_pending_csv<W: io::Write>(writer: W, pending: &[PendingDeletion]) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(PENDING_CSV_HEADERS)?;

    for p in pending {
        wtr.write_record(&[
            p.ledger_entry_id.to_string(),
            p.line_item_id.to_string(),
            p.header_id.to_string(),
            p.entry_date.clone(),
            p.group_key.document_group_id.to_string(),
            p.group_key.item_id.to_string(),
            p.group_key.location_id.to_string(),
            p.group_key.shop_id.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// 导出待删除集合到文件（覆盖写）
pub fn export_pending_csv(path: &Path, pending: &[PendingDeletion]) -> csv::Result<()> {
    let file = std::fs::File::create(path)?;
    write_pending_csv(file, pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::balance::{BalanceGroup, GroupKey};
    use crate::domain::ledger::DocumentHeader;

    fn key() -> GroupKey {
        GroupKey {
            document_group_id: 7,
            item_id: 1,
            location_id: 2,
            shop_id: 3,
        }
    }

    fn pending(n: i64) -> Vec<PendingDeletion> {
        (1..=n)
            .map(|id| PendingDeletion {
                ledger_entry_id: id,
                line_item_id: 100 + id,
                header_id: 1000,
                entry_date: "2023-05-01".to_string(),
                group_key: key(),
            })
            .collect()
    }

    #[test]
    fn test_zero_balance_plan_preview_is_truncated() {
        let plan = ZeroBalancePlan {
            pending: pending(25),
            ..ZeroBalancePlan::default()
        };

        let text = render_zero_balance_plan(&plan);

        assert!(text.contains("... and 5 more"));
        assert!(text.contains(" 20 "));
        assert!(!text.contains(" 121 "));
    }

    #[test]
    fn test_orphan_plan_without_overflow_has_no_more_line() {
        let plan = OrphanPlan {
            headers: vec![DocumentHeader {
                id: 9,
                header_no: "S-9".to_string(),
                form_date: "2023-01-01".to_string(),
                partner_id: 0,
                form_type: 0,
            }],
        };

        let text = render_orphan_plan(&plan);
        assert!(text.contains("header=9 no=S-9"));
        assert!(!text.contains("more"));
    }

    #[test]
    fn test_positive_balance_reports_hidden_groups() {
        let report = PositiveBalanceReport {
            groups: vec![BalanceGroup {
                key: key(),
                total_purchases: 10.0,
                total_sales: 4.0,
                net_balance: 6.0,
                last_entry_date: Some("2023-05-01".to_string()),
                entry_count: 2,
            }],
            total_groups: 12,
        };

        let text = render_positive_balance(&report);
        assert!(text.contains("剩余正余额分组: 12"));
        assert!(text.contains("6.000"));
        assert!(text.contains("... and 11 more"));
    }

    #[test]
    fn test_write_pending_csv() {
        let mut buf = Vec::new();
        write_pending_csv(&mut buf, &pending(2)).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "ledger_entry_id,line_item_id,header_id,entry_date,document_group_id,item_id,location_id,shop_id"
        );
        assert_eq!(lines[1], "1,101,1000,2023-05-01,7,1,2,3");
    }

    #[test]
    fn test_export_pending_csv_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.csv");

        export_pending_csv(&path, &pending(3)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);
    }
}
