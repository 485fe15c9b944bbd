// ==========================================
// 库存台账清理工具 - 命令行入口
// ==========================================
// 配置优先级: 命令行参数 > 环境变量 > .env > 默认值
// ==========================================

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ledger_cleanup::config::CleanupConfig;
use ledger_cleanup::engine::CleanupReporter;
use ledger_cleanup::report::{render_run_report, TextReporter};
use ledger_cleanup::{logging, CleanupApi};

#[derive(Parser, Debug)]
#[command(name = "ledger-cleanup", version, about = "库存台账清理: 零余额分组与孤立单据头")]
struct Cli {
    /// SQLite 数据库文件
    #[arg(long)]
    db_path: Option<String>,

    /// 截止日期（含），格式 YYYY-MM-DD
    #[arg(long)]
    cutoff_date: Option<String>,

    /// 只输出计划，不写入
    #[arg(long)]
    dry_run: bool,

    /// 日志文件路径
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// 在 STEP 1 与 STEP 2 之间清扫数量已归零的行项目
    #[arg(long)]
    sweep_zero_quantity: bool,

    /// dry-run 时把待删除明细导出为 CSV
    #[arg(long)]
    export: Option<PathBuf>,

    /// 数据库缺表时自动建表（测试库/新库）
    #[arg(long)]
    init_schema: bool,

    /// 以 JSON 输出结果汇总
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn apply_to(self, mut config: CleanupConfig) -> CleanupConfig {
        if let Some(db_path) = self.db_path {
            config.db_path = db_path;
        }
        if let Some(cutoff_date) = self.cutoff_date {
            config.cutoff_date = cutoff_date;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = log_file;
        }
        if let Some(export) = self.export {
            config.dry_run_export = Some(export);
        }
        config.dry_run |= self.dry_run;
        config.sweep_zero_quantity |= self.sweep_zero_quantity;
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let init_schema = cli.init_schema;
    let json = cli.json;
    let config = cli.apply_to(CleanupConfig::from_env());

    logging::init(Some(config.log_file.as_path()))
        .with_context(|| format!("无法初始化日志文件: {}", config.log_file.display()))?;

    tracing::info!("==================================================");
    tracing::info!("{} v{}", ledger_cleanup::APP_NAME, ledger_cleanup::VERSION);
    tracing::info!(log_file = %config.log_file.display(), "日志文件");
    tracing::info!("==================================================");

    let db_path = config.db_path.clone();
    let reporter: Arc<dyn CleanupReporter> =
        Arc::new(TextReporter::new(config.dry_run_export.clone()));
    // 先校验截止日期与配置，再打开数据库
    let api = CleanupApi::open(config, Some(reporter), init_schema)
        .with_context(|| format!("无法启动清理: {}", db_path))?;

    let report = api.run().context("清理失败，当前步骤已回滚")?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("结果序列化失败")?
        );
    } else {
        print!("{}", render_run_report(&report));
    }

    Ok(())
}
