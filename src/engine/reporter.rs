// ==========================================
// 库存台账清理工具 - 清理计划报告 Trait
// ==========================================
// 职责: dry-run 模式下把完整计划交给报告方（引擎本身不格式化文本）
// 说明: Engine 层定义 trait，报表层 (report.rs) 实现
// ==========================================

use crate::domain::cleanup::{OrphanPlan, ZeroBalancePlan};
use std::error::Error;

/// 清理计划报告者
pub trait CleanupReporter: Send + Sync {
    /// 报告零余额清理计划
    fn report_zero_balance_plan(
        &self,
        plan: &ZeroBalancePlan,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// 报告零数量行项目清扫计划
    fn report_zero_quantity_plan(&self, line_item_ids: &[i64]) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// 报告孤立单据头清理计划
    fn report_orphan_plan(&self, plan: &OrphanPlan) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作报告者
///
/// 用于不需要输出计划的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpCleanupReporter;

impl CleanupReporter for NoOpCleanupReporter {
    fn report_zero_balance_plan(
        &self,
        plan: &ZeroBalancePlan,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpCleanupReporter: 跳过零余额计划输出 - pending={}",
            plan.pending.len()
        );
        Ok(())
    }

    fn report_zero_quantity_plan(&self, line_item_ids: &[i64]) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpCleanupReporter: 跳过零数量行项目输出 - count={}",
            line_item_ids.len()
        );
        Ok(())
    }

    fn report_orphan_plan(&self, plan: &OrphanPlan) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpCleanupReporter: 跳过孤立单据头输出 - headers={}",
            plan.headers.len()
        );
        Ok(())
    }
}
