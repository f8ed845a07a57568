//! 單工序統計計算

use prodtrack_core::{Activity, ActivityAction, QuantityBreakdown, Stage, StageFallback};
use rust_decimal::Decimal;
use serde::Serialize;

/// 單工序統計結果
///
/// 每次聚合呼叫都從活動清單重新計算，不做持久化。
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageStats {
    /// 正常產出分解
    pub good: QuantityBreakdown,
    /// 正常產出總量
    pub good_total: Decimal,

    /// 次品分解
    pub defect: QuantityBreakdown,
    /// 次品總量
    pub defect_total: Decimal,

    /// 次品登錄分解（動作為登錄或缺漏）
    pub defect_logged: QuantityBreakdown,
    /// 次品登錄總量
    pub defect_logged_total: Decimal,

    /// 損耗沖銷分解
    pub defect_reconciled: QuantityBreakdown,
    /// 損耗沖銷總量
    pub defect_reconciled_total: Decimal,

    /// 經手分解（正常 + 次品）
    pub processed: QuantityBreakdown,
    /// 經手總量
    pub processed_total: Decimal,

    /// 可用分解（正常產出）
    pub usable: QuantityBreakdown,
    /// 可用總量
    pub usable_total: Decimal,

    /// 嘗試分解（同經手）
    pub attempts: QuantityBreakdown,
    /// 嘗試總量
    pub attempts_total: Decimal,

    /// 該工序的活動筆數
    pub activity_count: usize,
}

/// 單工序統計計算器
pub struct StageStatsCalculator;

impl StageStatsCalculator {
    /// 計算單工序統計
    ///
    /// # 參數
    /// * `stage` - 目標工序，僅折疊該工序的內部活動（外發往返活動不計入）
    /// * `fallback` - 無活動記錄時的後備數量（舊系統只存合計的相容路徑）
    /// * `use_fallback_if_no_normal` - 有活動但全為次品時，是否以後備值
    ///   替代正常產出（裝箱工序專用：缺口以次品記錄、實際裝箱量在箱單上）
    pub fn calculate(
        stage: Stage,
        activities: &[Activity],
        fallback: &StageFallback,
        use_fallback_if_no_normal: bool,
    ) -> StageStats {
        let stage_activities: Vec<&Activity> = activities
            .iter()
            .filter(|a| a.stage == stage && !a.is_external())
            .collect();

        // 舊資料相容路徑：無任何活動時以後備值原樣呈現，次品為零
        if stage_activities.is_empty() {
            let good =
                QuantityBreakdown::normalize(fallback.breakdown.as_slice(), fallback.total, true);
            let good_total = good.total();
            return StageStats {
                processed: good.clone(),
                processed_total: good_total,
                usable: good.clone(),
                usable_total: good_total,
                attempts: good.clone(),
                attempts_total: good_total,
                good,
                good_total,
                ..StageStats::default()
            };
        }

        let mut good = QuantityBreakdown::new();
        let mut defect = QuantityBreakdown::new();
        let mut defect_logged = QuantityBreakdown::new();
        let mut defect_reconciled = QuantityBreakdown::new();

        for activity in &stage_activities {
            let breakdown = activity.normalized_breakdown();
            if activity.is_defect() {
                defect.add_into(&breakdown);
                match activity.action {
                    Some(ActivityAction::LossReconciled) => {
                        defect_reconciled.add_into(&breakdown)
                    }
                    _ => defect_logged.add_into(&breakdown),
                }
            } else {
                good.add_into(&breakdown);
            }
        }

        // 裝箱替代：全為次品且有後備值時，以後備值充當正常產出
        if use_fallback_if_no_normal && good.is_zero() && fallback.has_data() {
            good = QuantityBreakdown::normalize(fallback.breakdown.as_slice(), fallback.total, true);
        }

        let mut processed = good.clone();
        processed.add_into(&defect);

        StageStats {
            good_total: good.total(),
            defect_total: defect.total(),
            defect_logged_total: defect_logged.total(),
            defect_reconciled_total: defect_reconciled.total(),
            processed_total: processed.total(),
            usable: good.clone(),
            usable_total: good.total(),
            attempts: processed.clone(),
            attempts_total: processed.total(),
            good,
            defect,
            defect_logged,
            defect_reconciled,
            processed,
            activity_count: stage_activities.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodtrack_core::ActivityKind;

    fn bd(slots: &[i64]) -> QuantityBreakdown {
        QuantityBreakdown::from_slots(slots.iter().map(|q| Decimal::from(*q)).collect())
    }

    fn activity(stage: Stage, kind: ActivityKind, slots: &[i64]) -> Activity {
        let breakdown = bd(slots);
        let total = breakdown.total();
        Activity::new("ASM-001".to_string(), stage, kind, total).with_breakdown(breakdown)
    }

    #[test]
    fn test_good_and_defect_accumulation() {
        let activities = vec![
            activity(Stage::Cut, ActivityKind::Normal, &[10, 20]),
            activity(Stage::Cut, ActivityKind::Normal, &[5, 0, 3]),
            activity(Stage::Cut, ActivityKind::Defect, &[1, 2]),
            // 其他工序的活動不計入
            activity(Stage::Sew, ActivityKind::Normal, &[99]),
        ];

        let stats = StageStatsCalculator::calculate(
            Stage::Cut,
            &activities,
            &StageFallback::default(),
            false,
        );

        assert_eq!(stats.activity_count, 3);
        assert_eq!(stats.good_total, Decimal::from(38));
        assert_eq!(stats.defect_total, Decimal::from(3));
        assert_eq!(stats.processed_total, Decimal::from(41));
        assert_eq!(stats.processed.slot(0), Decimal::from(16));
        assert_eq!(stats.usable_total, stats.good_total);
        assert_eq!(stats.attempts_total, stats.processed_total);
    }

    #[test]
    fn test_defect_action_subtotals() {
        let activities = vec![
            activity(Stage::Finish, ActivityKind::Defect, &[4]).with_action(ActivityAction::DefectLogged),
            activity(Stage::Finish, ActivityKind::Defect, &[2]).with_action(ActivityAction::LossReconciled),
            // 動作缺漏的次品歸入登錄
            activity(Stage::Finish, ActivityKind::Defect, &[1]),
        ];

        let stats = StageStatsCalculator::calculate(
            Stage::Finish,
            &activities,
            &StageFallback::default(),
            false,
        );

        assert_eq!(stats.defect_total, Decimal::from(7));
        assert_eq!(stats.defect_logged_total, Decimal::from(5));
        assert_eq!(stats.defect_reconciled_total, Decimal::from(2));
    }

    #[test]
    fn test_no_activities_uses_fallback_verbatim() {
        let fallback = StageFallback::new(bd(&[7, 8]), Decimal::from(15));

        let stats = StageStatsCalculator::calculate(Stage::Sew, &[], &fallback, false);

        assert_eq!(stats.activity_count, 0);
        assert_eq!(stats.good_total, Decimal::from(15));
        assert_eq!(stats.usable.slot(1), Decimal::from(8));
        assert_eq!(stats.defect_total, Decimal::ZERO);
        assert_eq!(stats.processed_total, Decimal::from(15));
    }

    #[test]
    fn test_no_activities_fallback_total_only() {
        // 舊資料只有合計沒有分解：退回單槽位
        let fallback = StageFallback::new(QuantityBreakdown::new(), Decimal::from(42));

        let stats = StageStatsCalculator::calculate(Stage::Cut, &[], &fallback, false);

        assert_eq!(stats.good.len(), 1);
        assert_eq!(stats.good_total, Decimal::from(42));
    }

    #[test]
    fn test_pack_all_defect_substitutes_fallback() {
        // 裝箱只記了缺口（次品），實際裝箱量在箱單快照上
        let activities = vec![activity(Stage::Pack, ActivityKind::Defect, &[0, 2])];
        let fallback = StageFallback::new(bd(&[10, 8]), Decimal::from(18));

        let stats = StageStatsCalculator::calculate(Stage::Pack, &activities, &fallback, true);

        assert_eq!(stats.good_total, Decimal::from(18));
        assert_eq!(stats.defect_total, Decimal::from(2));
        // 經手 = 替代後的正常 + 次品
        assert_eq!(stats.processed.slot(1), Decimal::from(10));
    }

    #[test]
    fn test_pack_with_good_keeps_records() {
        // 有正常產出時不做替代
        let activities = vec![
            activity(Stage::Pack, ActivityKind::Normal, &[6]),
            activity(Stage::Pack, ActivityKind::Defect, &[1]),
        ];
        let fallback = StageFallback::new(bd(&[50]), Decimal::from(50));

        let stats = StageStatsCalculator::calculate(Stage::Pack, &activities, &fallback, true);

        assert_eq!(stats.good_total, Decimal::from(6));
        assert_eq!(stats.processed_total, Decimal::from(7));
    }

    #[test]
    fn test_external_activities_excluded() {
        let external = Activity::new(
            "ASM-001".to_string(),
            Stage::Sew,
            ActivityKind::Normal,
            Decimal::from(30),
        )
        .with_action(ActivityAction::SentOut)
        .with_external_step("embroidery".to_string());

        let stats = StageStatsCalculator::calculate(
            Stage::Sew,
            &[external],
            &StageFallback::default(),
            false,
        );

        // 外發往返不計入工序內部統計，走無活動後備路徑
        assert_eq!(stats.activity_count, 0);
        assert_eq!(stats.good_total, Decimal::ZERO);
    }
}
