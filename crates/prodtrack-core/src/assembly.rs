//! 組裝單模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::activity::Stage;
use crate::breakdown::QuantityBreakdown;

/// 組裝單
///
/// 一張生產工單，按尺寸段拆分訂購數量。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assembly {
    /// 組裝單ID
    pub id: String,

    /// 訂購數量分解
    pub ordered: QuantityBreakdown,

    /// 目標交期
    pub target_date: Option<NaiveDate>,

    /// 最後交期
    pub drop_dead_date: Option<NaiveDate>,
}

impl Assembly {
    /// 創建新的組裝單
    pub fn new(id: String, ordered: QuantityBreakdown) -> Self {
        Self {
            id,
            ordered,
            target_date: None,
            drop_dead_date: None,
        }
    }

    /// 建構器模式：設置目標交期
    pub fn with_target_date(mut self, date: NaiveDate) -> Self {
        self.target_date = Some(date);
        self
    }

    /// 建構器模式：設置最後交期
    pub fn with_drop_dead_date(mut self, date: NaiveDate) -> Self {
        self.drop_dead_date = Some(date);
        self
    }

    /// 物料需用日期：優先目標交期，其次最後交期
    pub fn needed_date(&self) -> Option<NaiveDate> {
        self.target_date.or(self.drop_dead_date)
    }
}

/// 裝箱快照
///
/// 由資料層將所有箱單明細合併而成：分解逐槽相加、總量累計。
/// 裝箱工序無活動記錄時以此為後備。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackSnapshot {
    /// 合併後的分解
    pub breakdown: QuantityBreakdown,

    /// 合併後的總量
    pub total: Decimal,
}

impl PackSnapshot {
    /// 從箱單明細合併
    pub fn from_box_lines(lines: &[QuantityBreakdown]) -> Self {
        let mut breakdown = QuantityBreakdown::new();
        for line in lines {
            breakdown.add_into(line);
        }
        let total = breakdown.total();
        Self { breakdown, total }
    }

    /// 是否有裝箱資料
    pub fn has_data(&self) -> bool {
        !self.breakdown.is_zero() || self.total > Decimal::ZERO
    }
}

/// 單一工序的後備數量
///
/// 舊系統只保存了每工序的合計，沒有活動明細；
/// 該工序無活動記錄時以此後備值呈現。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageFallback {
    /// 後備分解
    pub breakdown: QuantityBreakdown,

    /// 後備總量
    pub total: Decimal,
}

impl StageFallback {
    /// 創建後備數量
    pub fn new(breakdown: QuantityBreakdown, total: Decimal) -> Self {
        Self { breakdown, total }
    }

    /// 是否有非零資料
    pub fn has_data(&self) -> bool {
        !self.breakdown.is_zero() || self.total > Decimal::ZERO
    }
}

/// 各工序的後備數量集合
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageFallbacks {
    per_stage: HashMap<Stage, StageFallback>,
}

impl StageFallbacks {
    /// 創建空的後備集合
    pub fn new() -> Self {
        Self {
            per_stage: HashMap::new(),
        }
    }

    /// 建構器模式：設置某工序的後備數量
    pub fn with_stage(mut self, stage: Stage, fallback: StageFallback) -> Self {
        self.per_stage.insert(stage, fallback);
        self
    }

    /// 取得某工序的後備數量（未設置時為空後備）
    pub fn for_stage(&self, stage: Stage) -> StageFallback {
        self.per_stage.get(&stage).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needed_date_priority() {
        let target = NaiveDate::from_ymd_opt(2026, 4, 10).unwrap();
        let drop_dead = NaiveDate::from_ymd_opt(2026, 4, 20).unwrap();

        let both = Assembly::new("ASM-001".to_string(), QuantityBreakdown::new())
            .with_target_date(target)
            .with_drop_dead_date(drop_dead);
        assert_eq!(both.needed_date(), Some(target));

        let only_drop_dead = Assembly::new("ASM-002".to_string(), QuantityBreakdown::new())
            .with_drop_dead_date(drop_dead);
        assert_eq!(only_drop_dead.needed_date(), Some(drop_dead));

        let neither = Assembly::new("ASM-003".to_string(), QuantityBreakdown::new());
        assert_eq!(neither.needed_date(), None);
    }

    #[test]
    fn test_pack_snapshot_merges_box_lines() {
        let lines = vec![
            QuantityBreakdown::from_slots(vec![Decimal::from(5), Decimal::from(3)]),
            QuantityBreakdown::from_slots(vec![Decimal::from(2), Decimal::from(4), Decimal::from(1)]),
        ];

        let snapshot = PackSnapshot::from_box_lines(&lines);
        assert_eq!(snapshot.breakdown.slot(0), Decimal::from(7));
        assert_eq!(snapshot.breakdown.slot(1), Decimal::from(7));
        assert_eq!(snapshot.breakdown.slot(2), Decimal::from(1));
        assert_eq!(snapshot.total, Decimal::from(15));
        assert!(snapshot.has_data());
    }

    #[test]
    fn test_stage_fallbacks_lookup() {
        let fallbacks = StageFallbacks::new().with_stage(
            Stage::Cut,
            StageFallback::new(
                QuantityBreakdown::from_slots(vec![Decimal::from(30)]),
                Decimal::from(30),
            ),
        );

        assert!(fallbacks.for_stage(Stage::Cut).has_data());
        // 未設置的工序返回空後備
        assert!(!fallbacks.for_stage(Stage::Sew).has_data());
    }
}
