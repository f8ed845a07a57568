//! 組裝單工序聚合

use prodtrack_core::{Activity, PackSnapshot, QuantityBreakdown, Stage, StageFallback, StageFallbacks};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::external::{ExternalAggregate, ExternalAggregator};
use crate::stage_stats::{StageStats, StageStatsCalculator};

/// 單工序顯示數量
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageDisplay {
    /// 顯示分解
    pub breakdown: QuantityBreakdown,

    /// 顯示總量
    pub total: Decimal,
}

impl StageDisplay {
    fn from_breakdown(breakdown: QuantityBreakdown) -> Self {
        let total = breakdown.total();
        Self { breakdown, total }
    }
}

/// 單一組裝單的聚合結果
///
/// 交給行建構器與覆蓋/風險評估的唯一事實來源。
#[derive(Debug, Clone, Serialize)]
pub struct StageAggregation {
    /// 組裝單ID
    pub assembly_id: String,

    /// 訂購分解
    pub ordered: QuantityBreakdown,
    /// 訂購總量
    pub ordered_total: Decimal,

    /// 取消分解
    pub canceled: QuantityBreakdown,
    /// 取消總量
    pub canceled_total: Decimal,

    /// 沖減取消後的有效訂購分解（逐槽以 0 為下限）
    pub effective_ordered: QuantityBreakdown,
    /// 有效訂購總量
    pub effective_ordered_total: Decimal,

    /// 裁剪顯示數量
    pub display_cut: StageDisplay,
    /// 車縫顯示數量
    pub display_sew: StageDisplay,
    /// 後整顯示數量
    pub display_finish: StageDisplay,
    /// 裝箱顯示數量
    pub display_pack: StageDisplay,
    /// 品檢顯示數量
    pub display_qc: StageDisplay,

    /// 各工序統計
    pub stats: HashMap<Stage, StageStats>,

    /// 外發工序聚合（首見順序）
    pub externals: Vec<ExternalAggregate>,

    /// 車縫資料是否開始流入（有活動或非零後備）
    pub has_sew_data: bool,
    /// 後整資料是否開始流入
    pub has_finish_data: bool,
    /// 裝箱資料是否開始流入
    pub has_pack_data: bool,
}

impl StageAggregation {
    /// 取得某工序的統計（未計算的工序返回空統計）
    pub fn stats_for(&self, stage: Stage) -> StageStats {
        self.stats.get(&stage).cloned().unwrap_or_default()
    }
}

/// 單一組裝單的聚合輸入（批次評估用）
#[derive(Debug, Clone)]
pub struct AggregationRequest {
    /// 組裝單ID
    pub assembly_id: String,

    /// 訂購分解
    pub ordered: QuantityBreakdown,

    /// 各工序後備數量
    pub fallbacks: StageFallbacks,

    /// 裝箱快照
    pub pack_snapshot: PackSnapshot,

    /// 活動清單
    pub activities: Vec<Activity>,
}

/// 組裝單工序聚合器
pub struct StageAggregator;

impl StageAggregator {
    /// 聚合單一組裝單
    ///
    /// 純函數：相同輸入必得相同輸出，異常資料一律經由
    /// 數量正規化退化為 0，不拋出錯誤。
    pub fn aggregate(
        assembly_id: &str,
        ordered: &QuantityBreakdown,
        fallbacks: &StageFallbacks,
        pack_snapshot: &PackSnapshot,
        activities: &[Activity],
    ) -> StageAggregation {
        tracing::debug!(
            "聚合組裝單 {}：活動 {} 筆",
            assembly_id,
            activities.len()
        );

        // Step 1: 取消沖減
        let ordered = QuantityBreakdown::normalize(ordered.as_slice(), Decimal::ZERO, false);
        let mut canceled = QuantityBreakdown::new();
        for activity in activities.iter().filter(|a| a.stage == Stage::Cancel) {
            canceled.add_into(&activity.normalized_breakdown());
        }
        let effective_ordered = QuantityBreakdown::saturating_sub(&ordered, &canceled);

        // Step 2: 各工序統計（裝箱以箱單快照為後備並啟用全次品替代，品檢無後備）
        let cut = StageStatsCalculator::calculate(
            Stage::Cut,
            activities,
            &fallbacks.for_stage(Stage::Cut),
            false,
        );
        let sew = StageStatsCalculator::calculate(
            Stage::Sew,
            activities,
            &fallbacks.for_stage(Stage::Sew),
            false,
        );
        let finish = StageStatsCalculator::calculate(
            Stage::Finish,
            activities,
            &fallbacks.for_stage(Stage::Finish),
            false,
        );
        let pack_fallback =
            StageFallback::new(pack_snapshot.breakdown.clone(), pack_snapshot.total);
        let pack = StageStatsCalculator::calculate(Stage::Pack, activities, &pack_fallback, true);
        let qc = StageStatsCalculator::calculate(
            Stage::Qc,
            activities,
            &StageFallback::default(),
            false,
        );

        let has_sew_data = sew.activity_count > 0 || fallbacks.for_stage(Stage::Sew).has_data();
        let has_finish_data =
            finish.activity_count > 0 || fallbacks.for_stage(Stage::Finish).has_data();
        let has_pack_data = pack.activity_count > 0 || pack_snapshot.has_data();

        // Step 3: 順向可用量閘控（資料尚未流入的工序不閘控）
        let usable_cut = cut.usable.clone();
        let usable_sew = if has_sew_data {
            QuantityBreakdown::element_min(&sew.usable, &usable_cut)
        } else {
            sew.usable.clone()
        };
        let upstream_for_finish = if has_sew_data { &usable_sew } else { &usable_cut };
        let usable_finish = if has_finish_data {
            QuantityBreakdown::element_min(&finish.usable, upstream_for_finish)
        } else {
            finish.usable.clone()
        };
        let usable_pack = if has_pack_data {
            QuantityBreakdown::element_min(&pack.usable, &usable_finish)
        } else {
            pack.usable.clone()
        };

        // Step 4: 逆向顯示封頂（下游短缺回頭壓低上游的「已完成」量）；
        // 未開始的裝箱顯示為全零，不得借用後整數值
        let display_cut = if has_sew_data {
            QuantityBreakdown::element_min(&usable_cut, &usable_sew)
        } else {
            usable_cut
        };
        let display_sew = if has_finish_data {
            QuantityBreakdown::element_min(&usable_sew, &usable_finish)
        } else {
            usable_sew
        };
        let display_pack = if has_pack_data {
            usable_pack
        } else {
            QuantityBreakdown::zero_filled(usable_finish.len())
        };
        let display_finish = usable_finish;
        let display_qc = qc.usable.clone();

        // Step 5: 外發聚合與總量
        let externals = ExternalAggregator::aggregate(activities);

        let mut stats = HashMap::new();
        stats.insert(Stage::Cut, cut);
        stats.insert(Stage::Sew, sew);
        stats.insert(Stage::Finish, finish);
        stats.insert(Stage::Pack, pack);
        stats.insert(Stage::Qc, qc);

        StageAggregation {
            assembly_id: assembly_id.to_string(),
            ordered_total: ordered.total(),
            canceled_total: canceled.total(),
            effective_ordered_total: effective_ordered.total(),
            ordered,
            canceled,
            effective_ordered,
            display_cut: StageDisplay::from_breakdown(display_cut),
            display_sew: StageDisplay::from_breakdown(display_sew),
            display_finish: StageDisplay::from_breakdown(display_finish),
            display_pack: StageDisplay::from_breakdown(display_pack),
            display_qc: StageDisplay::from_breakdown(display_qc),
            stats,
            externals,
            has_sew_data,
            has_finish_data,
            has_pack_data,
        }
    }

    /// 批次聚合
    ///
    /// 各組裝單相互獨立且輸入唯讀，可安全並行。
    pub fn aggregate_batch(requests: &[AggregationRequest]) -> Vec<StageAggregation> {
        tracing::info!("開始批次聚合：組裝單 {} 筆", requests.len());
        let start_time = std::time::Instant::now();

        let results: Vec<StageAggregation> = requests
            .par_iter()
            .map(|req| {
                Self::aggregate(
                    &req.assembly_id,
                    &req.ordered,
                    &req.fallbacks,
                    &req.pack_snapshot,
                    &req.activities,
                )
            })
            .collect();

        tracing::info!("批次聚合完成，耗時 {:?}", start_time.elapsed());
        results
    }
}
