//! 工序顯示行建構
//!
//! `StageAggregation` 的純投影，不引入新狀態。

use chrono::NaiveDate;
use prodtrack_core::{QuantityBreakdown, Stage};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::aggregator::StageAggregation;
use crate::external::ExternalAggregate;
use crate::gating::{FinishCapCalculator, SewGateCalculator, SewGateSource};

/// 工序行種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StageRowKind {
    /// 訂購
    Order,
    /// 裁剪
    Cut,
    /// 車縫
    Sew,
    /// 外發工序
    External,
    /// 後整
    Finish,
    /// 裝箱
    Pack,
    /// 品檢
    Qc,
}

/// 外發工序的行內明細
#[derive(Debug, Clone, Serialize)]
pub struct ExternalRowDetail {
    /// 送收聚合
    pub aggregate: ExternalAggregate,

    /// 外發廠商（由資料層提供）
    pub vendor: Option<String>,

    /// 預計回廠日（由資料層提供）
    pub eta: Option<NaiveDate>,
}

/// 外發工序中繼資料
///
/// 廠商與交期不在活動記錄上，由資料層按工序類型補給。
#[derive(Debug, Clone, Serialize)]
pub struct ExternalStepMeta {
    /// 外發工序類型
    pub step_type: String,

    /// 外發廠商
    pub vendor: Option<String>,

    /// 預計回廠日
    pub eta: Option<NaiveDate>,
}

impl ExternalStepMeta {
    /// 創建新的中繼資料
    pub fn new(step_type: String) -> Self {
        Self {
            step_type,
            vendor: None,
            eta: None,
        }
    }

    /// 建構器模式：設置廠商
    pub fn with_vendor(mut self, vendor: String) -> Self {
        self.vendor = Some(vendor);
        self
    }

    /// 建構器模式：設置預計回廠日
    pub fn with_eta(mut self, eta: NaiveDate) -> Self {
        self.eta = Some(eta);
        self
    }
}

/// 工序顯示行
#[derive(Debug, Clone, Serialize)]
pub struct StageRow {
    /// 行種類
    pub kind: StageRowKind,

    /// 行標籤（外發行為工序類型）
    pub label: String,

    /// 顯示分解
    pub breakdown: QuantityBreakdown,

    /// 顯示總量
    pub total: Decimal,

    /// 車縫行的閘門來源
    pub gate_source: Option<SewGateSource>,

    /// 外發行明細
    pub external: Option<ExternalRowDetail>,
}

impl StageRow {
    fn plain(kind: StageRowKind, label: &str, breakdown: QuantityBreakdown) -> Self {
        let total = breakdown.total();
        Self {
            kind,
            label: label.to_string(),
            breakdown,
            total,
            gate_source: None,
            external: None,
        }
    }
}

/// 行建構結果
#[derive(Debug, Clone, Serialize)]
pub struct StageRowSet {
    /// 依管線順序排列的顯示行
    pub rows: Vec<StageRow>,

    /// 後整輸入上限（上游手動輸入的封頂值）
    pub finish_input_cap: QuantityBreakdown,
}

/// 工序行建構器
pub struct StageRowBuilder;

impl StageRowBuilder {
    /// 建構顯示行
    ///
    /// 順序：訂購 → 裁剪 → 車縫 → 各外發工序 → 後整 → 裝箱 → 品檢。
    /// 車縫行取閘門值且不啟用裁剪後備，避免憑空顯示車縫進度。
    /// 外發行以中繼資料順序優先，僅出現在活動中的工序排在其後。
    pub fn build(aggregation: &StageAggregation, external_meta: &[ExternalStepMeta]) -> StageRowSet {
        let cut = aggregation.stats_for(Stage::Cut);
        let sew = aggregation.stats_for(Stage::Sew);
        let finish = aggregation.stats_for(Stage::Finish);

        let sew_gate =
            SewGateCalculator::calculate(&aggregation.externals, &sew, &finish, &cut, false);

        let mut rows = Vec::new();

        rows.push(StageRow::plain(
            StageRowKind::Order,
            "order",
            aggregation.effective_ordered.clone(),
        ));
        rows.push(StageRow::plain(
            StageRowKind::Cut,
            "cut",
            aggregation.display_cut.breakdown.clone(),
        ));

        let mut sew_row = StageRow::plain(StageRowKind::Sew, "sew", sew_gate.breakdown.clone());
        sew_row.gate_source = Some(sew_gate.source);
        rows.push(sew_row);

        for (step_type, meta) in Self::step_order(aggregation, external_meta) {
            let aggregate = aggregation
                .externals
                .iter()
                .find(|agg| agg.step_type == step_type)
                .cloned()
                .unwrap_or_else(|| ExternalAggregate::empty(step_type.clone()));

            let mut row = StageRow::plain(StageRowKind::External, &step_type, aggregate.net.clone());
            row.external = Some(ExternalRowDetail {
                aggregate,
                vendor: meta.as_ref().and_then(|m| m.vendor.clone()),
                eta: meta.as_ref().and_then(|m| m.eta),
            });
            rows.push(row);
        }

        rows.push(StageRow::plain(
            StageRowKind::Finish,
            "finish",
            aggregation.display_finish.breakdown.clone(),
        ));
        rows.push(StageRow::plain(
            StageRowKind::Pack,
            "pack",
            aggregation.display_pack.breakdown.clone(),
        ));
        rows.push(StageRow::plain(
            StageRowKind::Qc,
            "qc",
            aggregation.display_qc.breakdown.clone(),
        ));

        let external_gate = match sew_gate.source {
            SewGateSource::ExternalReceived | SewGateSource::ExternalSent => {
                sew_gate.breakdown.clone()
            }
            _ => QuantityBreakdown::new(),
        };
        let finish_input_cap = FinishCapCalculator::calculate(
            &external_gate,
            &sew.processed,
            sew.activity_count > 0,
            &cut.processed,
            &finish.processed,
            &finish.defect_reconciled,
        );

        StageRowSet {
            rows,
            finish_input_cap,
        }
    }

    /// 外發行順序：中繼資料順序優先，僅見於活動的工序附於其後
    fn step_order<'a>(
        aggregation: &StageAggregation,
        external_meta: &'a [ExternalStepMeta],
    ) -> Vec<(String, Option<&'a ExternalStepMeta>)> {
        let mut ordered: Vec<(String, Option<&ExternalStepMeta>)> = external_meta
            .iter()
            .map(|meta| (meta.step_type.clone(), Some(meta)))
            .collect();

        for aggregate in &aggregation.externals {
            if !ordered.iter().any(|(step, _)| *step == aggregate.step_type) {
                ordered.push((aggregate.step_type.clone(), None));
            }
        }

        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::StageAggregator;
    use prodtrack_core::{
        Activity, ActivityAction, ActivityKind, PackSnapshot, StageFallbacks,
    };

    fn bd(slots: &[i64]) -> QuantityBreakdown {
        QuantityBreakdown::from_slots(slots.iter().map(|q| Decimal::from(*q)).collect())
    }

    fn stage_activity(stage: Stage, slots: &[i64]) -> Activity {
        let breakdown = bd(slots);
        let total = breakdown.total();
        Activity::new("ASM-001".to_string(), stage, ActivityKind::Normal, total)
            .with_breakdown(breakdown)
    }

    fn external_activity(step: &str, action: ActivityAction, slots: &[i64]) -> Activity {
        let breakdown = bd(slots);
        let total = breakdown.total();
        Activity::new("ASM-001".to_string(), Stage::Sew, ActivityKind::Normal, total)
            .with_action(action)
            .with_breakdown(breakdown)
            .with_external_step(step.to_string())
    }

    fn aggregate(ordered: &[i64], activities: &[Activity]) -> StageAggregation {
        StageAggregator::aggregate(
            "ASM-001",
            &bd(ordered),
            &StageFallbacks::new(),
            &PackSnapshot::default(),
            activities,
        )
    }

    #[test]
    fn test_row_order_without_externals() {
        let aggregation = aggregate(&[10], &[stage_activity(Stage::Cut, &[6])]);

        let row_set = StageRowBuilder::build(&aggregation, &[]);
        let kinds: Vec<StageRowKind> = row_set.rows.iter().map(|r| r.kind).collect();

        assert_eq!(
            kinds,
            vec![
                StageRowKind::Order,
                StageRowKind::Cut,
                StageRowKind::Sew,
                StageRowKind::Finish,
                StageRowKind::Pack,
                StageRowKind::Qc,
            ]
        );
    }

    #[test]
    fn test_sew_row_does_not_invent_progress() {
        // 只有裁剪記錄：顯示行不得借用裁剪量充當車縫進度
        let aggregation = aggregate(&[10], &[stage_activity(Stage::Cut, &[6])]);

        let row_set = StageRowBuilder::build(&aggregation, &[]);
        let sew_row = &row_set.rows[2];

        assert_eq!(sew_row.kind, StageRowKind::Sew);
        assert_eq!(sew_row.total, Decimal::ZERO);
        assert_eq!(sew_row.gate_source, Some(SewGateSource::None));
    }

    #[test]
    fn test_external_rows_carry_meta() {
        let activities = vec![
            stage_activity(Stage::Cut, &[10]),
            external_activity("embroidery", ActivityAction::SentOut, &[8]),
            external_activity("embroidery", ActivityAction::ReceivedIn, &[5]),
        ];
        let aggregation = aggregate(&[10], &activities);

        let eta = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        let meta = vec![ExternalStepMeta::new("embroidery".to_string())
            .with_vendor("VENDOR-07".to_string())
            .with_eta(eta)];

        let row_set = StageRowBuilder::build(&aggregation, &meta);
        let external_row = row_set
            .rows
            .iter()
            .find(|r| r.kind == StageRowKind::External)
            .unwrap();

        assert_eq!(external_row.label, "embroidery");
        let detail = external_row.external.as_ref().unwrap();
        assert_eq!(detail.vendor, Some("VENDOR-07".to_string()));
        assert_eq!(detail.eta, Some(eta));
        assert_eq!(detail.aggregate.sent_total, Decimal::from(8));
        assert_eq!(detail.aggregate.loss_total, Decimal::from(3));
        // 行數量取淨量
        assert_eq!(external_row.total, Decimal::from(5));
    }

    #[test]
    fn test_expected_step_without_activity_gets_empty_row() {
        let aggregation = aggregate(&[10], &[stage_activity(Stage::Cut, &[10])]);

        let meta = vec![ExternalStepMeta::new("dyeing".to_string())];
        let row_set = StageRowBuilder::build(&aggregation, &meta);

        let external_row = row_set
            .rows
            .iter()
            .find(|r| r.kind == StageRowKind::External)
            .unwrap();
        assert_eq!(external_row.label, "dyeing");
        assert_eq!(external_row.total, Decimal::ZERO);
        assert_eq!(
            external_row.external.as_ref().unwrap().aggregate.sent_total,
            Decimal::ZERO
        );
    }

    #[test]
    fn test_finish_input_cap() {
        // 已裁 2、已後整 1 → 上限 1
        let activities = vec![
            stage_activity(Stage::Cut, &[2]),
            stage_activity(Stage::Finish, &[1]),
        ];
        let aggregation = aggregate(&[2], &activities);

        let row_set = StageRowBuilder::build(&aggregation, &[]);
        assert_eq!(row_set.finish_input_cap.total(), Decimal::from(1));
    }

    #[test]
    fn test_meta_order_precedes_activity_only_steps() {
        let activities = vec![
            external_activity("washing", ActivityAction::SentOut, &[2]),
            external_activity("embroidery", ActivityAction::SentOut, &[2]),
        ];
        let aggregation = aggregate(&[10], &activities);

        // 中繼資料只認得 embroidery：它排前，washing 附於其後
        let meta = vec![ExternalStepMeta::new("embroidery".to_string())];
        let row_set = StageRowBuilder::build(&aggregation, &meta);

        let labels: Vec<&str> = row_set
            .rows
            .iter()
            .filter(|r| r.kind == StageRowKind::External)
            .map(|r| r.label.as_str())
            .collect();
        assert_eq!(labels, vec!["embroidery", "washing"]);
    }
}
