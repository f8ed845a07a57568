//! 組裝單風險信號
//!
//! 結合工序聚合、外發交期與覆蓋評估，產生看板用的
//! 停擺旗標與下一步動作。

use chrono::NaiveDate;
use prodtrack_calc::{ExternalStepMeta, StageAggregation};
use prodtrack_core::SupplyReservation;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::evaluator::{AssemblyMaterialCoverage, DUE_SOON_WINDOW_DAYS};

/// 外發工序狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExternalStepState {
    /// 未開始（無送出記錄）
    NotStarted,
    /// 進行中（送出多於收回）
    InProgress,
    /// 已完成（收回不少於送出）
    Done,
}

/// 外發工序摘要
#[derive(Debug, Clone, Serialize)]
pub struct VendorStepSummary {
    /// 外發工序類型
    pub step_type: String,

    /// 外發廠商
    pub vendor: Option<String>,

    /// 預計回廠日
    pub eta: Option<NaiveDate>,

    /// 工序狀態
    pub state: ExternalStepState,

    /// 送出總量
    pub sent_total: Decimal,

    /// 收回總量
    pub received_total: Decimal,

    /// 損耗總量
    pub loss_total: Decimal,

    /// 是否逾期（未完結且 ETA 早於今日）
    pub is_late: bool,
}

impl VendorStepSummary {
    /// 檢查是否為未完結工序
    pub fn is_open(&self) -> bool {
        self.state != ExternalStepState::Done
    }
}

/// 最近的未完結外發工序
#[derive(Debug, Clone, Serialize)]
pub struct NearestOpenStep {
    /// 外發工序類型
    pub step_type: String,

    /// 預計回廠日
    pub eta: NaiveDate,
}

/// 下一步動作種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NextActionKind {
    /// 外發送出
    SendOut,
    /// 追蹤廠商
    FollowUpVendor,
    /// 處理採購
    ResolvePo,
}

/// 下一步動作
#[derive(Debug, Clone, Serialize)]
pub struct NextAction {
    /// 動作種類
    pub kind: NextActionKind,

    /// 動作說明
    pub message: String,

    /// 相關外發工序
    pub step_type: Option<String>,

    /// 相關物料
    pub product_id: Option<String>,
}

/// 組裝單風險信號
#[derive(Debug, Clone, Serialize)]
pub struct AssemblyRiskSignals {
    /// 組裝單ID
    pub assembly_id: String,

    /// 任一未完結外發工序已逾期
    pub has_external_late: bool,

    /// 最近的未完結外發 ETA 落在 7 天窗口內且未逾期
    pub external_due_soon: bool,

    /// 最近的未完結外發工序（有 ETA 者）
    pub nearest_open_step: Option<NearestOpenStep>,

    /// 採購停擺旗標
    pub po_hold: bool,

    /// 採購停擺原因
    pub po_hold_reason: Option<String>,

    /// 受阻的最早到貨日
    pub po_blocking_eta: Option<NaiveDate>,

    /// 受阻的採購單行
    pub po_blocking_line: Option<String>,

    /// 下一步動作
    pub next_actions: Vec<NextAction>,

    /// 外發工序摘要
    pub vendor_steps: Vec<VendorStepSummary>,
}

/// 風險信號建構器
pub struct RiskSignalBuilder;

impl RiskSignalBuilder {
    /// 建構單一組裝單的風險信號
    ///
    /// 未提供覆蓋評估結果時，退回僅看採購單行交期的簡化
    /// 判定（無ETA/逾期/晚於需用日，不計容差）。
    pub fn build(
        aggregation: &StageAggregation,
        external_meta: &[ExternalStepMeta],
        reservations: &[SupplyReservation],
        coverage: Option<&AssemblyMaterialCoverage>,
        needed_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> AssemblyRiskSignals {
        let vendor_steps = Self::summarize_steps(aggregation, external_meta, today);

        let nearest_open_step = vendor_steps
            .iter()
            .filter(|step| step.is_open())
            .filter_map(|step| step.eta.map(|eta| (step, eta)))
            .min_by_key(|(_, eta)| *eta)
            .map(|(step, eta)| NearestOpenStep {
                step_type: step.step_type.clone(),
                eta,
            });

        let has_external_late = vendor_steps.iter().any(|step| step.is_late);
        let external_due_soon = nearest_open_step
            .as_ref()
            .map(|nearest| {
                nearest.eta >= today && (nearest.eta - today).num_days() <= DUE_SOON_WINDOW_DAYS
            })
            .unwrap_or(false);

        let mut next_actions = Vec::new();

        // 裁剪已有產出但外發尚未送出
        if aggregation.display_cut.total > Decimal::ZERO {
            for step in vendor_steps
                .iter()
                .filter(|s| s.state == ExternalStepState::NotStarted)
            {
                next_actions.push(NextAction {
                    kind: NextActionKind::SendOut,
                    message: format!("裁剪已有產出，外發工序 {} 尚未送出", step.step_type),
                    step_type: Some(step.step_type.clone()),
                    product_id: None,
                });
            }
        }

        // 進行中且逾期的外發
        for step in vendor_steps
            .iter()
            .filter(|s| s.state == ExternalStepState::InProgress && s.is_late)
        {
            next_actions.push(NextAction {
                kind: NextActionKind::FollowUpVendor,
                message: format!("外發工序 {} 已逾期，請追蹤廠商", step.step_type),
                step_type: Some(step.step_type.clone()),
                product_id: None,
            });
        }

        // 採購停擺：優先採用覆蓋評估結果，否則退回採購單行簡化判定
        let blocked_line = Self::earliest_blocked_line(reservations, needed_date, today);
        let (po_hold, po_hold_reason, po_blocking_eta) = match coverage {
            Some(coverage) => {
                for reason in &coverage.hold_reasons {
                    next_actions.push(NextAction {
                        kind: NextActionKind::ResolvePo,
                        message: reason.reason.clone(),
                        step_type: None,
                        product_id: Some(reason.product_id.clone()),
                    });
                }
                let blocking_eta = coverage
                    .hold_reasons
                    .iter()
                    .filter_map(|r| r.earliest_blocking_eta)
                    .min()
                    .or_else(|| blocked_line.as_ref().and_then(|(_, eta)| *eta));
                (
                    coverage.held,
                    coverage.hold_reasons.first().map(|r| r.reason.clone()),
                    blocking_eta,
                )
            }
            None => match &blocked_line {
                Some((line_ref, eta)) => {
                    let reason = format!("採購單行 {} 交期受阻", line_ref);
                    next_actions.push(NextAction {
                        kind: NextActionKind::ResolvePo,
                        message: reason.clone(),
                        step_type: None,
                        product_id: None,
                    });
                    (true, Some(reason), *eta)
                }
                None => (false, None, None),
            },
        };

        AssemblyRiskSignals {
            assembly_id: aggregation.assembly_id.clone(),
            has_external_late,
            external_due_soon,
            nearest_open_step,
            po_hold,
            po_hold_reason,
            po_blocking_eta,
            po_blocking_line: blocked_line.map(|(line_ref, _)| line_ref),
            next_actions,
            vendor_steps,
        }
    }

    /// 外發工序摘要：中繼資料順序優先，僅見於活動的工序附於其後
    fn summarize_steps(
        aggregation: &StageAggregation,
        external_meta: &[ExternalStepMeta],
        today: NaiveDate,
    ) -> Vec<VendorStepSummary> {
        let mut summaries: Vec<VendorStepSummary> = Vec::new();

        for meta in external_meta {
            let aggregate = aggregation
                .externals
                .iter()
                .find(|agg| agg.step_type == meta.step_type);
            summaries.push(Self::summarize_step(
                &meta.step_type,
                meta.vendor.clone(),
                meta.eta,
                aggregate.map(|a| a.sent_total).unwrap_or(Decimal::ZERO),
                aggregate.map(|a| a.received_total).unwrap_or(Decimal::ZERO),
                aggregate.map(|a| a.loss_total).unwrap_or(Decimal::ZERO),
                today,
            ));
        }

        for aggregate in &aggregation.externals {
            if summaries.iter().any(|s| s.step_type == aggregate.step_type) {
                continue;
            }
            summaries.push(Self::summarize_step(
                &aggregate.step_type,
                None,
                None,
                aggregate.sent_total,
                aggregate.received_total,
                aggregate.loss_total,
                today,
            ));
        }

        summaries
    }

    fn summarize_step(
        step_type: &str,
        vendor: Option<String>,
        eta: Option<NaiveDate>,
        sent_total: Decimal,
        received_total: Decimal,
        loss_total: Decimal,
        today: NaiveDate,
    ) -> VendorStepSummary {
        let state = if sent_total <= Decimal::ZERO {
            ExternalStepState::NotStarted
        } else if received_total >= sent_total {
            ExternalStepState::Done
        } else {
            ExternalStepState::InProgress
        };

        let is_late =
            state != ExternalStepState::Done && eta.map_or(false, |eta| eta < today);

        VendorStepSummary {
            step_type: step_type.to_string(),
            vendor,
            eta,
            state,
            sent_total,
            received_total,
            loss_total,
            is_late,
        }
    }

    /// 簡化判定：最早受阻的採購單行
    ///
    /// 有效且仍有未收貨預計數量的採購預留，ETA 缺漏、已過期
    /// 或晚於需用日即視為受阻。
    fn earliest_blocked_line(
        reservations: &[SupplyReservation],
        needed_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Option<(String, Option<NaiveDate>)> {
        let mut blocked: Vec<(String, Option<NaiveDate>)> = Vec::new();

        for reservation in reservations.iter().filter(|r| r.is_active()) {
            let line = match reservation.po_line() {
                Some(line) => line,
                None => continue,
            };
            if !line.has_unreceived_expected() {
                continue;
            }
            let is_blocked = match line.eta {
                None => true,
                Some(eta) => eta < today || needed_date.map_or(false, |nd| eta > nd),
            };
            if is_blocked {
                blocked.push((format!("{}#{}", line.po_ref, line.line_no), line.eta));
            }
        }

        blocked
            .into_iter()
            .min_by_key(|(_, eta)| eta.unwrap_or(NaiveDate::MAX))
    }
}
