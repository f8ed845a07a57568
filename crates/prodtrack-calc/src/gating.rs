//! 閘門計算
//!
//! 車縫閘門限制可計入的車縫量，避免在外發廠商確認前超前計數；
//! 後整上限限制後整可輸入的數量。

use prodtrack_core::QuantityBreakdown;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::external::ExternalAggregate;
use crate::stage_stats::StageStats;

/// 車縫閘門來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SewGateSource {
    /// 外發收回量
    ExternalReceived,
    /// 外發送出量（尚無收回記錄）
    ExternalSent,
    /// 後整經手量（後整隱含確認車縫）
    Finish,
    /// 車縫經手量
    Sew,
    /// 裁剪後備（僅供預設數量建議，顯示行不啟用）
    FallbackCut,
    /// 無資料
    None,
}

/// 車縫閘門
#[derive(Debug, Clone, Serialize)]
pub struct SewGate {
    /// 閘門分解
    pub breakdown: QuantityBreakdown,

    /// 閘門來源
    pub source: SewGateSource,
}

impl SewGate {
    /// 閘門總量
    pub fn total(&self) -> Decimal {
        self.breakdown.total()
    }
}

/// 車縫閘門計算器
pub struct SewGateCalculator;

impl SewGateCalculator {
    /// 計算車縫閘門
    ///
    /// 優先順序：
    /// 1. 任一外發工序有非零收回量 → 各該工序收回量的逐槽最小值
    /// 2. 任一外發工序有非零送出量 → 各該工序送出量的逐槽最小值
    /// 3. 車縫或後整有內部嘗試量 → `max(車縫經手, 後整經手)`，
    ///    以總量較大的一方標記來源
    /// 4. 呼叫端允許時退回裁剪經手量；否則為空閘門
    pub fn calculate(
        externals: &[ExternalAggregate],
        sew: &StageStats,
        finish: &StageStats,
        cut: &StageStats,
        allow_cut_fallback: bool,
    ) -> SewGate {
        let received_gates: Vec<&QuantityBreakdown> = externals
            .iter()
            .filter(|agg| !agg.received.is_zero())
            .map(|agg| &agg.received)
            .collect();
        if let Some(gate) = Self::element_min_of(&received_gates) {
            return SewGate {
                breakdown: gate,
                source: SewGateSource::ExternalReceived,
            };
        }

        let sent_gates: Vec<&QuantityBreakdown> = externals
            .iter()
            .filter(|agg| !agg.sent.is_zero())
            .map(|agg| &agg.sent)
            .collect();
        if let Some(gate) = Self::element_min_of(&sent_gates) {
            return SewGate {
                breakdown: gate,
                source: SewGateSource::ExternalSent,
            };
        }

        if sew.attempts_total > Decimal::ZERO || finish.attempts_total > Decimal::ZERO {
            let gate = QuantityBreakdown::element_max(&sew.processed, &finish.processed);
            let source = if finish.processed_total > sew.processed_total {
                SewGateSource::Finish
            } else {
                SewGateSource::Sew
            };
            return SewGate {
                breakdown: gate,
                source,
            };
        }

        if allow_cut_fallback && cut.processed_total > Decimal::ZERO {
            return SewGate {
                breakdown: cut.processed.clone(),
                source: SewGateSource::FallbackCut,
            };
        }

        SewGate {
            breakdown: QuantityBreakdown::new(),
            source: SewGateSource::None,
        }
    }

    fn element_min_of(gates: &[&QuantityBreakdown]) -> Option<QuantityBreakdown> {
        let mut iter = gates.iter();
        let first = (*iter.next()?).clone();
        Some(iter.fold(first, |acc, gate| QuantityBreakdown::element_min(&acc, gate)))
    }
}

/// 後整上限計算器
pub struct FinishCapCalculator;

impl FinishCapCalculator {
    /// 計算後整輸入上限
    ///
    /// 上游已確認可後整的數量，扣除已後整的淨產出
    /// （後整經手 − 損耗沖銷），逐槽以 0 為下限。
    /// 上游確認來源：外發閘門 → 車縫經手（有車縫記錄時）→ 裁剪經手。
    pub fn calculate(
        external_gate: &QuantityBreakdown,
        sew_recorded: &QuantityBreakdown,
        has_sew_records: bool,
        cut_recorded: &QuantityBreakdown,
        finish_recorded: &QuantityBreakdown,
        finish_loss_reconciled: &QuantityBreakdown,
    ) -> QuantityBreakdown {
        let confirmed = if !external_gate.is_zero() {
            external_gate
        } else if has_sew_records {
            sew_recorded
        } else {
            cut_recorded
        };

        let finished_net = QuantityBreakdown::saturating_sub(finish_recorded, finish_loss_reconciled);
        QuantityBreakdown::saturating_sub(confirmed, &finished_net)
    }
}
