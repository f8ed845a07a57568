//! 物料覆蓋評估
//!
//! 逐組裝單、逐物料比對需求量與現貨/有效預留，按容差規則
//! 分類覆蓋狀態並產生停擺原因。

use chrono::NaiveDate;
use prodtrack_core::{
    Assembly, BomLine, CoverageTolerance, MaterialDemandRow, StockSnapshot, SupplyReservation,
    ToleranceConfig,
};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

use crate::bom_fallback::BomDemandCalculator;

/// 交期臨近窗口（天）
pub const DUE_SOON_WINDOW_DAYS: i64 = 7;

/// 覆蓋狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CoverageStatus {
    /// 覆蓋充足
    Ok,
    /// 預留到貨日臨近需用日
    DueSoon,
    /// 缺口在容差內（潛在短缺，暫不停擺）
    PotentialUndercut,
    /// 採購停擺
    PoHold,
}

/// 單一物料的覆蓋明細
///
/// 每次評估呼叫即時重算，不做持久化。
#[derive(Debug, Clone, Serialize)]
pub struct MaterialCoverageItem {
    /// 物料ID
    pub product_id: String,

    /// 物料類型
    pub product_type: Option<String>,

    /// 需求數量
    pub required: Decimal,

    /// 本倉位庫存
    pub location_stock: Decimal,
    /// 全倉總庫存
    pub total_stock: Decimal,

    /// 現貨覆蓋量：`min(需求, 本倉位庫存)`
    pub covered_by_on_hand: Decimal,
    /// 現貨後餘量：`max(需求 − 現貨覆蓋, 0)`
    pub remaining_after_on_hand: Decimal,

    /// 掛靠採購單行的有效預留量
    pub reserved_to_po: Decimal,
    /// 掛靠庫存批次的有效預留量
    pub reserved_to_batch: Decimal,
    /// 有效預留合計
    pub total_reserved: Decimal,

    /// 預留覆蓋量：`min(現貨後餘量, 預留合計)`
    pub covered_by_reservations: Decimal,
    /// 未覆蓋量：`max(現貨後餘量 − 預留合計, 0)`
    pub qty_uncovered: Decimal,

    /// 解析後的容差
    pub tolerance: CoverageTolerance,
    /// 容差數量
    pub tolerance_qty: Decimal,
    /// 扣除容差後的未覆蓋量
    pub qty_uncovered_after_tolerance: Decimal,

    /// 最早受阻到貨日
    pub earliest_blocking_eta: Option<NaiveDate>,

    /// 覆蓋狀態
    pub status: CoverageStatus,
}

/// 物料停擺原因
#[derive(Debug, Clone, Serialize)]
pub struct MaterialHoldReason {
    /// 物料ID
    pub product_id: String,

    /// 原因說明（供人工處理介面呈現）
    pub reason: String,

    /// 未覆蓋量
    pub qty_uncovered: Decimal,

    /// 扣除容差後的未覆蓋量
    pub qty_uncovered_after_tolerance: Decimal,

    /// 容差數量
    pub tolerance_qty: Decimal,

    /// 最早受阻到貨日
    pub earliest_blocking_eta: Option<NaiveDate>,
}

/// 單一組裝單的覆蓋評估結果
#[derive(Debug, Clone, Serialize)]
pub struct AssemblyMaterialCoverage {
    /// 組裝單ID
    pub assembly_id: String,

    /// 是否停擺（任一物料達到採購停擺）
    pub held: bool,

    /// 停擺/短缺原因
    pub hold_reasons: Vec<MaterialHoldReason>,

    /// 各物料覆蓋明細
    pub items: Vec<MaterialCoverageItem>,
}

/// BOM 後備推導輸入
///
/// 計劃系統未下發需求行的組裝單，以 BOM 用量 × 數量基準推導。
#[derive(Debug, Clone, Default)]
pub struct BomFallbackInputs {
    /// 各組裝單的 BOM 用量行
    pub lines_by_assembly: HashMap<String, Vec<BomLine>>,

    /// 各組裝單的已裁總量（數量基準）
    pub cut_totals: HashMap<String, Decimal>,
}

/// 預留時效分類
enum ReservationTiming {
    /// 受阻（附受阻到貨日，無ETA者為 None）
    Blocked(Option<NaiveDate>),
    /// 到貨日臨近需用日
    DueSoon,
    /// 正常
    Open,
}

/// 物料覆蓋評估器
///
/// 容差配置顯式傳入，評估器本身為純函數、無隱藏狀態。
pub struct CoverageEvaluator {
    tolerance_config: ToleranceConfig,
}

impl CoverageEvaluator {
    /// 創建新的評估器
    pub fn new(tolerance_config: ToleranceConfig) -> Self {
        Self { tolerance_config }
    }

    /// 批次評估
    ///
    /// 各組裝單獨立評估且可安全並行；單一組裝單的資料品質問題
    /// 以寬鬆結果呈現，不中斷整批。
    pub fn evaluate(
        &self,
        assemblies: &[Assembly],
        demand_rows: &[MaterialDemandRow],
        reservations: &[SupplyReservation],
        stock_snapshots: &[StockSnapshot],
        bom_fallback: &BomFallbackInputs,
        today: NaiveDate,
    ) -> HashMap<String, AssemblyMaterialCoverage> {
        tracing::info!(
            "開始覆蓋評估：組裝單 {} 筆，需求 {} 筆，預留 {} 筆",
            assemblies.len(),
            demand_rows.len(),
            reservations.len()
        );
        let start_time = std::time::Instant::now();

        let stock_map: HashMap<&str, &StockSnapshot> = stock_snapshots
            .iter()
            .map(|s| (s.product_id.as_str(), s))
            .collect();

        let results: HashMap<String, AssemblyMaterialCoverage> = assemblies
            .par_iter()
            .map(|assembly| {
                let rows: Vec<&MaterialDemandRow> = demand_rows
                    .iter()
                    .filter(|row| row.assembly_id == assembly.id)
                    .collect();

                // 需求後備路徑：無下發需求行時由 BOM 推導
                let derived;
                let rows: Vec<&MaterialDemandRow> = if rows.is_empty() {
                    let lines = bom_fallback
                        .lines_by_assembly
                        .get(&assembly.id)
                        .map(Vec::as_slice)
                        .unwrap_or(&[]);
                    let cut_total = bom_fallback
                        .cut_totals
                        .get(&assembly.id)
                        .copied()
                        .unwrap_or(Decimal::ZERO);
                    derived = BomDemandCalculator::derive(assembly, lines, cut_total);
                    derived.iter().collect()
                } else {
                    rows
                };

                let coverage =
                    self.evaluate_assembly(assembly, &rows, reservations, &stock_map, today);
                (assembly.id.clone(), coverage)
            })
            .collect();

        tracing::info!("覆蓋評估完成，耗時 {:?}", start_time.elapsed());
        results
    }

    /// 評估單一組裝單
    pub fn evaluate_assembly(
        &self,
        assembly: &Assembly,
        demand_rows: &[&MaterialDemandRow],
        reservations: &[SupplyReservation],
        stock_map: &HashMap<&str, &StockSnapshot>,
        today: NaiveDate,
    ) -> AssemblyMaterialCoverage {
        let needed_date = assembly.needed_date();

        // 同一物料的多筆需求行合併計算
        let mut product_order: Vec<String> = Vec::new();
        let mut required_by_product: HashMap<String, (Decimal, Option<String>)> = HashMap::new();
        for row in demand_rows {
            let entry = required_by_product
                .entry(row.product_id.clone())
                .or_insert_with(|| {
                    product_order.push(row.product_id.clone());
                    (Decimal::ZERO, None)
                });
            entry.0 += row.qty_required.max(Decimal::ZERO);
            if entry.1.is_none() {
                entry.1 = row.product_type.clone();
            }
        }

        let mut items = Vec::new();
        let mut hold_reasons = Vec::new();

        for product_id in product_order {
            let (required, product_type) = required_by_product
                .remove(&product_id)
                .unwrap_or((Decimal::ZERO, None));

            let active: Vec<&SupplyReservation> = reservations
                .iter()
                .filter(|r| {
                    r.assembly_id == assembly.id && r.product_id == product_id && r.is_active()
                })
                .collect();

            let item = self.evaluate_material(
                &assembly.id,
                &product_id,
                product_type,
                required,
                &active,
                stock_map.get(product_id.as_str()).copied(),
                needed_date,
                today,
            );

            match item.status {
                CoverageStatus::PoHold | CoverageStatus::PotentialUndercut => {
                    hold_reasons.push(MaterialHoldReason {
                        product_id: item.product_id.clone(),
                        reason: Self::reason_for(&item),
                        qty_uncovered: item.qty_uncovered,
                        qty_uncovered_after_tolerance: item.qty_uncovered_after_tolerance,
                        tolerance_qty: item.tolerance_qty,
                        earliest_blocking_eta: item.earliest_blocking_eta,
                    });
                }
                _ => {}
            }

            items.push(item);
        }

        let held = items
            .iter()
            .any(|item| item.status == CoverageStatus::PoHold);

        AssemblyMaterialCoverage {
            assembly_id: assembly.id.clone(),
            held,
            hold_reasons,
            items,
        }
    }

    /// 評估單一物料
    #[allow(clippy::too_many_arguments)]
    fn evaluate_material(
        &self,
        assembly_id: &str,
        product_id: &str,
        product_type: Option<String>,
        required: Decimal,
        active_reservations: &[&SupplyReservation],
        stock: Option<&StockSnapshot>,
        needed_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> MaterialCoverageItem {
        let location_stock = stock.map(|s| s.location_qty.max(Decimal::ZERO)).unwrap_or(Decimal::ZERO);
        let total_stock = stock.map(|s| s.total_qty.max(Decimal::ZERO)).unwrap_or(Decimal::ZERO);

        let covered_by_on_hand = required.min(location_stock).max(Decimal::ZERO);
        let remaining_after_on_hand = (required - covered_by_on_hand).max(Decimal::ZERO);

        let reserved_to_po: Decimal = active_reservations
            .iter()
            .filter(|r| r.is_po_backed())
            .map(|r| r.qty_reserved.max(Decimal::ZERO))
            .sum();
        let reserved_to_batch: Decimal = active_reservations
            .iter()
            .filter(|r| !r.is_po_backed())
            .map(|r| r.qty_reserved.max(Decimal::ZERO))
            .sum();
        let total_reserved = reserved_to_po + reserved_to_batch;

        let covered_by_reservations = remaining_after_on_hand.min(total_reserved);
        let qty_uncovered = (remaining_after_on_hand - total_reserved).max(Decimal::ZERO);

        let tolerance = self
            .tolerance_config
            .resolve(assembly_id, product_type.as_deref());
        let tolerance_qty = tolerance.quantity_for(required);
        let qty_uncovered_after_tolerance = (qty_uncovered - tolerance_qty).max(Decimal::ZERO);

        let timings: Vec<ReservationTiming> = active_reservations
            .iter()
            .map(|r| Self::classify_reservation(r, needed_date, today))
            .collect();

        let earliest_blocking_eta = timings
            .iter()
            .filter_map(|t| match t {
                ReservationTiming::Blocked(eta) => *eta,
                _ => None,
            })
            .min();
        let any_unblocked = timings
            .iter()
            .any(|t| !matches!(t, ReservationTiming::Blocked(_)));
        let any_due_soon = timings
            .iter()
            .any(|t| matches!(t, ReservationTiming::DueSoon));

        // 狀態分類：首個命中即定案
        let status = if required <= Decimal::ZERO {
            CoverageStatus::Ok
        } else if qty_uncovered > Decimal::ZERO {
            if qty_uncovered_after_tolerance > Decimal::ZERO {
                CoverageStatus::PoHold
            } else {
                CoverageStatus::PotentialUndercut
            }
        } else if remaining_after_on_hand > Decimal::ZERO
            && !active_reservations.is_empty()
            && !any_unblocked
        {
            CoverageStatus::PoHold
        } else if any_due_soon {
            CoverageStatus::DueSoon
        } else {
            CoverageStatus::Ok
        };

        MaterialCoverageItem {
            product_id: product_id.to_string(),
            product_type,
            required,
            location_stock,
            total_stock,
            covered_by_on_hand,
            remaining_after_on_hand,
            reserved_to_po,
            reserved_to_batch,
            total_reserved,
            covered_by_reservations,
            qty_uncovered,
            tolerance,
            tolerance_qty,
            qty_uncovered_after_tolerance,
            earliest_blocking_eta,
            status,
        }
    }

    /// 預留時效分類
    ///
    /// 受阻：掛靠採購單行、未結清、行上仍有未收貨的預計數量，
    /// 且（無ETA，或 ETA 早於今日，或 ETA 晚於需用日）。
    /// 臨近：未受阻且 ETA 落在需用日（無需用日則今日）起算的
    /// 7 天窗口內。批次預留視為正常。
    fn classify_reservation(
        reservation: &SupplyReservation,
        needed_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> ReservationTiming {
        let line = match reservation.po_line() {
            Some(line) => line,
            None => return ReservationTiming::Open,
        };

        if line.has_unreceived_expected() {
            let blocked = match line.eta {
                None => true,
                Some(eta) => eta < today || needed_date.map_or(false, |nd| eta > nd),
            };
            if blocked {
                return ReservationTiming::Blocked(line.eta);
            }
        }

        if let Some(eta) = line.eta {
            let due_soon = match needed_date {
                Some(nd) => (nd - eta).num_days() <= DUE_SOON_WINDOW_DAYS,
                None => (eta - today).num_days() <= DUE_SOON_WINDOW_DAYS,
            };
            if due_soon {
                return ReservationTiming::DueSoon;
            }
        }

        ReservationTiming::Open
    }

    fn reason_for(item: &MaterialCoverageItem) -> String {
        match item.status {
            CoverageStatus::PoHold if item.qty_uncovered_after_tolerance > Decimal::ZERO => {
                format!(
                    "物料 {} 缺口 {} 超出容差 {}",
                    item.product_id, item.qty_uncovered, item.tolerance_qty
                )
            }
            CoverageStatus::PoHold => {
                format!("物料 {} 的預留全數受阻，採購時程無法滿足需用日", item.product_id)
            }
            _ => format!(
                "物料 {} 缺口 {} 在容差 {} 內，有潛在短缺風險",
                item.product_id, item.qty_uncovered, item.tolerance_qty
            ),
        }
    }
}
