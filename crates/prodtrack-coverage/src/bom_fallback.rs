//! BOM 需求後備推導
//!
//! 計劃系統未下發需求行時，從 BOM 用量與裁剪/訂購數量推導。

use prodtrack_core::{Assembly, BomLine, DemandSource, MaterialDemandRow};
use rust_decimal::Decimal;

/// BOM 需求推導計算器
pub struct BomDemandCalculator;

impl BomDemandCalculator {
    /// 從 BOM 用量推導需求行
    ///
    /// 數量基準：已裁總量為正時用已裁總量（裁剪已定案的實際投入），
    /// 否則退回訂購總量。推導出的行帶 `BomFallback` 來源標記。
    pub fn derive(
        assembly: &Assembly,
        lines: &[BomLine],
        cut_total: Decimal,
    ) -> Vec<MaterialDemandRow> {
        let basis = if cut_total > Decimal::ZERO {
            cut_total
        } else {
            assembly.ordered.total()
        };

        lines
            .iter()
            .map(|line| {
                let required = (line.qty_per_unit * basis).max(Decimal::ZERO);
                let mut row =
                    MaterialDemandRow::new(assembly.id.clone(), line.product_id.clone(), required)
                        .with_source(DemandSource::BomFallback);
                if let Some(product_type) = &line.product_type {
                    row = row.with_product_type(product_type.clone());
                }
                row
            })
            .collect()
    }
}
