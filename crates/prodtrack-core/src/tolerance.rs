//! 覆蓋容差配置模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 覆蓋容差
///
/// 未覆蓋數量在被視為實際短缺前允許的寬限：
/// 絕對數量 + 需求量的百分比。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageTolerance {
    /// 絕對寬限量
    pub absolute: Decimal,

    /// 需求量百分比（0.05 = 5%）
    pub percentage: Decimal,
}

impl CoverageTolerance {
    /// 創建新的容差
    pub fn new(absolute: Decimal, percentage: Decimal) -> Self {
        Self {
            absolute: absolute.max(Decimal::ZERO),
            percentage: percentage.max(Decimal::ZERO),
        }
    }

    /// 按需求量換算的容差數量：`absolute + percentage × required`
    pub fn quantity_for(&self, required: Decimal) -> Decimal {
        (self.absolute + self.percentage * required.max(Decimal::ZERO)).max(Decimal::ZERO)
    }
}

/// 容差配置
///
/// 解析優先順序：組裝單覆寫 → 物料類型預設 → 全域預設。
/// 以配置值顯式傳入評估器，評估器本身保持純函數。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToleranceConfig {
    /// 全域預設
    pub global: CoverageTolerance,

    /// 物料類型預設
    pub by_product_type: HashMap<String, CoverageTolerance>,

    /// 組裝單覆寫
    pub by_assembly: HashMap<String, CoverageTolerance>,
}

impl ToleranceConfig {
    /// 創建僅含全域預設的配置
    pub fn new(global: CoverageTolerance) -> Self {
        Self {
            global,
            by_product_type: HashMap::new(),
            by_assembly: HashMap::new(),
        }
    }

    /// 建構器模式：設置物料類型預設
    pub fn with_product_type(mut self, product_type: String, tolerance: CoverageTolerance) -> Self {
        self.by_product_type.insert(product_type, tolerance);
        self
    }

    /// 建構器模式：設置組裝單覆寫
    pub fn with_assembly(mut self, assembly_id: String, tolerance: CoverageTolerance) -> Self {
        self.by_assembly.insert(assembly_id, tolerance);
        self
    }

    /// 解析容差：組裝單覆寫 → 物料類型預設 → 全域預設
    pub fn resolve(&self, assembly_id: &str, product_type: Option<&str>) -> CoverageTolerance {
        if let Some(tolerance) = self.by_assembly.get(assembly_id) {
            return *tolerance;
        }
        if let Some(pt) = product_type {
            if let Some(tolerance) = self.by_product_type.get(pt) {
                return *tolerance;
            }
        }
        self.global
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_for() {
        // 百分比 0.05 = 5%
        let tolerance = CoverageTolerance::new(Decimal::from(2), Decimal::new(5, 2));

        // 2 + 0.05 × 100 = 7
        assert_eq!(tolerance.quantity_for(Decimal::from(100)), Decimal::from(7));

        // 需求為 0 時只剩絕對寬限
        assert_eq!(tolerance.quantity_for(Decimal::ZERO), Decimal::from(2));
    }

    #[test]
    fn test_negative_inputs_clamped() {
        let tolerance = CoverageTolerance::new(Decimal::from(-5), Decimal::new(-1, 1));
        assert_eq!(tolerance.quantity_for(Decimal::from(100)), Decimal::ZERO);
    }

    #[test]
    fn test_resolve_priority_chain() {
        let config = ToleranceConfig::new(CoverageTolerance::new(Decimal::ONE, Decimal::ZERO))
            .with_product_type(
                "fabric".to_string(),
                CoverageTolerance::new(Decimal::from(3), Decimal::ZERO),
            )
            .with_assembly(
                "ASM-001".to_string(),
                CoverageTolerance::new(Decimal::from(9), Decimal::ZERO),
            );

        // 組裝單覆寫優先
        assert_eq!(
            config.resolve("ASM-001", Some("fabric")).absolute,
            Decimal::from(9)
        );

        // 其次物料類型預設
        assert_eq!(
            config.resolve("ASM-002", Some("fabric")).absolute,
            Decimal::from(3)
        );

        // 最後全域預設
        assert_eq!(config.resolve("ASM-002", Some("trim")).absolute, Decimal::ONE);
        assert_eq!(config.resolve("ASM-002", None).absolute, Decimal::ONE);
    }
}
