//! 物料需求模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 需求來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemandSource {
    /// 外部計劃系統下發
    Planner,
    /// 由 BOM 用量推導（計劃系統未下發時的後備路徑）
    BomFallback,
}

/// 物料需求行
///
/// 單一組裝單對單一物料的需求量。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialDemandRow {
    /// 組裝單ID
    pub assembly_id: String,

    /// 物料ID
    pub product_id: String,

    /// 物料類型（容差解析用）
    pub product_type: Option<String>,

    /// 需求數量
    pub qty_required: Decimal,

    /// 來源成本單
    pub costing_ref: Option<String>,

    /// 需求來源
    pub source: DemandSource,
}

impl MaterialDemandRow {
    /// 創建新的需求行
    pub fn new(assembly_id: String, product_id: String, qty_required: Decimal) -> Self {
        Self {
            assembly_id,
            product_id,
            product_type: None,
            qty_required,
            costing_ref: None,
            source: DemandSource::Planner,
        }
    }

    /// 建構器模式：設置物料類型
    pub fn with_product_type(mut self, product_type: String) -> Self {
        self.product_type = Some(product_type);
        self
    }

    /// 建構器模式：設置來源成本單
    pub fn with_costing_ref(mut self, costing_ref: String) -> Self {
        self.costing_ref = Some(costing_ref);
        self
    }

    /// 建構器模式：設置需求來源
    pub fn with_source(mut self, source: DemandSource) -> Self {
        self.source = source;
        self
    }
}

/// BOM 用量行
///
/// 需求後備推導的輸入：每生產一件成品需要的物料用量。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomLine {
    /// 物料ID
    pub product_id: String,

    /// 物料類型
    pub product_type: Option<String>,

    /// 單件用量
    pub qty_per_unit: Decimal,
}

impl BomLine {
    /// 創建新的用量行
    pub fn new(product_id: String, qty_per_unit: Decimal) -> Self {
        Self {
            product_id,
            product_type: None,
            qty_per_unit,
        }
    }

    /// 建構器模式：設置物料類型
    pub fn with_product_type(mut self, product_type: String) -> Self {
        self.product_type = Some(product_type);
        self
    }
}
