//! 物料預留模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 採購單行引用
///
/// 預留掛靠的採購單行及其交期/數量狀態。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoLineRef {
    /// 採購單號
    pub po_ref: String,

    /// 行號
    pub line_no: u32,

    /// 預計到貨日
    pub eta: Option<NaiveDate>,

    /// 訂購數量
    pub qty_ordered: Decimal,

    /// 預計交貨數量
    pub qty_expected: Decimal,

    /// 已收貨數量
    pub qty_received: Decimal,
}

impl PoLineRef {
    /// 創建新的採購單行引用
    pub fn new(po_ref: String, line_no: u32, qty_ordered: Decimal) -> Self {
        Self {
            po_ref,
            line_no,
            eta: None,
            qty_ordered,
            qty_expected: qty_ordered,
            qty_received: Decimal::ZERO,
        }
    }

    /// 建構器模式：設置預計到貨日
    pub fn with_eta(mut self, eta: NaiveDate) -> Self {
        self.eta = Some(eta);
        self
    }

    /// 建構器模式：設置預計交貨數量
    pub fn with_qty_expected(mut self, qty: Decimal) -> Self {
        self.qty_expected = qty;
        self
    }

    /// 建構器模式：設置已收貨數量
    pub fn with_qty_received(mut self, qty: Decimal) -> Self {
        self.qty_received = qty;
        self
    }

    /// 是否仍有未收貨的預計數量
    pub fn has_unreceived_expected(&self) -> bool {
        self.qty_received < self.qty_expected
    }
}

/// 庫存批次引用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRef {
    /// 批次號
    pub batch_ref: String,
}

impl BatchRef {
    /// 創建新的批次引用
    pub fn new(batch_ref: String) -> Self {
        Self { batch_ref }
    }
}

/// 預留掛靠來源
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReservationSource {
    /// 掛靠採購單行
    PoLine(PoLineRef),
    /// 掛靠庫存批次
    Batch(BatchRef),
}

/// 物料預留
///
/// 將一筆物料需求與一張採購單行或一個庫存批次綁定的認領。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyReservation {
    /// 預留ID
    pub id: Uuid,

    /// 組裝單ID
    pub assembly_id: String,

    /// 物料ID
    pub product_id: String,

    /// 預留數量
    pub qty_reserved: Decimal,

    /// 結清日期（已結清的預留不計入有效覆蓋）
    pub settled_on: Option<NaiveDate>,

    /// 掛靠來源
    pub source: ReservationSource,
}

impl SupplyReservation {
    /// 創建新的預留
    pub fn new(
        assembly_id: String,
        product_id: String,
        qty_reserved: Decimal,
        source: ReservationSource,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            assembly_id,
            product_id,
            qty_reserved,
            settled_on: None,
            source,
        }
    }

    /// 建構器模式：設置結清日期
    pub fn with_settled_on(mut self, date: NaiveDate) -> Self {
        self.settled_on = Some(date);
        self
    }

    /// 檢查是否已結清
    pub fn is_settled(&self) -> bool {
        self.settled_on.is_some()
    }

    /// 檢查是否為有效預留（未結清）
    pub fn is_active(&self) -> bool {
        !self.is_settled()
    }

    /// 檢查是否掛靠採購單行
    pub fn is_po_backed(&self) -> bool {
        matches!(self.source, ReservationSource::PoLine(_))
    }

    /// 取得掛靠的採購單行（批次預留返回 None）
    pub fn po_line(&self) -> Option<&PoLineRef> {
        match &self.source {
            ReservationSource::PoLine(line) => Some(line),
            ReservationSource::Batch(_) => None,
        }
    }
}
