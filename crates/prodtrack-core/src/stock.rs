//! 庫存快照模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 庫存快照
///
/// 批次評估開始時由資料層載入的唯讀快照。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSnapshot {
    /// 物料ID
    pub product_id: String,

    /// 本倉位庫存
    pub location_qty: Decimal,

    /// 全倉總庫存
    pub total_qty: Decimal,
}

impl StockSnapshot {
    /// 創建新的庫存快照
    pub fn new(product_id: String, location_qty: Decimal, total_qty: Decimal) -> Self {
        Self {
            product_id,
            location_qty,
            total_qty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_stock_snapshot() {
        let snapshot = StockSnapshot::new(
            "FABRIC-BLK".to_string(),
            Decimal::from(20),
            Decimal::from(65),
        );

        assert_eq!(snapshot.product_id, "FABRIC-BLK");
        assert_eq!(snapshot.location_qty, Decimal::from(20));
        assert_eq!(snapshot.total_qty, Decimal::from(65));
    }
}
