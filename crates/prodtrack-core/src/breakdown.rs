//! 尺寸段數量分解模型
//!
//! 所有數量向量運算的唯一入口：長度不齊的向量一律視缺少的
//! 槽位為 0，補零邏輯集中在此，呼叫端不自行補零。

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 尺寸段數量分解
///
/// 有序的非負數量序列，索引對應尺寸/款式槽位。
/// 所有運算均為純函數且不會失敗：負值在進入時被截為 0。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityBreakdown {
    /// 各槽位數量
    slots: Vec<Decimal>,
}

impl QuantityBreakdown {
    /// 創建空的分解
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// 從槽位數量創建（負值截為 0）
    pub fn from_slots(slots: Vec<Decimal>) -> Self {
        Self {
            slots: slots.into_iter().map(Self::clamp).collect(),
        }
    }

    /// 創建指定長度的全零分解（用於未開始工序的顯示預設）
    pub fn zero_filled(len: usize) -> Self {
        Self {
            slots: vec![Decimal::ZERO; len],
        }
    }

    /// 正規化原始輸入
    ///
    /// * 非空輸入：逐槽截為非負後返回
    /// * 空輸入且 `allow_fallback` 且 `fallback_scalar > 0`：
    ///   返回單槽位 `[fallback_scalar]`（活動只有總量沒有分解時使用）
    /// * 其他情況：返回空分解
    pub fn normalize(raw: &[Decimal], fallback_scalar: Decimal, allow_fallback: bool) -> Self {
        if !raw.is_empty() {
            return Self::from_slots(raw.to_vec());
        }
        if allow_fallback && fallback_scalar > Decimal::ZERO {
            return Self {
                slots: vec![fallback_scalar],
            };
        }
        Self::new()
    }

    /// 槽位數
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// 是否為空
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 是否全為零（空分解視為零）
    pub fn is_zero(&self) -> bool {
        self.slots.iter().all(|q| *q == Decimal::ZERO)
    }

    /// 取得槽位數量（超出範圍視為 0）
    pub fn slot(&self, index: usize) -> Decimal {
        self.slots.get(index).copied().unwrap_or(Decimal::ZERO)
    }

    /// 槽位切片
    pub fn as_slice(&self) -> &[Decimal] {
        &self.slots
    }

    /// 總量
    pub fn total(&self) -> Decimal {
        self.slots.iter().copied().sum()
    }

    /// 逐槽累加（目標長度增長到較長的一方）
    pub fn add_into(&mut self, source: &Self) {
        if source.len() > self.slots.len() {
            self.slots.resize(source.len(), Decimal::ZERO);
        }
        for (i, qty) in source.slots.iter().enumerate() {
            self.slots[i] += Self::clamp(*qty);
        }
    }

    /// 逐槽取最小值（缺少的槽位視為 0）
    pub fn element_min(a: &Self, b: &Self) -> Self {
        let len = a.len().max(b.len());
        let slots = (0..len).map(|i| a.slot(i).min(b.slot(i))).collect();
        Self { slots }
    }

    /// 逐槽取最大值（缺少的槽位視為 0）
    pub fn element_max(a: &Self, b: &Self) -> Self {
        let len = a.len().max(b.len());
        let slots = (0..len).map(|i| a.slot(i).max(b.slot(i))).collect();
        Self { slots }
    }

    /// 逐槽相減並以 0 為下限：`max(a - b, 0)`
    pub fn saturating_sub(a: &Self, b: &Self) -> Self {
        let len = a.len().max(b.len());
        let slots = (0..len)
            .map(|i| (a.slot(i) - b.slot(i)).max(Decimal::ZERO))
            .collect();
        Self { slots }
    }

    fn clamp(qty: Decimal) -> Decimal {
        qty.max(Decimal::ZERO)
    }
}

impl From<Vec<Decimal>> for QuantityBreakdown {
    fn from(slots: Vec<Decimal>) -> Self {
        Self::from_slots(slots)
    }
}
