//! 生產活動模型

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::breakdown::QuantityBreakdown;
use crate::TrackError;

/// 工序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// 裁剪
    Cut,
    /// 車縫
    Sew,
    /// 後整
    Finish,
    /// 裝箱
    Pack,
    /// 品檢
    Qc,
    /// 取消（非生產工序，用於沖減訂購量）
    Cancel,
    /// 其他
    Other,
}

impl Stage {
    /// 生產管線中的工序（不含取消/其他標記）
    pub const PIPELINE: [Stage; 5] = [Stage::Cut, Stage::Sew, Stage::Finish, Stage::Pack, Stage::Qc];

    /// 寬鬆解析：無法識別的工序歸入 `Other`
    ///
    /// 歷史資料以自由字串記錄工序，載入時走此路徑。
    pub fn parse_lenient(raw: &str) -> Self {
        Self::from_str(raw).unwrap_or(Stage::Other)
    }
}

impl FromStr for Stage {
    type Err = TrackError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cut" => Ok(Stage::Cut),
            "sew" => Ok(Stage::Sew),
            "finish" => Ok(Stage::Finish),
            "pack" => Ok(Stage::Pack),
            "qc" => Ok(Stage::Qc),
            "cancel" => Ok(Stage::Cancel),
            "other" => Ok(Stage::Other),
            _ => Err(TrackError::UnknownStage(raw.to_string())),
        }
    }
}

/// 活動類別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    /// 正常產出
    Normal,
    /// 次品
    Defect,
}

impl FromStr for ActivityKind {
    type Err = TrackError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(ActivityKind::Normal),
            "defect" => Ok(ActivityKind::Defect),
            _ => Err(TrackError::UnknownKind(raw.to_string())),
        }
    }
}

/// 活動動作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityAction {
    /// 一般登錄
    Recorded,
    /// 外發送出
    SentOut,
    /// 外發收回
    ReceivedIn,
    /// 次品登錄
    DefectLogged,
    /// 損耗沖銷
    LossReconciled,
    /// 數量調整
    Adjustment,
}

impl FromStr for ActivityAction {
    type Err = TrackError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "recorded" => Ok(ActivityAction::Recorded),
            "sent_out" => Ok(ActivityAction::SentOut),
            "received_in" => Ok(ActivityAction::ReceivedIn),
            "defect_logged" => Ok(ActivityAction::DefectLogged),
            "loss_reconciled" => Ok(ActivityAction::LossReconciled),
            "adjustment" => Ok(ActivityAction::Adjustment),
            _ => Err(TrackError::UnknownAction(raw.to_string())),
        }
    }
}

/// 生產活動
///
/// 針對單一組裝單的離散事件，屬不可變歷史記錄：
/// 本引擎只讀取並折疊為聚合結果，從不回寫。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    /// 活動ID
    pub id: Uuid,

    /// 組裝單ID
    pub assembly_id: String,

    /// 工序
    pub stage: Stage,

    /// 活動類別
    pub kind: ActivityKind,

    /// 活動動作（歷史資料可能缺漏）
    pub action: Option<ActivityAction>,

    /// 總量
    pub quantity: Decimal,

    /// 尺寸段分解（可選，缺漏時以總量為後備）
    pub qty_breakdown: Option<QuantityBreakdown>,

    /// 外發工序類型（僅外發往返活動攜帶）
    pub external_step_type: Option<String>,

    /// 外發廠商
    pub vendor: Option<String>,

    /// 記錄日期
    pub recorded_on: Option<NaiveDate>,
}

impl Activity {
    /// 創建新的活動
    pub fn new(assembly_id: String, stage: Stage, kind: ActivityKind, quantity: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            assembly_id,
            stage,
            kind,
            action: None,
            quantity,
            qty_breakdown: None,
            external_step_type: None,
            vendor: None,
            recorded_on: None,
        }
    }

    /// 建構器模式：設置動作
    pub fn with_action(mut self, action: ActivityAction) -> Self {
        self.action = Some(action);
        self
    }

    /// 建構器模式：設置尺寸段分解
    pub fn with_breakdown(mut self, breakdown: QuantityBreakdown) -> Self {
        self.qty_breakdown = Some(breakdown);
        self
    }

    /// 建構器模式：設置外發工序類型
    pub fn with_external_step(mut self, step_type: String) -> Self {
        self.external_step_type = Some(step_type);
        self
    }

    /// 建構器模式：設置外發廠商
    pub fn with_vendor(mut self, vendor: String) -> Self {
        self.vendor = Some(vendor);
        self
    }

    /// 建構器模式：設置記錄日期
    pub fn with_recorded_on(mut self, date: NaiveDate) -> Self {
        self.recorded_on = Some(date);
        self
    }

    /// 正規化後的尺寸段分解
    ///
    /// 有分解時使用分解；只有總量時退回單槽位 `[quantity]`。
    pub fn normalized_breakdown(&self) -> QuantityBreakdown {
        match &self.qty_breakdown {
            Some(bd) => QuantityBreakdown::normalize(bd.as_slice(), self.quantity, true),
            None => QuantityBreakdown::normalize(&[], self.quantity, true),
        }
    }

    /// 檢查是否為次品活動
    pub fn is_defect(&self) -> bool {
        self.kind == ActivityKind::Defect
    }

    /// 檢查是否為外發往返活動
    pub fn is_external(&self) -> bool {
        self.external_step_type.is_some()
    }
}
