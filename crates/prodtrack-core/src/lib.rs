//! # Prodtrack Core
//!
//! 核心資料模型與類型定義

pub mod activity;
pub mod assembly;
pub mod breakdown;
pub mod demand;
pub mod reservation;
pub mod stock;
pub mod tolerance;

// Re-export 主要類型
pub use activity::{Activity, ActivityAction, ActivityKind, Stage};
pub use assembly::{Assembly, PackSnapshot, StageFallback, StageFallbacks};
pub use breakdown::QuantityBreakdown;
pub use demand::{BomLine, DemandSource, MaterialDemandRow};
pub use reservation::{BatchRef, PoLineRef, ReservationSource, SupplyReservation};
pub use stock::StockSnapshot;
pub use tolerance::{CoverageTolerance, ToleranceConfig};

/// 生產追蹤錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("無法識別的工序: {0}")]
    UnknownStage(String),

    #[error("無法識別的活動類別: {0}")]
    UnknownKind(String),

    #[error("無法識別的活動動作: {0}")]
    UnknownAction(String),

    #[error("無效的日期: {0}")]
    InvalidDate(String),

    #[error("其他錯誤: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TrackError>;
