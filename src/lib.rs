//! # Prodtrack
//!
//! 生產工序聚合與物料覆蓋評估引擎
//!
//! 由三個 crate 組成：
//! - `prodtrack-core`：資料模型與數量分解運算
//! - `prodtrack-calc`：工序統計、外發聚合、閘門計算與顯示行建構
//! - `prodtrack-coverage`：物料覆蓋評估與風險信號

// Re-export 主要類型
pub use prodtrack_core::{
    Activity, ActivityAction, ActivityKind, Assembly, BatchRef, BomLine, CoverageTolerance,
    DemandSource, MaterialDemandRow, PackSnapshot, PoLineRef, QuantityBreakdown,
    ReservationSource, Result, Stage, StageFallback, StageFallbacks, StockSnapshot,
    SupplyReservation, ToleranceConfig, TrackError,
};

pub use prodtrack_calc::{
    AggregationRequest, ExternalAggregate, ExternalAggregator, ExternalRowDetail,
    ExternalStepMeta, FinishCapCalculator, SewGate, SewGateCalculator, SewGateSource,
    StageAggregation, StageAggregator, StageDisplay, StageRow, StageRowBuilder, StageRowKind,
    StageRowSet, StageStats, StageStatsCalculator,
};

pub use prodtrack_coverage::{
    AssemblyMaterialCoverage, AssemblyRiskSignals, BomDemandCalculator, BomFallbackInputs,
    CoverageEvaluator, CoverageStatus, ExternalStepState, MaterialCoverageItem,
    MaterialHoldReason, NearestOpenStep, NextAction, NextActionKind, RiskSignalBuilder,
    VendorStepSummary, DUE_SOON_WINDOW_DAYS,
};
