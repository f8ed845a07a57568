//! # Prodtrack Coverage
//!
//! 物料覆蓋與採購風險評估

pub mod bom_fallback;
pub mod evaluator;
pub mod risk;

// Re-export 主要類型
pub use bom_fallback::BomDemandCalculator;
pub use evaluator::{
    AssemblyMaterialCoverage, BomFallbackInputs, CoverageEvaluator, CoverageStatus,
    MaterialCoverageItem, MaterialHoldReason, DUE_SOON_WINDOW_DAYS,
};
pub use risk::{
    AssemblyRiskSignals, ExternalStepState, NearestOpenStep, NextAction, NextActionKind,
    RiskSignalBuilder, VendorStepSummary,
};
