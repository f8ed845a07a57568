//! 物料覆蓋與風險信號範例
//!
//! 展示從需求/預留/庫存快照到停擺信號的評估流程

use chrono::NaiveDate;
use prodtrack::*;
use rust_decimal::Decimal;

fn main() -> anyhow::Result<()> {
    println!("===== Material Coverage Example =====\n");

    let today = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();

    // 步驟 1: 組裝單與需求
    println!("[1] Assembly & Demand");
    let assembly = Assembly::new(
        "ASM-200".to_string(),
        QuantityBreakdown::from_slots(vec![Decimal::from(60), Decimal::from(40)]),
    )
    .with_target_date(NaiveDate::from_ymd_opt(2026, 4, 20).unwrap());

    let demands = vec![MaterialDemandRow::new(
        "ASM-200".to_string(),
        "FABRIC-NVY".to_string(),
        Decimal::from(300),
    )
    .with_product_type("fabric".to_string())];
    println!("    FABRIC-NVY: required 300\n");

    // 步驟 2: 預留與庫存
    println!("[2] Reservations & Stock");
    let line = PoLineRef::new("PO-2001".to_string(), 1, Decimal::from(200))
        .with_eta(NaiveDate::from_ymd_opt(2026, 4, 28).unwrap());
    let reservations = vec![SupplyReservation::new(
        "ASM-200".to_string(),
        "FABRIC-NVY".to_string(),
        Decimal::from(200),
        ReservationSource::PoLine(line),
    )];
    let stocks = vec![StockSnapshot::new(
        "FABRIC-NVY".to_string(),
        Decimal::from(50),
        Decimal::from(50),
    )];
    println!("    PO-2001#1: 200 pcs, ETA 2026-04-28 (after needed date)");
    println!("    on hand: 50\n");

    // 步驟 3: 覆蓋評估（容差 5%）
    println!("[3] Evaluate Coverage");
    let evaluator = CoverageEvaluator::new(ToleranceConfig::new(CoverageTolerance::new(
        Decimal::ZERO,
        Decimal::new(5, 2),
    )));
    let coverage_map = evaluator.evaluate(
        std::slice::from_ref(&assembly),
        &demands,
        &reservations,
        &stocks,
        &BomFallbackInputs::default(),
        today,
    );

    let coverage = &coverage_map["ASM-200"];
    for item in &coverage.items {
        println!(
            "    {}: required {} / uncovered {} / after tolerance {} => {:?}",
            item.product_id,
            item.required,
            item.qty_uncovered,
            item.qty_uncovered_after_tolerance,
            item.status
        );
    }
    println!("    held: {}\n", coverage.held);

    // 步驟 4: 風險信號
    println!("[4] Risk Signals");
    let aggregation = StageAggregator::aggregate(
        "ASM-200",
        &assembly.ordered,
        &StageFallbacks::new(),
        &PackSnapshot::default(),
        &[],
    );
    let signals = RiskSignalBuilder::build(
        &aggregation,
        &[],
        &reservations,
        Some(coverage),
        assembly.needed_date(),
        today,
    );

    println!("    po_hold: {}", signals.po_hold);
    if let Some(reason) = &signals.po_hold_reason {
        println!("    reason: {}", reason);
    }
    if let Some(line) = &signals.po_blocking_line {
        println!("    blocking line: {}", line);
    }
    for action in &signals.next_actions {
        println!("    next: {:?} - {}", action.kind, action.message);
    }

    Ok(())
}
