//! 組裝單工序追蹤完整範例
//!
//! 展示從活動清單到工序顯示行的完整聚合流程

use chrono::NaiveDate;
use prodtrack::*;
use rust_decimal::Decimal;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    println!("===== Assembly Stage Tracking Example =====\n");

    // 步驟 1: 建立組裝單與活動
    println!("[1] Create Assembly & Activities");
    let ordered = QuantityBreakdown::from_slots(vec![
        Decimal::from(40),
        Decimal::from(50),
        Decimal::from(30),
    ]);
    println!("    ASM-100: ordered {} pcs in 3 sizes", ordered.total());

    let activities = vec![
        // 裁剪全數完成
        Activity::new(
            "ASM-100".to_string(),
            Stage::Cut,
            ActivityKind::Normal,
            Decimal::from(120),
        )
        .with_breakdown(ordered.clone())
        .with_recorded_on(NaiveDate::from_ymd_opt(2026, 3, 20).unwrap()),
        // 送繡花廠
        Activity::new(
            "ASM-100".to_string(),
            Stage::Sew,
            ActivityKind::Normal,
            Decimal::from(120),
        )
        .with_action(ActivityAction::SentOut)
        .with_breakdown(ordered.clone())
        .with_external_step("embroidery".to_string())
        .with_vendor("VENDOR-07".to_string()),
        // 部分收回
        Activity::new(
            "ASM-100".to_string(),
            Stage::Sew,
            ActivityKind::Normal,
            Decimal::from(90),
        )
        .with_action(ActivityAction::ReceivedIn)
        .with_breakdown(QuantityBreakdown::from_slots(vec![
            Decimal::from(40),
            Decimal::from(30),
            Decimal::from(20),
        ]))
        .with_external_step("embroidery".to_string()),
        // 後整
        Activity::new(
            "ASM-100".to_string(),
            Stage::Finish,
            ActivityKind::Normal,
            Decimal::from(85),
        )
        .with_breakdown(QuantityBreakdown::from_slots(vec![
            Decimal::from(35),
            Decimal::from(30),
            Decimal::from(20),
        ])),
    ];
    println!("    {} activities recorded\n", activities.len());

    // 步驟 2: 工序聚合
    println!("[2] Aggregate Stages");
    let aggregation = StageAggregator::aggregate(
        "ASM-100",
        &ordered,
        &StageFallbacks::new(),
        &PackSnapshot::default(),
        &activities,
    );
    println!("    effective ordered: {}", aggregation.effective_ordered_total);
    println!("    cut:    {}", aggregation.display_cut.total);
    println!("    finish: {}", aggregation.display_finish.total);
    for external in &aggregation.externals {
        println!(
            "    external {}: sent {} / received {} / loss {}",
            external.step_type, external.sent_total, external.received_total, external.loss_total
        );
    }
    println!();

    // 步驟 3: 建構顯示行
    println!("[3] Build Stage Rows");
    let meta = vec![ExternalStepMeta::new("embroidery".to_string())
        .with_vendor("VENDOR-07".to_string())
        .with_eta(NaiveDate::from_ymd_opt(2026, 4, 10).unwrap())];
    let row_set = StageRowBuilder::build(&aggregation, &meta);

    for row in &row_set.rows {
        match row.gate_source {
            Some(source) => println!("    {:<12} {:>6}  (gate: {:?})", row.label, row.total, source),
            None => println!("    {:<12} {:>6}", row.label, row.total),
        }
    }
    println!(
        "\n    finish input cap: {}",
        row_set.finish_input_cap.total()
    );

    Ok(())
}
