//! 外發工序聚合

use prodtrack_core::{Activity, ActivityAction, QuantityBreakdown};
use rust_decimal::Decimal;
use serde::Serialize;

/// 單一外發工序的送收聚合
#[derive(Debug, Clone, Serialize)]
pub struct ExternalAggregate {
    /// 外發工序類型
    pub step_type: String,

    /// 送出分解
    pub sent: QuantityBreakdown,
    /// 送出總量
    pub sent_total: Decimal,

    /// 收回分解
    pub received: QuantityBreakdown,
    /// 收回總量
    pub received_total: Decimal,

    /// 淨量分解：`min(送出, 收回)`
    pub net: QuantityBreakdown,
    /// 淨量總量
    pub net_total: Decimal,

    /// 損耗分解：`max(送出 - 收回, 0)`
    pub loss: QuantityBreakdown,
    /// 損耗總量
    pub loss_total: Decimal,
}

impl ExternalAggregate {
    /// 創建無任何送收記錄的空聚合（預期但未開始的外發工序）
    pub fn empty(step_type: String) -> Self {
        Self::from_accumulated(step_type, QuantityBreakdown::new(), QuantityBreakdown::new())
    }

    fn from_accumulated(step_type: String, sent: QuantityBreakdown, received: QuantityBreakdown) -> Self {
        let net = QuantityBreakdown::element_min(&sent, &received);
        let loss = QuantityBreakdown::saturating_sub(&sent, &received);
        Self {
            sent_total: sent.total(),
            received_total: received.total(),
            net_total: net.total(),
            loss_total: loss.total(),
            step_type,
            sent,
            received,
            net,
            loss,
        }
    }
}

/// 外發工序聚合器
pub struct ExternalAggregator;

impl ExternalAggregator {
    /// 聚合外發往返活動
    ///
    /// 按工序類型分組（保留首見順序）；送出動作累入 `sent`、
    /// 收回動作累入 `received`。動作無法歸類或分解不可用的活動
    /// 直接略過，不視為錯誤。
    pub fn aggregate(activities: &[Activity]) -> Vec<ExternalAggregate> {
        let mut order: Vec<String> = Vec::new();
        let mut accumulated: std::collections::HashMap<String, (QuantityBreakdown, QuantityBreakdown)> =
            std::collections::HashMap::new();

        for activity in activities {
            let step_type = match &activity.external_step_type {
                Some(step_type) => step_type.clone(),
                None => continue,
            };

            let breakdown = activity.normalized_breakdown();
            let is_sent = match activity.action {
                Some(ActivityAction::SentOut) => true,
                Some(ActivityAction::ReceivedIn) => false,
                _ => continue,
            };
            if breakdown.is_empty() {
                continue;
            }

            let entry = accumulated.entry(step_type.clone()).or_insert_with(|| {
                order.push(step_type.clone());
                (QuantityBreakdown::new(), QuantityBreakdown::new())
            });

            if is_sent {
                entry.0.add_into(&breakdown);
            } else {
                entry.1.add_into(&breakdown);
            }
        }

        order
            .into_iter()
            .map(|step_type| {
                let (sent, received) = accumulated.remove(&step_type).unwrap_or_default();
                ExternalAggregate::from_accumulated(step_type, sent, received)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prodtrack_core::{ActivityKind, Stage};

    fn bd(slots: &[i64]) -> QuantityBreakdown {
        QuantityBreakdown::from_slots(slots.iter().map(|q| Decimal::from(*q)).collect())
    }

    fn external_activity(step: &str, action: ActivityAction, slots: &[i64]) -> Activity {
        let breakdown = bd(slots);
        let total = breakdown.total();
        Activity::new("ASM-001".to_string(), Stage::Sew, ActivityKind::Normal, total)
            .with_action(action)
            .with_breakdown(breakdown)
            .with_external_step(step.to_string())
    }

    #[test]
    fn test_sent_received_accumulation() {
        let activities = vec![
            external_activity("embroidery", ActivityAction::SentOut, &[10, 10]),
            external_activity("embroidery", ActivityAction::SentOut, &[5, 0]),
            external_activity("embroidery", ActivityAction::ReceivedIn, &[12, 6]),
        ];

        let aggregates = ExternalAggregator::aggregate(&activities);
        assert_eq!(aggregates.len(), 1);

        let agg = &aggregates[0];
        assert_eq!(agg.step_type, "embroidery");
        assert_eq!(agg.sent_total, Decimal::from(25));
        assert_eq!(agg.received_total, Decimal::from(18));
        // net = min(sent, received)
        assert_eq!(agg.net.slot(0), Decimal::from(12));
        assert_eq!(agg.net.slot(1), Decimal::from(6));
        // loss = max(sent - received, 0)
        assert_eq!(agg.loss.slot(0), Decimal::from(3));
        assert_eq!(agg.loss.slot(1), Decimal::from(4));
        assert_eq!(agg.loss_total, Decimal::from(7));
    }

    #[test]
    fn test_groups_preserve_first_seen_order() {
        let activities = vec![
            external_activity("dyeing", ActivityAction::SentOut, &[8]),
            external_activity("embroidery", ActivityAction::SentOut, &[4]),
            external_activity("dyeing", ActivityAction::ReceivedIn, &[8]),
        ];

        let aggregates = ExternalAggregator::aggregate(&activities);
        assert_eq!(aggregates.len(), 2);
        assert_eq!(aggregates[0].step_type, "dyeing");
        assert_eq!(aggregates[1].step_type, "embroidery");
    }

    #[test]
    fn test_unrecognized_action_skipped() {
        let activities = vec![
            external_activity("printing", ActivityAction::SentOut, &[9]),
            // 調整動作無法歸入送出/收回，略過
            external_activity("printing", ActivityAction::Adjustment, &[5]),
        ];

        let aggregates = ExternalAggregator::aggregate(&activities);
        assert_eq!(aggregates[0].sent_total, Decimal::from(9));
        assert_eq!(aggregates[0].received_total, Decimal::ZERO);
    }

    #[test]
    fn test_non_external_activities_ignored() {
        let internal = Activity::new(
            "ASM-001".to_string(),
            Stage::Sew,
            ActivityKind::Normal,
            Decimal::from(20),
        );

        let aggregates = ExternalAggregator::aggregate(&[internal]);
        assert!(aggregates.is_empty());
    }

    #[test]
    fn test_received_only_step() {
        let activities = vec![external_activity(
            "washing",
            ActivityAction::ReceivedIn,
            &[3, 4],
        )];

        let aggregates = ExternalAggregator::aggregate(&activities);
        // 無送出記錄時淨量為 0，不產生負損耗
        assert_eq!(aggregates[0].net_total, Decimal::ZERO);
        assert_eq!(aggregates[0].loss_total, Decimal::ZERO);
        assert_eq!(aggregates[0].received_total, Decimal::from(7));
    }
}
