// 📊 Metrics - payment lead time, working capital cycle, logistics bottlenecks
//
// Every average skips rows whose dates are missing or unparseable, the same
// way a mean over a column with gaps does.

use crate::dates;
use crate::records::{LogisticsMove, Transaction};
use serde::{Deserialize, Serialize};

/// Default multiple of the mean transit time above which a move is a bottleneck
pub const DEFAULT_BOTTLENECK_FACTOR: f64 = 1.5;

// ============================================================================
// FINANCE
// ============================================================================

/// Payment lead time per transaction (payment_date - delivery_date, days)
///
/// Aligned with the input: `None` where either date is missing.
pub fn compute_payment_lead_times(transactions: &[Transaction]) -> Vec<Option<i64>> {
    transactions.iter().map(|tx| tx.payment_lead_time()).collect()
}

/// Mean payment lead time in days
pub fn average_payment_lead_time(transactions: &[Transaction]) -> Option<f64> {
    dates::mean(transactions.iter().filter_map(|tx| tx.payment_lead_time()))
}

/// Working capital cycle: mean of (payment_date - transaction_date) in days
pub fn compute_working_capital(transactions: &[Transaction]) -> Option<f64> {
    dates::mean(transactions.iter().filter_map(|tx| tx.cash_cycle_days()))
}

// ============================================================================
// LOGISTICS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bottleneck {
    /// Row index in the logistics input
    pub index: usize,
    pub duration_days: i64,
    pub average_days: f64,
    pub threshold_days: f64,
    #[serde(rename = "move")]
    pub logistics_move: LogisticsMove,
}

/// Moves whose transit time is strictly above `factor` × the mean transit time
pub fn detect_bottlenecks(logistics: &[LogisticsMove], factor: f64) -> Vec<Bottleneck> {
    let durations: Vec<(usize, i64)> = logistics
        .iter()
        .enumerate()
        .filter_map(|(i, mv)| mv.duration_days().map(|d| (i, d)))
        .collect();

    let Some(average) = dates::mean(durations.iter().map(|(_, d)| *d)) else {
        return Vec::new();
    };
    let threshold = average * factor;

    let bottlenecks: Vec<Bottleneck> = durations
        .into_iter()
        .filter(|(_, d)| *d as f64 > threshold)
        .map(|(index, duration_days)| Bottleneck {
            index,
            duration_days,
            average_days: average,
            threshold_days: threshold,
            logistics_move: logistics[index].clone(),
        })
        .collect();

    if !bottlenecks.is_empty() {
        tracing::debug!(
            count = bottlenecks.len(),
            average_days = average,
            "Detected logistics bottlenecks"
        );
    }

    bottlenecks
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostSummary {
    pub moves_with_cost: usize,
    pub total_cost: f64,
    pub average_cost: Option<f64>,
}

pub fn logistics_cost_summary(logistics: &[LogisticsMove]) -> CostSummary {
    let costs: Vec<f64> = logistics.iter().filter_map(|mv| mv.cost).collect();
    let total_cost: f64 = costs.iter().sum();

    CostSummary {
        moves_with_cost: costs.len(),
        total_cost,
        average_cost: if costs.is_empty() {
            None
        } else {
            Some(total_cost / costs.len() as f64)
        },
    }
}

// ============================================================================
// METRICS REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsReport {
    pub transaction_count: usize,
    pub total_transaction_value: f64,

    /// `None` when no transaction has both delivery and payment dates
    pub average_payment_lead_time: Option<f64>,

    /// `None` when no transaction has both transaction and payment dates
    pub working_capital_cycle: Option<f64>,

    pub logistics_move_count: usize,
    pub average_transit_days: Option<f64>,
    pub logistics_cost: CostSummary,
}

impl MetricsReport {
    pub fn compute(transactions: &[Transaction], logistics: &[LogisticsMove]) -> Self {
        MetricsReport {
            transaction_count: transactions.len(),
            total_transaction_value: transactions.iter().filter_map(|tx| tx.amount).sum(),
            average_payment_lead_time: average_payment_lead_time(transactions),
            working_capital_cycle: compute_working_capital(transactions),
            logistics_move_count: logistics.len(),
            average_transit_days: dates::mean(logistics.iter().filter_map(|mv| mv.duration_days())),
            logistics_cost: logistics_cost_summary(logistics),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Lead time: {}, Working capital cycle: {}, Transit: {}",
            fmt_days(self.average_payment_lead_time),
            fmt_days(self.working_capital_cycle),
            fmt_days(self.average_transit_days)
        )
    }
}

/// "12.5 days" or "n/a"
pub fn fmt_days(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1} days", v),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use std::path::PathBuf;

    fn fixture() -> Dataset {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata");
        Dataset::from_dir(&dir).unwrap()
    }

    #[test]
    fn test_payment_lead_times_aligned_with_input() {
        let data = fixture();
        let lead_times = compute_payment_lead_times(&data.transactions);

        assert_eq!(lead_times, vec![Some(15), Some(10), None, Some(5), Some(-2)]);
    }

    #[test]
    fn test_average_lead_time_skips_missing() {
        let data = fixture();
        assert_eq!(average_payment_lead_time(&data.transactions), Some(7.0));
    }

    #[test]
    fn test_working_capital_cycle() {
        let data = fixture();
        assert_eq!(compute_working_capital(&data.transactions), Some(9.75));
    }

    #[test]
    fn test_working_capital_without_dates() {
        let txs = vec![Transaction::new("A", "B", "B001")];
        assert_eq!(compute_working_capital(&txs), None);
        assert_eq!(compute_working_capital(&[]), None);
    }

    #[test]
    fn test_detect_bottlenecks_fixture() {
        let data = fixture();
        let bottlenecks = detect_bottlenecks(&data.logistics, DEFAULT_BOTTLENECK_FACTOR);

        // Durations 2, 2, 10, 2 (last move has no end date): mean 4, threshold 6
        assert_eq!(bottlenecks.len(), 1);
        assert_eq!(bottlenecks[0].index, 2);
        assert_eq!(bottlenecks[0].duration_days, 10);
        assert_eq!(bottlenecks[0].average_days, 4.0);
        assert_eq!(bottlenecks[0].threshold_days, 6.0);
        assert_eq!(bottlenecks[0].logistics_move.shipment_id.as_deref(), Some("S-102"));
    }

    #[test]
    fn test_bottleneck_threshold_is_strict() {
        // Durations 1, 1, 4: mean 2, threshold 3 → only the 4-day leg
        let moves = vec![
            LogisticsMove::new("B1", "A", "B").with_window("2024-01-01", "2024-01-02"),
            LogisticsMove::new("B2", "A", "B").with_window("2024-01-01", "2024-01-02"),
            LogisticsMove::new("B3", "A", "B").with_window("2024-01-01", "2024-01-05"),
        ];
        assert_eq!(detect_bottlenecks(&moves, 1.5).len(), 1);

        // Exactly at threshold does not qualify: durations 2, 2 with factor 1.0
        let even = vec![
            LogisticsMove::new("B1", "A", "B").with_window("2024-01-01", "2024-01-03"),
            LogisticsMove::new("B2", "A", "B").with_window("2024-01-01", "2024-01-03"),
        ];
        assert!(detect_bottlenecks(&even, 1.0).is_empty());
    }

    #[test]
    fn test_bottlenecks_empty_input() {
        assert!(detect_bottlenecks(&[], DEFAULT_BOTTLENECK_FACTOR).is_empty());

        let undated = vec![LogisticsMove::new("B1", "A", "B")];
        assert!(detect_bottlenecks(&undated, DEFAULT_BOTTLENECK_FACTOR).is_empty());
    }

    #[test]
    fn test_demo_has_no_bottlenecks() {
        let data = Dataset::demo();
        assert!(detect_bottlenecks(&data.logistics, DEFAULT_BOTTLENECK_FACTOR).is_empty());
    }

    #[test]
    fn test_cost_summary() {
        let data = fixture();
        let summary = logistics_cost_summary(&data.logistics);

        assert_eq!(summary.moves_with_cost, 5);
        assert_eq!(summary.total_cost, 2060.0);
        assert_eq!(summary.average_cost, Some(412.0));
        assert_eq!(logistics_cost_summary(&[]).average_cost, None);
    }

    #[test]
    fn test_metrics_report() {
        let data = fixture();
        let report = MetricsReport::compute(&data.transactions, &data.logistics);

        println!("Metrics: {}", report.summary());

        assert_eq!(report.transaction_count, 5);
        assert_eq!(report.total_transaction_value, 23600.0);
        assert_eq!(report.average_payment_lead_time, Some(7.0));
        assert_eq!(report.working_capital_cycle, Some(9.75));
        assert_eq!(report.average_transit_days, Some(4.0));
    }

    #[test]
    fn test_demo_metrics_match_dashboard() {
        let data = Dataset::demo();
        let report = MetricsReport::compute(&data.transactions, &data.logistics);

        assert_eq!(report.average_payment_lead_time, Some(1.0));
        assert_eq!(report.working_capital_cycle, Some(12.0));
        assert_eq!(fmt_days(report.working_capital_cycle), "12.0 days");
    }
}
