// 📋 Analytics Report - one snapshot of graph, metrics, bottlenecks, alerts and quality

use crate::alerts::{collect_alerts, Alert};
use crate::config::EngineConfig;
use crate::dataset::Dataset;
use crate::graph::{build_supply_chain_graph, GraphStats, SupplyChainGraph};
use crate::metrics::{detect_bottlenecks, fmt_days, Bottleneck, MetricsReport};
use crate::quality::{DataQualityEngine, QualitySummary};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub report_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Reference day for overdue/delayed alerts
    pub as_of: NaiveDate,
    pub bottleneck_factor: f64,
    pub graph: GraphStats,
    pub metrics: MetricsReport,
    pub bottlenecks: Vec<Bottleneck>,
    pub alerts: Vec<Alert>,
    pub quality: QualitySummary,
}

impl AnalyticsReport {
    pub fn generate(dataset: &Dataset, config: &EngineConfig, today: NaiveDate) -> Self {
        let graph = build_supply_chain_graph(
            &dataset.transactions,
            &dataset.batches,
            &dataset.logistics,
        );
        Self::from_graph(dataset, &graph, config, today)
    }

    /// Report over a graph the caller already built from `dataset`
    pub fn from_graph(
        dataset: &Dataset,
        graph: &SupplyChainGraph,
        config: &EngineConfig,
        today: NaiveDate,
    ) -> Self {
        let quality = DataQualityEngine::new().validate(dataset);

        let report = AnalyticsReport {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            as_of: today,
            bottleneck_factor: config.bottleneck_factor,
            graph: graph.stats(),
            metrics: MetricsReport::compute(&dataset.transactions, &dataset.logistics),
            bottlenecks: detect_bottlenecks(&dataset.logistics, config.bottleneck_factor),
            alerts: collect_alerts(dataset, today),
            quality: QualitySummary::from(&quality),
        };

        tracing::info!(report_id = %report.report_id, "Generated analytics report");
        report
    }

    /// Human-readable lines for the terminal
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!(
                "Network: {} nodes ({} entities, {} locations, {} batches), {} edges",
                self.graph.node_count,
                self.graph.entity_count,
                self.graph.location_count,
                self.graph.batch_count,
                self.graph.edge_count
            ),
            format!(
                "Transactions: {} (total value ${:.2})",
                self.metrics.transaction_count, self.metrics.total_transaction_value
            ),
            format!(
                "Average payment lead time: {}",
                fmt_days(self.metrics.average_payment_lead_time)
            ),
            format!(
                "Working capital cycle: {}",
                fmt_days(self.metrics.working_capital_cycle)
            ),
            format!(
                "Logistics moves: {} (average transit {})",
                self.metrics.logistics_move_count,
                fmt_days(self.metrics.average_transit_days)
            ),
            format!(
                "Bottlenecks (> {:.1}x mean transit): {}",
                self.bottleneck_factor,
                self.bottlenecks.len()
            ),
        ];

        for alert in &self.alerts {
            lines.push(format!("⚠ {}", alert.message));
        }

        lines.push(format!(
            "Data quality: {} records, {} critical, {} warnings, {} info",
            self.quality.records_checked,
            self.quality.critical,
            self.quality.warnings,
            self.quality.info
        ));

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture() -> Dataset {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata");
        Dataset::from_dir(&dir).unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_generate_fixture_report() {
        let report = AnalyticsReport::generate(&fixture(), &EngineConfig::default(), day("2024-07-15"));

        for line in report.summary_lines() {
            println!("{}", line);
        }

        assert_eq!(report.graph.node_count, 16);
        assert_eq!(report.graph.edge_count, 10);
        assert_eq!(report.metrics.average_payment_lead_time, Some(7.0));
        assert_eq!(report.bottlenecks.len(), 1);
        assert_eq!(report.alerts.len(), 2);
        assert_eq!(report.quality.critical, 0);
    }

    #[test]
    fn test_factor_changes_bottlenecks() {
        let strict = EngineConfig::new(3.0).unwrap();
        let report = AnalyticsReport::generate(&fixture(), &strict, day("2024-07-15"));

        // Threshold 12 days: the 10-day leg no longer qualifies
        assert!(report.bottlenecks.is_empty());
        assert_eq!(report.bottleneck_factor, 3.0);
    }

    #[test]
    fn test_from_graph_matches_generate() {
        let data = fixture();
        let graph = build_supply_chain_graph(&data.transactions, &data.batches, &data.logistics);

        let shared = AnalyticsReport::from_graph(&data, &graph, &EngineConfig::default(), day("2024-07-15"));
        let own = AnalyticsReport::generate(&data, &EngineConfig::default(), day("2024-07-15"));

        assert_eq!(shared.graph.node_count, own.graph.node_count);
        assert_eq!(shared.graph.edge_count, own.graph.edge_count);
        assert_eq!(shared.bottlenecks.len(), own.bottlenecks.len());
        assert_eq!(shared.alerts.len(), own.alerts.len());
    }

    #[test]
    fn test_summary_lines() {
        let report = AnalyticsReport::generate(&Dataset::demo(), &EngineConfig::default(), day("2024-07-15"));
        let lines = report.summary_lines();

        assert!(lines.iter().any(|l| l == "Working capital cycle: 12.0 days"));
        assert!(lines.iter().any(|l| l.starts_with("Bottlenecks (> 1.5x mean transit): 0")));
        assert!(lines.last().unwrap().starts_with("Data quality:"));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = AnalyticsReport::generate(&fixture(), &EngineConfig::default(), day("2024-07-15"));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["metrics"]["working_capital_cycle"], 9.75);
        assert_eq!(json["bottlenecks"][0]["move"]["shipment_id"], "S-102");
        assert_eq!(json["as_of"], "2024-07-15");
        assert!(json["report_id"].is_string());
    }

    #[test]
    fn test_each_report_has_its_own_id() {
        let data = Dataset::demo();
        let a = AnalyticsReport::generate(&data, &EngineConfig::default(), day("2024-07-15"));
        let b = AnalyticsReport::generate(&data, &EngineConfig::default(), day("2024-07-15"));

        assert_ne!(a.report_id, b.report_id);
    }
}
