// Aquachain - Supply Chain Graph & Metrics Engine
// Exposes all modules for use in CLI, API server, and tests

pub mod alerts;
pub mod config;
pub mod dataset;
pub mod dates;
pub mod demo;
pub mod error;
pub mod graph;
pub mod loader;
pub mod metrics;
pub mod quality;
pub mod records;
pub mod report;

#[cfg(feature = "server")]
pub mod api; // JSON API (axum)

// Re-export commonly used types
pub use alerts::{collect_alerts, delayed_shipments, overdue_payments, Alert, AlertKind};
pub use config::{Config, EngineConfig};
pub use dataset::Dataset;
pub use error::EngineError;
pub use graph::{
    build_supply_chain_graph, EdgeKind, EdgeView, GraphStats, NodeDegree, NodeKind,
    SupplyChainGraph, SupplyEdge, SupplyNode,
};
pub use loader::{
    detect_kind, load_batches, load_embedded_logistics, load_logistics, load_records,
    load_transactions, CsvRecord,
};
pub use metrics::{
    average_payment_lead_time, compute_payment_lead_times, compute_working_capital,
    detect_bottlenecks, Bottleneck, CostSummary, MetricsReport, DEFAULT_BOTTLENECK_FACTOR,
};
pub use quality::{DataQualityEngine, QualityIssue, QualityReport, QualitySummary, Severity};
pub use records::{Batch, LogisticsMove, RecordKind, RejectedCell, Transaction};
pub use report::AnalyticsReport;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
