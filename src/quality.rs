// ✅ Data Quality Engine - checks the record sets before they feed the graph
//
// Nothing here blocks analytics: every metric already skips bad values.
// The report tells the operator which rows were skipped or look suspicious.

use crate::dataset::Dataset;
use crate::dates;
use crate::records::{Batch, LogisticsMove, RecordKind, RejectedCell, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ============================================================================
// QUALITY ISSUE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical, // Row breaks an invariant (missing identity, duplicate batch id)
    Warning,  // Row is questionable and some metric will skip it
    Info,     // Row is valid but unusual
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: Severity,
    pub kind: RecordKind,
    /// 1-based line in the source file (header is line 1)
    pub line: usize,
    pub field: String,
    pub issue: String,
    pub recommendation: String,
}

// ============================================================================
// QUALITY REPORT
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityReport {
    pub records_checked: usize,
    pub issues: Vec<QualityIssue>,
}

impl QualityReport {
    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn has_critical_issues(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Critical)
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} records checked: {} issues ({} critical, {} warnings, {} info)",
            self.records_checked,
            self.issues.len(),
            self.count(Severity::Critical),
            self.count(Severity::Warning),
            self.count(Severity::Info)
        )
    }
}

/// Compact form embedded in the analytics report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualitySummary {
    pub records_checked: usize,
    pub critical: usize,
    pub warnings: usize,
    pub info: usize,
}

impl From<&QualityReport> for QualitySummary {
    fn from(report: &QualityReport) -> Self {
        QualitySummary {
            records_checked: report.records_checked,
            critical: report.count(Severity::Critical),
            warnings: report.count(Severity::Warning),
            info: report.count(Severity::Info),
        }
    }
}

// ============================================================================
// DATA QUALITY ENGINE
// ============================================================================

pub struct DataQualityEngine {
    /// Known batch lifecycle statuses (case-insensitive)
    known_statuses: Vec<String>,
}

/// Collects issues for one record set
struct IssueSink<'a> {
    kind: RecordKind,
    issues: &'a mut Vec<QualityIssue>,
}

impl IssueSink<'_> {
    fn push(&mut self, index: usize, severity: Severity, field: &str, issue: String, recommendation: &str) {
        self.issues.push(QualityIssue {
            severity,
            kind: self.kind,
            line: index + 2,
            field: field.to_string(),
            issue,
            recommendation: recommendation.to_string(),
        });
    }

    fn check_date(&mut self, index: usize, field: &str, raw: Option<&String>) {
        if dates::is_unparseable(raw) {
            self.push(
                index,
                Severity::Warning,
                field,
                format!("Invalid date: {}", raw.map(String::as_str).unwrap_or("")),
                "Use YYYY-MM-DD or MM/DD/YYYY",
            );
        }
    }

    /// Cells the loader kept as unset because they did not parse
    fn check_rejected(&mut self, index: usize, rejected: &[RejectedCell]) {
        for cell in rejected {
            let recommendation = match cell.field.as_str() {
                "paid" | "delivered" => "Use true/false, yes/no or 1/0",
                _ => "Use a plain number such as 3000.50",
            };
            self.push(
                index,
                Severity::Warning,
                &cell.field,
                format!("Invalid value: {}", cell.value),
                recommendation,
            );
        }
    }

    fn check_required(&mut self, index: usize, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(
                index,
                Severity::Critical,
                field,
                format!("{} is empty", field),
                "Every row needs its identity columns filled in",
            );
        }
    }
}

impl DataQualityEngine {
    pub fn new() -> Self {
        DataQualityEngine {
            known_statuses: vec![
                "Harvested".to_string(),
                "Processing".to_string(),
                "Processed".to_string(),
                "In Storage".to_string(),
                "In Transit".to_string(),
                "Delivered".to_string(),
                "Sold".to_string(),
                "Recalled".to_string(),
            ],
        }
    }

    /// Validate all three record sets
    pub fn validate(&self, dataset: &Dataset) -> QualityReport {
        let mut issues = Vec::new();

        let known_batches: HashSet<&str> = dataset
            .batches
            .iter()
            .map(|b| b.batch_id.as_str())
            .collect();

        self.validate_batches(&dataset.batches, &mut issues);
        self.validate_transactions(&dataset.transactions, &known_batches, &mut issues);
        self.validate_logistics(&dataset.logistics, &known_batches, &mut issues);

        let report = QualityReport {
            records_checked: dataset.transactions.len()
                + dataset.batches.len()
                + dataset.logistics.len(),
            issues,
        };

        if report.has_critical_issues() {
            tracing::warn!("{}", report.summary());
        } else {
            tracing::debug!("{}", report.summary());
        }
        report
    }

    // ========================================================================
    // VALIDATION RULES
    // ========================================================================

    fn validate_batches(&self, batches: &[Batch], issues: &mut Vec<QualityIssue>) {
        let mut sink = IssueSink {
            kind: RecordKind::Batches,
            issues,
        };
        let mut first_seen: HashMap<&str, usize> = HashMap::new();

        for (i, batch) in batches.iter().enumerate() {
            sink.check_required(i, "batch_id", &batch.batch_id);

            if !batch.batch_id.is_empty() {
                if let Some(first) = first_seen.get(batch.batch_id.as_str()) {
                    sink.push(
                        i,
                        Severity::Critical,
                        "batch_id",
                        format!(
                            "Duplicate batch id {} (first seen on line {})",
                            batch.batch_id,
                            first + 2
                        ),
                        "Batch ids must be unique",
                    );
                } else {
                    first_seen.insert(&batch.batch_id, i);
                }
            }

            sink.check_date(i, "production_date", batch.production_date.as_ref());

            if let Some(status) = &batch.status {
                let known = self
                    .known_statuses
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(status));
                if !known {
                    sink.push(
                        i,
                        Severity::Info,
                        "status",
                        format!("Unknown status: {}", status),
                        &format!("Use one of: {}", self.known_statuses.join(", ")),
                    );
                }
            }
        }
    }

    fn validate_transactions(
        &self,
        transactions: &[Transaction],
        known_batches: &HashSet<&str>,
        issues: &mut Vec<QualityIssue>,
    ) {
        let mut sink = IssueSink {
            kind: RecordKind::Transactions,
            issues,
        };
        let mut fingerprints: HashMap<String, usize> = HashMap::new();

        for (i, tx) in transactions.iter().enumerate() {
            sink.check_required(i, "from_entity", &tx.from_entity);
            sink.check_required(i, "to_entity", &tx.to_entity);
            sink.check_required(i, "batch_id", &tx.batch_id);

            sink.check_date(i, "transaction_date", tx.transaction_date.as_ref());
            sink.check_date(i, "delivery_date", tx.delivery_date.as_ref());
            sink.check_date(i, "payment_date", tx.payment_date.as_ref());
            sink.check_date(i, "payment_due_date", tx.payment_due_date.as_ref());
            sink.check_rejected(i, &tx.rejected);

            if !tx.from_entity.is_empty() && tx.from_entity == tx.to_entity {
                sink.push(
                    i,
                    Severity::Info,
                    "to_entity",
                    format!("{} transfers to itself", tx.from_entity),
                    "Check whether the counterparty is correct",
                );
            }

            if let Some(amount) = tx.amount {
                if amount < 0.0 {
                    sink.push(
                        i,
                        Severity::Warning,
                        "amount",
                        format!("Negative amount: {:.2}", amount),
                        "Record refunds as a transaction in the opposite direction",
                    );
                }
            }

            if !known_batches.is_empty() && !known_batches.contains(tx.batch_id.as_str()) {
                sink.push(
                    i,
                    Severity::Warning,
                    "batch_id",
                    format!("Unknown batch: {}", tx.batch_id),
                    "Add the batch to the batches file",
                );
            }

            match fingerprints.get(&tx.fingerprint()) {
                Some(first) => sink.push(
                    i,
                    Severity::Warning,
                    "transaction",
                    format!("Duplicate of line {}", first + 2),
                    "Remove the repeated row",
                ),
                None => {
                    fingerprints.insert(tx.fingerprint(), i);
                }
            }
        }
    }

    fn validate_logistics(
        &self,
        logistics: &[LogisticsMove],
        known_batches: &HashSet<&str>,
        issues: &mut Vec<QualityIssue>,
    ) {
        let mut sink = IssueSink {
            kind: RecordKind::Logistics,
            issues,
        };

        for (i, mv) in logistics.iter().enumerate() {
            sink.check_required(i, "batch_id", &mv.batch_id);
            sink.check_required(i, "from_location", &mv.from_location);
            sink.check_required(i, "to_location", &mv.to_location);

            sink.check_date(i, "start_date", mv.start_date.as_ref());
            sink.check_date(i, "end_date", mv.end_date.as_ref());
            sink.check_date(i, "delivery_eta", mv.delivery_eta.as_ref());
            sink.check_rejected(i, &mv.rejected);

            if let Some(days) = mv.duration_days() {
                if days < 0 {
                    sink.push(
                        i,
                        Severity::Warning,
                        "end_date",
                        format!("Move ends {} day(s) before it starts", -days),
                        "Check start_date and end_date are not swapped",
                    );
                }
            }

            if let Some(cost) = mv.cost {
                if cost < 0.0 {
                    sink.push(
                        i,
                        Severity::Warning,
                        "cost",
                        format!("Negative cost: {:.2}", cost),
                        "Logistics cost should be zero or positive",
                    );
                }
            }

            if !known_batches.is_empty() && !known_batches.contains(mv.batch_id.as_str()) {
                sink.push(
                    i,
                    Severity::Warning,
                    "batch_id",
                    format!("Unknown batch: {}", mv.batch_id),
                    "Add the batch to the batches file",
                );
            }
        }
    }
}

impl Default for DataQualityEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture() -> Dataset {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata");
        Dataset::from_dir(&dir).unwrap()
    }

    #[test]
    fn test_fixture_is_clean() {
        let engine = DataQualityEngine::new();
        let report = engine.validate(&fixture());

        println!("Report: {}", report.summary());

        assert!(report.is_clean(), "unexpected issues: {:?}", report.issues);
        assert_eq!(report.records_checked, 13);
    }

    #[test]
    fn test_duplicate_batch_id_is_critical() {
        let engine = DataQualityEngine::new();
        let data = Dataset::new(
            vec![],
            vec![Batch::new("B001"), Batch::new("B002"), Batch::new("B001")],
            vec![],
        );

        let report = engine.validate(&data);

        assert!(report.has_critical_issues());
        let issue = &report.issues[0];
        assert_eq!(issue.kind, RecordKind::Batches);
        assert_eq!(issue.line, 4);
        assert!(issue.issue.contains("first seen on line 2"));
    }

    #[test]
    fn test_invalid_dates_are_warnings() {
        let engine = DataQualityEngine::new();
        let mut tx = Transaction::new("A", "B", "B001");
        tx.payment_date = Some("31/31/2024".to_string());

        let report = engine.validate(&Dataset::new(vec![tx], vec![], vec![]));

        assert_eq!(report.count(Severity::Warning), 1);
        assert_eq!(report.issues[0].field, "payment_date");
        assert!(!report.has_critical_issues());
    }

    #[test]
    fn test_unreadable_cells_are_warnings() {
        let engine = DataQualityEngine::new();
        let data = "from_entity,to_entity,batch_id,amount,paid\n\
                    A,B,B001,\"$3,000\",pending\n";
        let txs: Vec<Transaction> =
            crate::loader::load_records_from_reader(data.as_bytes(), "orders.csv").unwrap();

        let report = engine.validate(&Dataset::new(txs, vec![], vec![]));

        assert_eq!(report.count(Severity::Warning), 2);
        assert!(!report.has_critical_issues());
        assert_eq!(report.issues[0].field, "amount");
        assert_eq!(report.issues[0].issue, "Invalid value: $3,000");
        assert_eq!(report.issues[1].field, "paid");
        assert_eq!(report.issues[1].line, 2);
    }

    #[test]
    fn test_empty_identity_is_critical() {
        let engine = DataQualityEngine::new();
        let mv = LogisticsMove::new("B001", "", "Port");

        let report = engine.validate(&Dataset::new(vec![], vec![], vec![mv]));

        assert!(report.has_critical_issues());
        assert_eq!(report.issues[0].field, "from_location");
    }

    #[test]
    fn test_unknown_batch_reference() {
        let engine = DataQualityEngine::new();
        let data = Dataset::new(
            vec![Transaction::new("A", "B", "B404")],
            vec![Batch::new("B001")],
            vec![LogisticsMove::new("B001", "Farm", "Port")],
        );

        let report = engine.validate(&data);

        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, RecordKind::Transactions);
        assert_eq!(report.issues[0].issue, "Unknown batch: B404");
    }

    #[test]
    fn test_no_batches_table_skips_reference_check() {
        let engine = DataQualityEngine::new();
        let data = Dataset::new(vec![Transaction::new("A", "B", "B404")], vec![], vec![]);

        assert!(engine.validate(&data).is_clean());
    }

    #[test]
    fn test_move_ending_before_start() {
        let engine = DataQualityEngine::new();
        let mv = LogisticsMove::new("B001", "Farm", "Port")
            .with_window("2024-07-10", "2024-07-08")
            .with_cost(-5.0);

        let report = engine.validate(&Dataset::new(vec![], vec![], vec![mv]));

        let fields: Vec<_> = report.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["end_date", "cost"]);
        assert!(report.issues[0].issue.contains("2 day(s)"));
    }

    #[test]
    fn test_duplicate_transactions_and_self_transfer() {
        let engine = DataQualityEngine::new();
        let tx = Transaction::new("Coop", "Coop", "B001").with_dates("2024-07-01", "", "");
        let data = Dataset::new(vec![tx.clone(), tx], vec![], vec![]);

        let report = engine.validate(&data);

        assert_eq!(report.count(Severity::Info), 2, "both rows are self transfers");
        assert_eq!(report.count(Severity::Warning), 1, "second row is a duplicate");
        assert!(report.issues.iter().any(|i| i.issue == "Duplicate of line 2"));
    }

    #[test]
    fn test_unknown_status_is_info() {
        let engine = DataQualityEngine::new();
        let data = Dataset::new(
            vec![],
            vec![Batch::new("B001").with_status("in transit"), Batch::new("B002").with_status("Lost")],
            vec![],
        );

        let report = engine.validate(&data);

        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].severity, Severity::Info);
        assert_eq!(report.issues[0].line, 3);
    }

    #[test]
    fn test_summary_counts() {
        let report = QualityReport::default();
        let summary = QualitySummary::from(&report);

        assert_eq!(summary.critical, 0);
        assert_eq!(
            report.summary(),
            "0 records checked: 0 issues (0 critical, 0 warnings, 0 info)"
        );
    }
}
