// ⚠️ Alerts - overdue payments and delayed shipments
//
// `today` is passed in so callers (and tests) control the clock.

use crate::dataset::Dataset;
use crate::records::{LogisticsMove, Transaction};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    OverduePayment,
    DelayedShipment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub count: usize,
    pub message: String,
}

/// Unpaid transactions due on or before `today`
///
/// Only an explicit `paid = false` counts; an unknown paid flag is not overdue.
/// A payment still open on its due day is already overdue.
pub fn overdue_payments<'a>(transactions: &'a [Transaction], today: NaiveDate) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|tx| tx.paid == Some(false))
        .filter(|tx| matches!(tx.payment_due_date(), Some(due) if due.date() <= today))
        .collect()
}

/// Undelivered moves whose ETA is on or before `today`
pub fn delayed_shipments<'a>(logistics: &'a [LogisticsMove], today: NaiveDate) -> Vec<&'a LogisticsMove> {
    logistics
        .iter()
        .filter(|mv| mv.delivered == Some(false))
        .filter(|mv| matches!(mv.delivery_eta(), Some(eta) if eta.date() <= today))
        .collect()
}

/// All alerts that currently apply, in display order
pub fn collect_alerts(dataset: &Dataset, today: NaiveDate) -> Vec<Alert> {
    let mut alerts = Vec::new();

    let overdue = overdue_payments(&dataset.transactions, today).len();
    if overdue > 0 {
        alerts.push(Alert {
            kind: AlertKind::OverduePayment,
            count: overdue,
            message: format!("{} payments overdue!", overdue),
        });
    }

    let delayed = delayed_shipments(&dataset.logistics, today).len();
    if delayed > 0 {
        alerts.push(Alert {
            kind: AlertKind::DelayedShipment,
            count: delayed,
            message: format!("{} shipment(s) delayed!", delayed),
        });
    }

    alerts
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
    fn test_overdue_payments() {
        let data = fixture();
        let overdue = overdue_payments(&data.transactions, day("2024-07-15"));

        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].from_entity, "Green Oceans");
    }

    #[test]
    fn test_overdue_on_due_date() {
        let data = fixture();
        // Green Oceans is due 2024-07-03 and still unpaid that day
        assert!(overdue_payments(&data.transactions, day("2024-07-02")).is_empty());
        assert_eq!(overdue_payments(&data.transactions, day("2024-07-03")).len(), 1);

        let tx = Transaction::new("A", "B", "B001").with_payment_status("2024-07-03", false);
        assert_eq!(overdue_payments(&[tx], day("2024-07-03")).len(), 1);
    }

    #[test]
    fn test_delayed_on_eta_day() {
        let mv = LogisticsMove::new("B001", "Farm", "Port").with_shipment("S-1", "2024-07-12", false);

        assert!(delayed_shipments(std::slice::from_ref(&mv), day("2024-07-11")).is_empty());
        assert_eq!(delayed_shipments(&[mv], day("2024-07-12")).len(), 1);
    }

    #[test]
    fn test_unknown_paid_flag_never_overdue() {
        let mut tx = Transaction::new("A", "B", "B001");
        tx.payment_due_date = Some("2020-01-01".to_string());

        assert!(overdue_payments(&[tx], day("2024-01-01")).is_empty());
    }

    #[test]
    fn test_delayed_shipments() {
        let data = fixture();
        let delayed = delayed_shipments(&data.logistics, day("2024-07-15"));

        let ids: Vec<_> = delayed.iter().filter_map(|mv| mv.shipment_id.as_deref()).collect();
        assert_eq!(ids, vec!["S-102", "S-104"]);
    }

    #[test]
    fn test_collect_alerts() {
        let data = fixture();
        let alerts = collect_alerts(&data, day("2024-07-15"));

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, AlertKind::OverduePayment);
        assert_eq!(alerts[0].message, "1 payments overdue!");
        assert_eq!(alerts[1].kind, AlertKind::DelayedShipment);
        assert_eq!(alerts[1].message, "2 shipment(s) delayed!");
    }

    #[test]
    fn test_no_alerts_before_anything_is_due() {
        let data = fixture();
        assert!(collect_alerts(&data, day("2024-06-01")).is_empty());
    }
}
