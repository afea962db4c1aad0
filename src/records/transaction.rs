// Transaction - financial / ownership transfer of a batch between two parties

use super::{typed_cell, RejectedCell};
use crate::dates::{self, deserialize_scalar, deserialize_text};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTransaction")]
pub struct Transaction {
    // ========================================================================
    // IDENTITY (required columns)
    // ========================================================================
    pub from_entity: String,
    pub to_entity: String,
    pub batch_id: String,

    // ========================================================================
    // DATES (raw, parsed on demand)
    // ========================================================================
    pub transaction_date: Option<String>,
    pub delivery_date: Option<String>,
    pub payment_date: Option<String>,
    pub payment_term: Option<String>,

    // ========================================================================
    // ORDER FIELDS (single-file dashboard exports carry these)
    // ========================================================================
    pub amount: Option<f64>,
    pub payment_due_date: Option<String>,
    pub paid: Option<bool>,

    /// Cells that did not parse (e.g. `paid=pending`, `amount=$3,000`)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedCell>,
}

/// Row as read from CSV, before typed fields are parsed
#[derive(Debug, Deserialize)]
struct RawTransaction {
    from_entity: String,
    to_entity: String,
    batch_id: String,
    #[serde(default, deserialize_with = "deserialize_text")]
    transaction_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    delivery_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    payment_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    payment_term: Option<String>,
    #[serde(default, deserialize_with = "deserialize_scalar")]
    amount: Option<String>,
    #[serde(default, deserialize_with = "deserialize_text")]
    payment_due_date: Option<String>,
    #[serde(default, deserialize_with = "deserialize_scalar")]
    paid: Option<String>,
}

impl From<RawTransaction> for Transaction {
    fn from(raw: RawTransaction) -> Self {
        let mut rejected = Vec::new();
        let amount = typed_cell("amount", raw.amount, dates::parse_number, &mut rejected);
        let paid = typed_cell("paid", raw.paid, dates::parse_flag, &mut rejected);

        Transaction {
            from_entity: raw.from_entity,
            to_entity: raw.to_entity,
            batch_id: raw.batch_id,
            transaction_date: raw.transaction_date,
            delivery_date: raw.delivery_date,
            payment_date: raw.payment_date,
            payment_term: raw.payment_term,
            amount,
            payment_due_date: raw.payment_due_date,
            paid,
            rejected,
        }
    }
}

impl Transaction {
    /// Create a transaction with identity fields only
    pub fn new(from_entity: &str, to_entity: &str, batch_id: &str) -> Self {
        Transaction {
            from_entity: from_entity.to_string(),
            to_entity: to_entity.to_string(),
            batch_id: batch_id.to_string(),
            transaction_date: None,
            delivery_date: None,
            payment_date: None,
            payment_term: None,
            amount: None,
            payment_due_date: None,
            paid: None,
            rejected: Vec::new(),
        }
    }

    /// Builder pattern: transaction, delivery and payment dates
    pub fn with_dates(mut self, transaction: &str, delivery: &str, payment: &str) -> Self {
        self.transaction_date = Some(transaction.to_string());
        self.delivery_date = Some(delivery.to_string());
        self.payment_date = Some(payment.to_string());
        self
    }

    /// Builder pattern: payment term
    pub fn with_payment_term(mut self, term: &str) -> Self {
        self.payment_term = Some(term.to_string());
        self
    }

    /// Builder pattern: amount
    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Builder pattern: payment due date and paid flag
    pub fn with_payment_status(mut self, due: &str, paid: bool) -> Self {
        self.payment_due_date = Some(due.to_string());
        self.paid = Some(paid);
        self
    }

    pub fn transaction_date(&self) -> Option<NaiveDateTime> {
        dates::parse_opt(self.transaction_date.as_ref())
    }

    pub fn delivery_date(&self) -> Option<NaiveDateTime> {
        dates::parse_opt(self.delivery_date.as_ref())
    }

    pub fn payment_date(&self) -> Option<NaiveDateTime> {
        dates::parse_opt(self.payment_date.as_ref())
    }

    pub fn payment_due_date(&self) -> Option<NaiveDateTime> {
        dates::parse_opt(self.payment_due_date.as_ref())
    }

    /// Days from delivery to payment (negative when paid before delivery)
    pub fn payment_lead_time(&self) -> Option<i64> {
        Some(dates::days_between(self.delivery_date()?, self.payment_date()?))
    }

    /// Days from transaction to payment
    pub fn cash_cycle_days(&self) -> Option<i64> {
        Some(dates::days_between(
            self.transaction_date()?,
            self.payment_date()?,
        ))
    }

    /// Fingerprint for duplicate-row detection
    /// NOTE: identity of the event, not of the batch
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "{}|{}|{}|{}",
            self.from_entity,
            self.to_entity,
            self.batch_id,
            self.transaction_date.as_deref().unwrap_or("")
        ));
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_time_and_cash_cycle() {
        let tx = Transaction::new("Blue Aqua", "FreshSeafood", "B001")
            .with_dates("2024-06-30", "2024-07-09", "2024-07-10");

        assert_eq!(tx.payment_lead_time(), Some(1));
        assert_eq!(tx.cash_cycle_days(), Some(10));
    }

    #[test]
    fn test_missing_dates_give_none() {
        let tx = Transaction::new("A", "B", "B001");
        assert_eq!(tx.payment_lead_time(), None);
        assert_eq!(tx.cash_cycle_days(), None);
    }

    #[test]
    fn test_fingerprint_stable_and_sensitive() {
        let a = Transaction::new("A", "B", "B001").with_dates("2024-07-01", "", "");
        let b = a.clone().with_amount(99.0);
        let c = Transaction::new("A", "B", "B002").with_dates("2024-07-01", "", "");

        assert_eq!(a.fingerprint(), b.fingerprint(), "amount is not part of identity");
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64, "SHA-256 hash should be 64 hex characters");
    }

    #[test]
    fn test_unreadable_cells_are_kept_as_rejected() {
        let data = "from_entity,to_entity,batch_id,amount,paid\n\
                    Blue Aqua,FreshSeafood,B001,\"$3,000\",pending\n\
                    Blue Aqua,FreshSeafood,B002,3000.5,False\n";
        let mut rdr = csv::Reader::from_reader(data.as_bytes());
        let rows: Vec<Transaction> = rdr
            .deserialize()
            .collect::<Result<_, _>>()
            .expect("rows still load");

        assert_eq!(rows[0].amount, None);
        assert_eq!(rows[0].paid, None);
        let fields: Vec<&str> = rows[0].rejected.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["amount", "paid"]);
        assert_eq!(rows[0].rejected[0].value, "$3,000");

        assert_eq!(rows[1].amount, Some(3000.5));
        assert_eq!(rows[1].paid, Some(false));
        assert!(rows[1].rejected.is_empty());
    }

    #[test]
    fn test_json_round_trip_keeps_types() {
        let tx = Transaction::new("A", "B", "B001")
            .with_amount(1200.0)
            .with_payment_status("2024-07-03", true);

        let json = serde_json::to_string(&tx).expect("serialize");
        assert!(!json.contains("rejected"), "empty reject list is omitted");
        let back: Transaction = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, tx);
    }
}
