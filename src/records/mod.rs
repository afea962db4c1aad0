// Record Models - the three tabular inputs of the supply chain
//
// Each record keeps its fields as read from the source file. Dates are raw
// strings, parsed on demand, so the quality engine can still report what the
// file actually said.

pub mod batch;
pub mod logistics;
pub mod transaction;

pub use batch::Batch;
pub use logistics::LogisticsMove;
pub use transaction::Transaction;

use serde::{Deserialize, Serialize};

/// RecordKind - which record set a file or row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    Transactions,
    Batches,
    Logistics,
}

impl RecordKind {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            RecordKind::Transactions => "transactions",
            RecordKind::Batches => "batches",
            RecordKind::Logistics => "logistics",
        }
    }

    /// File name looked up inside a data directory
    pub fn default_file_name(&self) -> &'static str {
        match self {
            RecordKind::Transactions => "transactions.csv",
            RecordKind::Batches => "batches.csv",
            RecordKind::Logistics => "logistics.csv",
        }
    }

    /// Identity columns a file must carry before any row is parsed
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            RecordKind::Transactions => &["from_entity", "to_entity", "batch_id"],
            RecordKind::Batches => &["batch_id"],
            RecordKind::Logistics => &["batch_id", "from_location", "to_location"],
        }
    }

    pub fn all() -> [RecordKind; 3] {
        [
            RecordKind::Transactions,
            RecordKind::Batches,
            RecordKind::Logistics,
        ]
    }
}

/// A cell that could not be read as its column's type
///
/// The row is kept with that field unset; the quality engine reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedCell {
    pub field: String,
    pub value: String,
}

/// Parse an optional raw cell, recording it when it does not parse
pub(crate) fn typed_cell<T>(
    field: &str,
    raw: Option<String>,
    parse: fn(&str) -> Option<T>,
    rejected: &mut Vec<RejectedCell>,
) -> Option<T> {
    let raw = raw?;
    let value = parse(&raw);
    if value.is_none() {
        rejected.push(RejectedCell {
            field: field.to_string(),
            value: raw,
        });
    }
    value
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
