// Dataset - the three record sets loaded together

use crate::loader::{
    detect_kind, load_batches, load_embedded_logistics, load_logistics, load_transactions,
};
use crate::records::{Batch, LogisticsMove, RecordKind, Transaction};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub transactions: Vec<Transaction>,
    pub batches: Vec<Batch>,
    pub logistics: Vec<LogisticsMove>,
}

impl Dataset {
    pub fn new(
        transactions: Vec<Transaction>,
        batches: Vec<Batch>,
        logistics: Vec<LogisticsMove>,
    ) -> Self {
        Dataset {
            transactions,
            batches,
            logistics,
        }
    }

    /// Built-in demo data
    pub fn demo() -> Self {
        crate::demo::demo_dataset()
    }

    /// Load `transactions.csv`, `batches.csv` and `logistics.csv` from a directory
    ///
    /// Transactions are mandatory. A missing batches file leaves that set
    /// empty; a missing logistics file falls back to legs carried in the
    /// transactions file itself (combined exports), else empty.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let tx_path = dir.join(RecordKind::Transactions.default_file_name());
        let transactions = load_transactions(&tx_path)
            .with_context(|| format!("Failed to load transactions from {}", dir.display()))?;

        let batches = load_optional(dir, RecordKind::Batches, load_batches)?;
        let mut logistics = load_optional(dir, RecordKind::Logistics, load_logistics)?;
        if logistics.is_empty() {
            logistics = load_embedded_logistics(&tx_path)?;
        }

        let dataset = Dataset::new(transactions, batches, logistics);
        tracing::info!(dir = %dir.display(), "{}", dataset.summary());
        Ok(dataset)
    }

    /// Load explicitly named files, detecting each file's record kind
    ///
    /// Several files of the same kind are concatenated in the given order.
    /// A transactions file with leg dates also contributes logistics moves.
    pub fn from_files(paths: &[PathBuf]) -> Result<Self> {
        let mut dataset = Dataset::default();

        for path in paths {
            match detect_kind(path)? {
                RecordKind::Transactions => {
                    dataset.transactions.extend(load_transactions(path)?);
                    dataset.logistics.extend(load_embedded_logistics(path)?);
                }
                RecordKind::Batches => dataset.batches.extend(load_batches(path)?),
                RecordKind::Logistics => dataset.logistics.extend(load_logistics(path)?),
            }
        }

        tracing::info!(files = paths.len(), "{}", dataset.summary());
        Ok(dataset)
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.batches.is_empty() && self.logistics.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} transactions, {} batches, {} logistics moves",
            self.transactions.len(),
            self.batches.len(),
            self.logistics.len()
        )
    }
}

fn load_optional<T>(
    dir: &Path,
    kind: RecordKind,
    load: fn(&Path) -> Result<Vec<T>>,
) -> Result<Vec<T>> {
    let path = dir.join(kind.default_file_name());
    if !path.exists() {
        tracing::warn!(file = %path.display(), "No {} file, continuing without it", kind);
        return Ok(Vec::new());
    }
    load(&path)
}
