// CSV Loader - reads the three record sets from disk
//
// One generic loader drives every record kind: the kind decides which
// identity columns must be present, serde decides the rest.

use crate::error::EngineError;
use crate::records::{Batch, LogisticsMove, RecordKind, Transaction};
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::Read;
use std::path::Path;

// ============================================================================
// CORE TRAIT
// ============================================================================

/// CsvRecord - a row type that can be loaded from a CSV file
///
/// Adding a record set = new struct + impl of this trait. The loader,
/// column check and error reporting come for free.
pub trait CsvRecord: DeserializeOwned {
    const KIND: RecordKind;
}

impl CsvRecord for Transaction {
    const KIND: RecordKind = RecordKind::Transactions;
}

impl CsvRecord for Batch {
    const KIND: RecordKind = RecordKind::Batches;
}

impl CsvRecord for LogisticsMove {
    const KIND: RecordKind = RecordKind::Logistics;
}

// ============================================================================
// LOADING
// ============================================================================

/// Load every row of a CSV file
///
/// # Errors
/// * `EngineError::MissingColumns` if an identity column is absent
/// * I/O or CSV errors with file name and line number
pub fn load_records<T: CsvRecord>(file_path: &Path) -> Result<Vec<T>> {
    let file = File::open(file_path)
        .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

    let filename = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.csv");

    let records = load_records_from_reader(file, filename)?;
    tracing::debug!(
        file = %file_path.display(),
        kind = %T::KIND,
        rows = records.len(),
        "Loaded CSV file"
    );
    Ok(records)
}

/// Load rows from any reader (uploads, in-memory buffers, tests)
pub fn load_records_from_reader<T: CsvRecord, R: Read>(reader: R, source_name: &str) -> Result<Vec<T>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row in {}", source_name))?
        .clone();
    check_required_columns(&headers, T::KIND, source_name)?;

    let mut records = Vec::new();
    for (line_num, result) in reader.deserialize::<T>().enumerate() {
        let record = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line_num + 2, source_name)
        })?;
        records.push(record);
    }

    Ok(records)
}

fn check_required_columns(headers: &StringRecord, kind: RecordKind, source_name: &str) -> Result<()> {
    let missing: Vec<String> = kind
        .required_columns()
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(EngineError::MissingColumns {
            file: source_name.to_string(),
            columns: missing,
        }
        .into())
    }
}

// ============================================================================
// COMBINED EXPORTS
// ============================================================================

/// Columns that mark a transactions file as also carrying transport legs
const LEG_COLUMNS: [&str; 3] = ["start_date", "move_date", "end_date"];

/// Logistics legs carried inside a combined order export
///
/// Dashboard exports put order, payment and shipment columns in one file.
/// When such a file has leg dates, every row is also read as a move. The
/// trading parties stand in for locations when the file has no
/// `from_location` / `to_location` columns.
///
/// Returns an empty list for plain transaction files.
pub fn load_embedded_logistics(file_path: &Path) -> Result<Vec<LogisticsMove>> {
    let file = File::open(file_path)
        .with_context(|| format!("Failed to open file: {}", file_path.display()))?;

    let filename = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown.csv");

    load_embedded_logistics_from_reader(file, filename)
}

pub fn load_embedded_logistics_from_reader<R: Read>(reader: R, source_name: &str) -> Result<Vec<LogisticsMove>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row in {}", source_name))?
        .clone();
    let has = |name: &str| headers.iter().any(|h| h == name);

    if !LEG_COLUMNS.iter().any(|col| has(col)) {
        return Ok(Vec::new());
    }

    let has_endpoints = (has("from_location") || has("from_entity"))
        && (has("to_location") || has("to_entity"));
    if !has("batch_id") || !has_endpoints {
        tracing::warn!(
            file = source_name,
            "Leg dates found but no batch_id or endpoint columns, skipping embedded logistics"
        );
        return Ok(Vec::new());
    }

    if !has("from_location") || !has("to_location") {
        tracing::info!(
            file = source_name,
            "No location columns, using from_entity/to_entity as leg endpoints"
        );
    }

    let mut moves = Vec::new();
    for (line_num, result) in reader.deserialize::<LogisticsMove>().enumerate() {
        let mv = result.with_context(|| {
            format!("Failed to parse CSV line {} in {}", line_num + 2, source_name)
        })?;
        moves.push(mv);
    }

    tracing::debug!(file = source_name, rows = moves.len(), "Read embedded logistics legs");
    Ok(moves)
}

pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    load_records(path)
}

pub fn load_batches(path: &Path) -> Result<Vec<Batch>> {
    load_records(path)
}

pub fn load_logistics(path: &Path) -> Result<Vec<LogisticsMove>> {
    load_records(path)
}

// ============================================================================
// KIND DETECTION
// ============================================================================

/// Detect which record set a file holds
///
/// # Strategy:
/// 1. Check filename patterns (e.g., "q3_transactions.csv" → Transactions)
/// 2. If ambiguous, peek at the header row
/// 3. Return error if still undetermined
pub fn detect_kind(file_path: &Path) -> Result<RecordKind> {
    let filename = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if let Some(kind) = kind_from_filename(filename) {
        return Ok(kind);
    }

    let file = File::open(file_path)
        .with_context(|| format!("Failed to open file: {}", file_path.display()))?;
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(file);
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row in {}", filename))?;

    kind_from_headers(headers).ok_or_else(|| EngineError::UnknownRecordKind(filename.to_string()).into())
}

fn kind_from_filename(filename: &str) -> Option<RecordKind> {
    let filename_lower = filename.to_lowercase();
    let stem = filename_lower.trim_end_matches(".csv");
    let has_word = |word: &str| {
        stem.split(|c: char| !c.is_ascii_alphanumeric())
            .any(|token| token == word)
    };

    // Most specific first: "batch_shipments.csv" holds legs, not batches
    if filename_lower.contains("logistic")
        || filename_lower.contains("shipment")
        || has_word("moves")
        || has_word("move")
    {
        return Some(RecordKind::Logistics);
    }

    if filename_lower.contains("transaction") {
        return Some(RecordKind::Transactions);
    }

    if filename_lower.contains("batch") {
        return Some(RecordKind::Batches);
    }

    None
}

fn kind_from_headers(headers: &StringRecord) -> Option<RecordKind> {
    let has = |name: &str| headers.iter().any(|h| h == name);

    // Most specific first: every kind carries batch_id
    if has("from_entity") && has("to_entity") {
        return Some(RecordKind::Transactions);
    }

    if has("from_location") && has("to_location") {
        return Some(RecordKind::Logistics);
    }

    if has("batch_id") && (has("origin") || has("production_date")) {
        return Some(RecordKind::Batches);
    }

    None
}
