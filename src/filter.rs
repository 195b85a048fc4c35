//! Eligibility filter over simulated candidate batches.
//!
//! Reads the tabular simulation-results artifact (comma-separated, no
//! assumed header), locates each row's embedded check-report by its
//! `'checks':` marker and keeps the identifiers whose report passes all
//! required gates. Malformed rows are skipped and counted; a missing input
//! artifact aborts the whole step with no output written.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::queue::{PendingQueue, QueueError};
use crate::report::SimReport;

/// Marker identifying the column that carries the serialized check-report.
const REPORT_MARKER: &str = "'checks':";

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("cannot read candidate input {path}: {source}")]
    Input { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Tally of one filtering pass.
#[derive(Debug, Clone)]
pub struct FilterSummary {
    /// Rows seen in the input artifact.
    pub scanned: usize,
    /// Rows skipped as malformed (no identifier, no report column, or an
    /// unparsable report).
    pub skipped: usize,
    /// Eligible identifiers, deduplicated, in encounter order.
    pub eligible: Vec<String>,
}

/// Filter the candidate input and overwrite the pending queue with the
/// surviving identifiers.
pub fn run_filter(input: &Path, queue: &PendingQueue) -> Result<FilterSummary, FilterError> {
    let summary = extract_candidates(input)?;
    queue.write_all(&summary.eligible)?;
    Ok(summary)
}

/// Scan the input artifact and collect identifiers passing every gate.
pub fn extract_candidates(input: &Path) -> Result<FilterSummary, FilterError> {
    let raw = fs::read_to_string(input).map_err(|source| FilterError::Input {
        path: input.to_path_buf(),
        source,
    })?;
    let records = split_records(&raw);

    let mut eligible = Vec::new();
    let mut seen = HashSet::new();
    let mut skipped = 0usize;
    let scanned = records.len();

    for record in &records {
        match classify_record(record) {
            RecordVerdict::Eligible(id) => {
                if seen.insert(id.clone()) {
                    eligible.push(id);
                }
            }
            RecordVerdict::Ineligible => {}
            RecordVerdict::Malformed => skipped += 1,
        }
    }

    Ok(FilterSummary {
        scanned,
        skipped,
        eligible,
    })
}

enum RecordVerdict {
    Eligible(String),
    Ineligible,
    Malformed,
}

fn classify_record(record: &[String]) -> RecordVerdict {
    let id = record.first().map(|field| field.trim()).unwrap_or("");
    if id.is_empty() {
        return RecordVerdict::Malformed;
    }
    let Some(report_field) = record.iter().find(|field| field.contains(REPORT_MARKER)) else {
        return RecordVerdict::Malformed;
    };
    match SimReport::from_literal(report_field.trim()) {
        Ok(report) if report.passes_required_gates() => RecordVerdict::Eligible(id.to_string()),
        Ok(_) => RecordVerdict::Ineligible,
        Err(_) => RecordVerdict::Malformed,
    }
}

/// Split raw comma-separated text into records of fields.
///
/// Quote-aware: commas, newlines and doubled quotes inside a
/// double-quoted field belong to the field. Blank lines are dropped.
fn split_records(input: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }
        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                if record.len() == 1 && record[0].is_empty() {
                    record.clear();
                } else {
                    records.push(std::mem::take(&mut record));
                }
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    records
}
