//! Serialization of a finished batch into `results.json` and `results.csv`.

use crate::core::error::{AppError, Result};
use crate::core::models::ValidationResult;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const RECORDS_FILE: &str = "results.json";
pub const TABLE_FILE: &str = "results.csv";

/// Locations of the two artifacts written by [`write_results`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportPaths {
    pub records: PathBuf,
    pub table: PathBuf,
}

/// Writes the structured record list and the tabular file into `dest_dir`.
///
/// Output depends only on `results`, so identical input yields byte-identical files.
pub fn write_results(results: &[ValidationResult], dest_dir: &Path) -> Result<ExportPaths> {
    fs::create_dir_all(dest_dir).map_err(|source| AppError::WriteFailed {
        path: dest_dir.to_path_buf(),
        source,
    })?;

    let records = dest_dir.join(RECORDS_FILE);
    let table = dest_dir.join(TABLE_FILE);

    let mut json = serde_json::to_vec_pretty(results)?;
    json.push(b'\n');
    write_file(&records, &json)?;
    write_file(&table, &render_table(results)?)?;

    tracing::info!(target: "export", "Wrote {} results to {} and {}",
        results.len(), records.display(), table.display());
    Ok(ExportPaths { records, table })
}

/// Renders the CSV body: header row from the field names, then one row per result.
pub fn render_table(results: &[ValidationResult]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(TABLE_HEADER)?;
    for result in results {
        writer.serialize(result)?;
    }
    writer.into_inner().map_err(|e| AppError::Io(e.into_error()))
}

/// Column order of the tabular export; matches the field order of [`ValidationResult`].
pub const TABLE_HEADER: &[&str] = &[
    "email",
    "syntax_valid",
    "domain_exists",
    "mx_found",
    "smtp_checked",
    "smtp_code",
    "deliverable",
    "reason",
    "duration_ms",
    "domain",
    "mx_host",
    "implicit_mx",
    "is_role",
    "is_free",
    "is_disposable",
    "is_no_reply",
    "accept_all",
    "mailbox_full",
    "smtp_provider",
    "score",
];

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|source| AppError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a table written by [`write_results`] back into results.
pub fn read_table(path: &Path) -> Result<Vec<ValidationResult>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut results = Vec::new();
    for record in reader.deserialize() {
        results.push(record?);
    }
    Ok(results)
}
