//! Loads raw address strings from an uploaded list.
//!
//! Accepts plain text (one address per line) or CSV. When the first row names an
//! `email` column that column is used; otherwise the first column is. Order and
//! duplicates are preserved, blank rows are dropped.

use mailprobe_core::Result;
use std::io::Read;
use std::path::Path;

const HEADER_NAMES: &[&str] = &["email", "e-mail", "email_address", "address", "mail"];

pub fn load_addresses(path: &Path) -> Result<Vec<String>> {
    let file = std::fs::File::open(path)?;
    let addresses = read_addresses(file)?;
    tracing::info!("Loaded {} addresses from {}", addresses.len(), path.display());
    Ok(addresses)
}

pub fn read_addresses<R: Read>(source: R) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut column = 0usize;
    let mut addresses = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if row == 0 {
            let header = record.iter().position(|field| {
                HEADER_NAMES.contains(&field.to_lowercase().as_str())
            });
            if let Some(index) = header {
                column = index;
                continue;
            }
        }
        match record.get(column) {
            Some(value) if !value.is_empty() => addresses.push(value.to_string()),
            _ => {}
        }
    }
    Ok(addresses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_plain_lists() {
        let input = "a@x.io\n\n b@y.io \nbad@@domain\n";
        let addresses = read_addresses(input.as_bytes()).expect("parse");
        assert_eq!(addresses, vec!["a@x.io", "b@y.io", "bad@@domain"]);
    }

    #[test]
    fn picks_the_email_column() {
        let input = "name,Email,company\nAda,ada@x.io,X\nBob,,Y\nCy,cy@z.io,Z\n";
        let addresses = read_addresses(input.as_bytes()).expect("parse");
        assert_eq!(addresses, vec!["ada@x.io", "cy@z.io"]);
    }
}
