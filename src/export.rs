//! Delimited export of business records, and re-import of reviewed files.
//!
//! Every field is quoted with embedded quotes doubled, so the output opens
//! cleanly in spreadsheet tools for manual review.

use std::fs;
use std::io;
use std::path::Path;

use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use tracing::{debug, info};

use crate::models::{BusinessRecord, Category, MIN_NAME_LEN};
use crate::scrapers::category::map_source_label;

/// Export column order.
pub const CSV_HEADER: [&str; 7] = [
    "Name", "Category", "Address", "Phone", "Email", "Website", "Source",
];

/// Source id for imported rows that do not name one.
const IMPORT_SOURCE: &str = "import";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed CSV at line {line}: {message}")]
    Malformed { line: usize, message: String },
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> Self {
        let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
        let message = e.to_string();
        match e.into_kind() {
            csv::ErrorKind::Io(io) => Self::Io(io),
            _ => Self::Malformed { line, message },
        }
    }
}

/// Write the header and one row per record, quoting every field.
fn write_records<W: io::Write>(out: W, records: &[BusinessRecord]) -> Result<W, ExportError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(out);

    writer.write_record(CSV_HEADER)?;
    for record in records {
        writer.write_record([
            record.name.as_str(),
            record.category.as_str(),
            record.address.as_str(),
            record.phone.as_deref().unwrap_or(""),
            record.email.as_deref().unwrap_or(""),
            record.website.as_deref().unwrap_or(""),
            record.source.as_str(),
        ])?;
    }

    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// Render records as CSV text, header included.
pub fn to_csv_string(records: &[BusinessRecord]) -> Result<String, ExportError> {
    let bytes = write_records(Vec::new(), records)?;
    String::from_utf8(bytes).map_err(|e| ExportError::Malformed {
        line: 0,
        message: e.to_string(),
    })
}

/// Write records to `path`, creating parent directories.
pub fn write_csv(path: &Path, records: &[BusinessRecord]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = write_records(fs::File::create(path)?, records)?;
    io::Write::flush(&mut file)?;
    info!("Exported {} record(s) to {}", records.len(), path.display());
    Ok(())
}

fn record_line(row: &StringRecord) -> usize {
    row.position().map(|p| p.line() as usize).unwrap_or(0)
}

/// Parse a reviewed export back into records.
///
/// Columns are located by header name. Quoted fields may hold commas,
/// doubled quotes and line breaks. Rows with a name shorter than three
/// characters are dropped; an empty category or address takes the default.
pub fn records_from_csv(content: &str, default_address: &str) -> Result<Vec<BusinessRecord>, ExportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let header = reader.headers()?.clone();
    if header.is_empty() {
        return Ok(Vec::new());
    }

    let column = |name: &str| {
        header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let name_col = column("Name").ok_or_else(|| ExportError::Malformed {
        line: record_line(&header).max(1),
        message: "missing Name column".to_string(),
    })?;
    let category_col = column("Category");
    let address_col = column("Address");
    let phone_col = column("Phone");
    let email_col = column("Email");
    let website_col = column("Website");
    let source_col = column("Source");

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let get = |col: Option<usize>| {
            col.and_then(|c| row.get(c))
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        let name = get(Some(name_col)).unwrap_or("");
        if name.chars().count() < MIN_NAME_LEN {
            debug!("Line {}: skipping short name '{}'", record_line(&row), name);
            continue;
        }
        let category = get(category_col)
            .and_then(map_source_label)
            .unwrap_or(Category::DEFAULT);
        let source = get(source_col).unwrap_or(IMPORT_SOURCE);

        let Some(record) = BusinessRecord::new(
            name,
            category,
            get(address_col).unwrap_or(""),
            default_address,
            source,
        ) else {
            continue;
        };

        records.push(record.with_contact(
            get(phone_col).map(String::from),
            get(email_col).map(String::from),
            get(website_col).map(String::from),
        ));
    }

    Ok(records)
}

/// Read a reviewed export file.
pub fn read_csv(path: &Path, default_address: &str) -> Result<Vec<BusinessRecord>, ExportError> {
    let content = fs::read_to_string(path)?;
    let records = records_from_csv(&content, default_address)?;
    info!("Read {} record(s) from {}", records.len(), path.display());
    Ok(records)
}
