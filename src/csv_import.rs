//! CSV parsing and export.
//!
//! Parsing assumes a header row, skips empty and all-blank records, and
//! collects malformed records as warnings instead of failing the import.
//! Files ending in `.gz` are decompressed transparently.

use flate2::read::GzDecoder;
use serde_json::Value;
use std::fs;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::config::INVENTORY_EXPORT_HEADERS;
use crate::error::Result;
use crate::models::{InventoryItem, Order, RawRow};
use crate::normalize::value_to_string;

/// Rows parsed from one CSV document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCsv {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    /// Human-readable notes about records that were skipped or truncated.
    pub warnings: Vec<String>,
}

/// Parse CSV text into open rows keyed by header.
pub fn parse_csv(text: &str) -> ParsedCsv {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut parsed = ParsedCsv::default();
    match reader.headers() {
        Ok(headers) => {
            parsed.headers = headers.iter().map(|h| h.trim().to_string()).collect();
        }
        Err(e) => {
            parsed.warnings.push(format!("unreadable header row: {e}"));
            return parsed;
        }
    }

    for (idx, record) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                parsed.warnings.push(format!("row {line}: {e}"));
                continue;
            }
        };
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if record.len() > parsed.headers.len() {
            parsed.warnings.push(format!(
                "row {line}: {} fields but {} headers; extra fields dropped",
                record.len(),
                parsed.headers.len()
            ));
        }
        let row: RawRow = parsed
            .headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, field)| (header.clone(), Value::String(field.to_string())))
            .collect();
        parsed.rows.push(row);
    }

    if !parsed.warnings.is_empty() {
        tracing::warn!(count = parsed.warnings.len(), "CSV parsed with warnings");
    }
    tracing::debug!(rows = parsed.rows.len(), "parsed CSV");
    parsed
}

/// Read and parse a CSV file (handles `.gz` transparently).
pub fn read_csv_file(path: &Path) -> Result<ParsedCsv> {
    let contents = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        let file = fs::File::open(path)?;
        let decoder = GzDecoder::new(BufReader::new(file));
        let mut buf_reader = BufReader::new(decoder);
        let mut contents = String::new();
        buf_reader.read_to_string(&mut contents)?;
        contents
    } else {
        fs::read_to_string(path)?
    };
    tracing::info!(path = %path.display(), bytes = contents.len(), "loaded CSV file");
    Ok(parse_csv(&contents))
}

/// Render rows as CSV with the given column order. Missing or null cells are
/// empty; cells containing quotes, commas or newlines are quoted.
pub fn to_csv(rows: &[RawRow], headers: &[&str]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(
            headers
                .iter()
                .map(|h| row.get(*h).map(value_to_string).unwrap_or_default()),
        )?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Export inventory with the standard column set.
pub fn export_inventory_csv(items: &[InventoryItem]) -> Result<String> {
    let rows: Vec<RawRow> = items.iter().map(InventoryItem::to_raw).collect();
    to_csv(&rows, INVENTORY_EXPORT_HEADERS)
}

/// Export order history, one row per purchased line.
pub fn export_orders_csv(orders: &[Order]) -> Result<String> {
    let rows: Vec<RawRow> = orders
        .iter()
        .flat_map(|order| {
            order.items.iter().map(move |item| {
                let mut row = RawRow::new();
                row.insert("order_id".into(), Value::from(order.id.clone()));
                row.insert("created_at".into(), Value::from(order.created_at.to_rfc3339()));
                row.insert("user_email".into(), Value::from(order.user_email.clone()));
                row.insert("item_id".into(), Value::from(item.id.clone()));
                row.insert("item_name".into(), Value::from(item.name.clone()));
                row.insert("qty".into(), Value::from(item.qty));
                row.insert("price".into(), Value::from(item.price));
                row.insert("line_total".into(), Value::from(item.line_total()));
                row.insert("order_total".into(), Value::from(order.total));
                row
            })
        })
        .collect();
    to_csv(&rows, crate::config::ORDER_EXPORT_HEADERS)
}
