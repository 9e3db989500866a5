//! Location summary report: line items grouped by service location label,
//! amounts summed per location and enriched from the postal-code-indexed
//! reference directory.

use crate::document;
use crate::excel::{Grid, ReferenceDirectory};
use crate::types::{Cell, Row};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

pub const COLUMNS: &[&str] = &[
    "Invoice Number",
    "Location Name & Address",
    "Location Identifier",
    "Address",
    "Postal Code",
    "Total Amount",
];

/// One summary row per distinct location label, in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationAggregate {
    pub label: String,
    pub total: f64,
    pub postal_code: String,
    pub location_identifier: String,
    pub address: String,
}

/// First run of 5 or 6 consecutive digits bounded by non-digits (or the
/// string edges). Labels without one yield an empty code, which simply means
/// no directory enrichment.
pub fn extract_postal_code(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let re = Regex::new(r"\b\d{5,6}\b").expect("postal code regex");
    re.find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Amount of one line item. Unparseable or missing amounts contribute zero;
/// the item is otherwise ignored, never an error.
fn line_amount(item: &Value) -> f64 {
    match item.get("total_line_price") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Group service locations by their trimmed label, sum line amounts per label
/// and attach the directory entry matching the extracted postal code. Labels
/// are compared exactly after trimming, so internal differences (case,
/// spacing) keep locations apart.
pub fn aggregate(
    service_locations: &[Value],
    directory: &ReferenceDirectory,
) -> Vec<LocationAggregate> {
    let mut aggregates: Vec<LocationAggregate> = Vec::new();
    let mut index_of: HashMap<String, usize> = HashMap::new();

    for location in service_locations {
        let label = document::field_string(location, "location_name_address")
            .trim()
            .to_string();
        let postal_code = extract_postal_code(&label);

        let idx = match index_of.get(&label) {
            Some(&idx) => idx,
            None => {
                let entry = directory.get(&postal_code);
                aggregates.push(LocationAggregate {
                    label: label.clone(),
                    total: 0.0,
                    postal_code,
                    location_identifier: entry
                        .map(|e| e.location_identifier.clone())
                        .unwrap_or_default(),
                    address: entry.map(|e| e.address.clone()).unwrap_or_default(),
                });
                index_of.insert(label, aggregates.len() - 1);
                aggregates.len() - 1
            }
        };

        if let Some(items) = location.get("line_items").and_then(Value::as_array) {
            for item in items {
                aggregates[idx].total += line_amount(item);
            }
        }
    }
    aggregates
}

/// Declared grand total of the document, if any. Accepts a number or a
/// numeric string.
fn declared_grand_total(root: &Value) -> Option<f64> {
    match root.get("grand_total") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Build the location summary grid. The grand total comes from the document
/// when declared, otherwise it is the unrounded sum of the per-location
/// totals (rounding happens only at display).
pub fn run(document: &Value, directory: &ReferenceDirectory) -> Result<Grid, String> {
    let root = document::records(document)
        .first()
        .copied()
        .and_then(|record| document::data_blocks(record).first())
        .and_then(document::extracted_root)
        .cloned()
        .unwrap_or(Value::Null);

    let service_locations = root
        .get("service_locations")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    if service_locations.is_empty() {
        return Err("No service locations found in the document.".to_string());
    }

    // Same invoice number on every row, taken from the first location.
    let invoice_number = document::field_string(&service_locations[0], "Invoice_number");

    let aggregates = aggregate(&service_locations, directory);
    let grand_total = declared_grand_total(&root)
        .unwrap_or_else(|| aggregates.iter().map(|a| a.total).sum());

    println!(
        "[reports] Location summary: {} locations, grand total {:.2}",
        aggregates.len(),
        grand_total
    );

    let rows: Vec<Row> = aggregates
        .into_iter()
        .map(|a| {
            vec![
                Cell::text(invoice_number.clone()),
                Cell::text(a.label),
                Cell::text(a.location_identifier),
                Cell::text(a.address),
                Cell::text(a.postal_code),
                Cell::Number(a.total),
            ]
        })
        .collect();

    // Blank separator row, then the grand total with only the amount column.
    let trailer = vec![
        vec![Cell::Empty; COLUMNS.len()],
        vec![
            Cell::text("GRAND TOTAL"),
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::Empty,
            Cell::Number(grand_total),
        ],
    ];

    let mut grid = Grid::assemble("Summary", COLUMNS, rows, trailer);
    grid.amount_columns = vec!["Total Amount".to_string()];
    Ok(grid)
}
