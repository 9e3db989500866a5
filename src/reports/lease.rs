//! Lease report: passthrough filter over extracted line items. No mapping
//! table and no aggregation, just required-field filtering and a fixed
//! projection.

use crate::document;
use crate::excel::Grid;
use crate::types::{Cell, Row};
use serde_json::Value;

pub const COLUMNS: &[&str] = &[
    "id",
    "organization",
    "memo",
    "amount",
    "tax_rate",
    "tax_amount",
    "gross_amount",
];

const AMOUNT_COLUMNS: &[&str] = &["amount", "tax_amount", "gross_amount"];

fn item_cell(item: &Value, key: &str) -> Cell {
    item.get(key).map(Cell::from_value).unwrap_or(Cell::Empty)
}

/// Project the line items that carry both a driver name and a contract
/// number; everything else is dropped silently. The memo column is
/// synthesized from the billing period and the driver name.
pub fn filter_rows(document: &Value) -> Vec<Row> {
    let mut rows = Vec::new();

    for record in document::records(document) {
        for block in document::data_blocks(record) {
            let Some(line_items) = block
                .get("extracted_data")
                .and_then(|e| e.get("line_items"))
                .and_then(Value::as_array)
            else {
                continue;
            };
            for item in line_items {
                if !document::has_field(item, "Lease_driver_name")
                    || !document::has_field(item, "contract_number")
                {
                    continue;
                }
                let memo = format!(
                    "{} - {}",
                    document::field_string(item, "Period"),
                    document::field_string(item, "Lease_driver_name")
                );
                rows.push(vec![
                    Cell::Empty,
                    item_cell(item, "cost_center"),
                    Cell::Text(memo),
                    item_cell(item, "net_amount"),
                    item_cell(item, "tax_rate"),
                    item_cell(item, "tax_amount"),
                    item_cell(item, "gross_amount"),
                ]);
            }
        }
    }
    rows
}

/// Build the lease report grid, or an error when no line item passed the
/// filter.
pub fn run(document: &Value) -> Result<Grid, String> {
    let rows = filter_rows(document);
    if rows.is_empty() {
        return Err("No lease rows matched the required fields.".to_string());
    }
    println!("[reports] Lease: {} rows", rows.len());

    let mut grid = Grid::assemble("Lease_Invoices", COLUMNS, rows, vec![]);
    grid.amount_columns = AMOUNT_COLUMNS.iter().map(|c| c.to_string()).collect();
    Ok(grid)
}
