//! Line-item report: one output row per (invoice line item x serial number),
//! driven by a declarative column mapping table.

use crate::document;
use crate::excel::Grid;
use crate::render::{render_template, resolve_path, week_of};
use crate::types::{Cell, Literal, MappingSpec, Row, Rule};
use serde_json::{json, Value};
use std::collections::HashSet;

/// Output columns for the supplier invoice upload sheet, in emission order.
/// Each column is one rule; the row builder below never special-cases a
/// column name.
pub const COLUMNS: MappingSpec = &[
    ("Invoice Number", Rule::Path("invoice.metadata.invoiceNumber")),
    ("Invoice Line", Rule::Blank),
    ("Company", Rule::Path("customer.name")),
    ("Item", Rule::Blank),
    (
        "Line Item Description",
        Rule::Template("{description}, {serial} WK {week}"),
    ),
    ("Commodity Code", Rule::Blank),
    ("Spend Category", Rule::Blank),
    ("Ship-To Address", Rule::Path("customer.address")),
    ("Ship-To Contact", Rule::Blank),
    ("Tax", Rule::Path("line_item.vatPercentage")),
    ("Tax Recoverability", Rule::Blank),
    ("Tax Option", Rule::Blank),
    ("Quantity", Rule::Default(Literal::Int(1))),
    ("Unit of Measure", Rule::Default(Literal::Str("EA"))),
    ("Unit Cost", Rule::Path("line_item.unitPrice")),
    ("Extended Amount", Rule::Path("line_item.unitPrice")),
    ("Item Identifiers", Rule::Blank),
    ("Memo", Rule::Template("{description}, {serial} WK {week}")),
    ("Cost Center", Rule::Path("line_item.costCenter")),
    ("Location", Rule::Blank),
    ("Intercompany Affiliate", Rule::Blank),
    ("Inbound Streams", Rule::Blank),
    ("Additional Worktags", Rule::Blank),
    ("Worktag Split Template", Rule::Blank),
    ("Split Button Count", Rule::Default(Literal::Int(0))),
    ("Splits", Rule::Default(Literal::Int(0))),
];

/// Columns rendered with the two-decimal number format.
const AMOUNT_COLUMNS: &[&str] = &["Unit Cost", "Extended Amount", "Tax"];

/// Whitespace-delimited serial tokens, empties dropped.
fn split_serial_numbers(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// Evaluate one column rule against the per-row render context.
fn evaluate(rule: &Rule, context: &Value) -> Cell {
    match rule {
        Rule::Blank => Cell::Empty,
        Rule::Default(literal) => literal.to_cell(),
        Rule::Template(template) => Cell::Text(render_template(template, context)),
        Rule::Path(path) => Cell::from_value(&resolve_path(context, path)),
    }
}

/// Walk the document and produce one row per line item and serial number,
/// deduplicated by (invoice number, order line, serial) across the whole
/// document. Source order is preserved minus dropped duplicates.
pub fn parse_rows(document: &Value, spec: MappingSpec) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut seen: HashSet<(String, String, String)> = HashSet::new();

    for record in document::records(document) {
        for block in document::data_blocks(record) {
            let Some(invoice) = document::invoice(block) else {
                continue;
            };
            let metadata = invoice.get("metadata").cloned().unwrap_or_else(|| json!({}));
            let customer = invoice.get("customer").cloned().unwrap_or_else(|| json!({}));
            let invoice_number = document::field_string(&metadata, "invoiceNumber");
            let week = week_of(&document::field_string(&metadata, "invoiceDate"));

            let Some(line_items) = invoice.get("lineItems").and_then(Value::as_array) else {
                continue;
            };
            for line_item in line_items {
                let mut serials =
                    split_serial_numbers(&document::field_string(line_item, "serialNumbers"));
                if serials.is_empty() {
                    // A line item without serials still yields one row.
                    serials.push(String::new());
                }
                let order_line = document::field_string(line_item, "orderLineNumber");

                for serial in serials {
                    let key = (invoice_number.clone(), order_line.clone(), serial.clone());
                    if !seen.insert(key) {
                        continue;
                    }
                    let context = json!({
                        "description": document::field_string(line_item, "description"),
                        "serial": serial,
                        "week": week.map_or_else(|| json!(""), |w| json!(w)),
                        "customer": customer.clone(),
                        "line_item": line_item.clone(),
                        "invoice": { "metadata": metadata.clone() },
                    });
                    rows.push(
                        spec.iter()
                            .map(|(_, rule)| evaluate(rule, &context))
                            .collect(),
                    );
                }
            }
        }
    }
    rows
}

/// Build the line-item report grid, or an error when nothing was extracted.
pub fn run(document: &Value) -> Result<Grid, String> {
    let rows = parse_rows(document, COLUMNS);
    if rows.is_empty() {
        return Err("No invoice rows extracted from the document.".to_string());
    }
    println!("[reports] Invoice lines: {} rows", rows.len());

    let columns: Vec<&str> = COLUMNS.iter().map(|(name, _)| *name).collect();
    let mut grid = Grid::assemble("View Supplier Invoice", &columns, rows, vec![]);
    grid.title = Some("Invoice Lines".to_string());
    grid.amount_columns = AMOUNT_COLUMNS.iter().map(|c| c.to_string()).collect();
    grid.freeze_header = true;
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn column_index(name: &str) -> usize {
        COLUMNS.iter().position(|(col, _)| *col == name).unwrap()
    }

    fn document_with_items(line_items: Value) -> Value {
        json!({
            "result": {
                "data": [{
                    "filename": "invoice.pdf",
                    "extracted_data": {
                        "invoice": {
                            "metadata": {
                                "invoiceNumber": "INV-100",
                                "invoiceDate": "2024-01-04"
                            },
                            "customer": {
                                "name": "Acme GmbH",
                                "address": "1 Acme Way"
                            },
                            "lineItems": line_items
                        }
                    }
                }]
            }
        })
    }

    #[test]
    fn serial_fan_out() {
        let doc = document_with_items(json!([{
            "description": "ThinkPad",
            "serialNumbers": "SN1 SN2",
            "orderLineNumber": "10",
            "unitPrice": 899.5,
            "vatPercentage": 19,
            "costCenter": "CC-7"
        }]));
        let rows = parse_rows(&doc, COLUMNS);
        assert_eq!(rows.len(), 2);
        let memo = column_index("Memo");
        assert_eq!(rows[0][memo], Cell::text("ThinkPad, SN1 WK 1"));
        assert_eq!(rows[1][memo], Cell::text("ThinkPad, SN2 WK 1"));
        // Serial-independent columns match across the fan-out.
        let company = column_index("Company");
        assert_eq!(rows[0][company], rows[1][company]);
    }

    #[test]
    fn empty_serials_yield_one_row() {
        let doc = document_with_items(json!([{
            "description": "Dock",
            "serialNumbers": "",
            "orderLineNumber": "20",
            "unitPrice": 120
        }]));
        let rows = parse_rows(&doc, COLUMNS);
        assert_eq!(rows.len(), 1);
        let memo = column_index("Memo");
        assert_eq!(rows[0][memo], Cell::text("Dock,  WK 1"));
    }

    #[test]
    fn duplicate_key_is_dropped() {
        let item = json!({
            "description": "ThinkPad",
            "serialNumbers": "SN1",
            "orderLineNumber": "10",
            "unitPrice": 899.5
        });
        let doc = document_with_items(json!([item.clone(), item]));
        assert_eq!(parse_rows(&doc, COLUMNS).len(), 1);
    }

    #[test]
    fn constant_and_path_rules() {
        let doc = document_with_items(json!([{
            "description": "Dock",
            "serialNumbers": "SN9",
            "orderLineNumber": "30",
            "unitPrice": 120.25,
            "vatPercentage": 19,
            "costCenter": "CC-7"
        }]));
        let rows = parse_rows(&doc, COLUMNS);
        let row = &rows[0];
        assert_eq!(row[column_index("Invoice Number")], Cell::text("INV-100"));
        assert_eq!(row[column_index("Quantity")], Cell::Int(1));
        assert_eq!(row[column_index("Unit of Measure")], Cell::text("EA"));
        assert_eq!(row[column_index("Unit Cost")], Cell::Number(120.25));
        assert_eq!(row[column_index("Cost Center")], Cell::text("CC-7"));
        assert_eq!(row[column_index("Invoice Line")], Cell::Empty);
    }

    #[test]
    fn block_without_invoice_is_skipped() {
        let doc = json!({
            "result": {
                "data": [{"extracted_data": {"line_items": []}}]
            }
        });
        assert!(parse_rows(&doc, COLUMNS).is_empty());
        assert!(run(&doc).is_err());
    }
}
