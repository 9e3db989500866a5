use calamine::{open_workbook_auto, DataType, Reader};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet, XlsxError};
use std::collections::HashMap;
use std::path::Path;

use crate::types::{Cell, Row};

/// Rectangular report grid: header + data rows + optional trailer rows.
/// Engines assemble one of these; writing it to disk is a separate concern.
#[derive(Debug, Clone)]
pub struct Grid {
    pub sheet_name: String,
    /// Merged title row above the header, if any.
    pub title: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Rows appended verbatim after the data (separator, grand total).
    pub trailer: Vec<Row>,
    /// Column names rendered with the two-decimal number format. The cell
    /// values themselves stay full-precision floats.
    pub amount_columns: Vec<String>,
    /// Freeze panes below the header row.
    pub freeze_header: bool,
}

impl Grid {
    /// Header from the column order, one data row per engine row, trailer
    /// rows verbatim.
    pub fn assemble(sheet_name: &str, columns: &[&str], rows: Vec<Row>, trailer: Vec<Row>) -> Grid {
        Grid {
            sheet_name: sheet_name.to_string(),
            title: None,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
            trailer,
            amount_columns: Vec::new(),
            freeze_header: false,
        }
    }
}

/// Remove control characters that would corrupt the sheet XML. Tab, newline
/// and CR are kept for multi-line descriptions.
fn sanitize_cell(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            let u = c as u32;
            c == '\t' || c == '\n' || c == '\r' || (u >= 0x20 && u != 0x7F && u != 0xFFFE && u != 0xFFFF)
        })
        .collect()
}

/// Estimate column width from text length (char count x 1.2, clamped 10-50).
fn estimate_text_width(text: &str) -> f64 {
    let w = text.chars().count() as f64 * 1.2;
    w.clamp(10.0, 50.0)
}

/// Per-column widths: max of header width and cell widths; amount columns
/// fixed at 14.
fn column_widths(grid: &Grid) -> Vec<f64> {
    const AMOUNT_WIDTH: f64 = 14.0;
    let mut widths: Vec<f64> = grid
        .columns
        .iter()
        .map(|h| estimate_text_width(h))
        .collect();
    for row in grid.rows.iter().chain(grid.trailer.iter()) {
        for (idx, cell) in row.iter().enumerate() {
            if idx >= widths.len() {
                break;
            }
            let w = estimate_text_width(&cell.display_text());
            if w > widths[idx] {
                widths[idx] = w;
            }
        }
    }
    for (idx, column) in grid.columns.iter().enumerate() {
        if grid.amount_columns.iter().any(|c| c == column) {
            widths[idx] = AMOUNT_WIDTH;
        }
    }
    widths
}

/// Write one cell. Text in an amount column is parsed as a number when
/// possible so extracted string amounts still get the numeric format.
fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    is_amount: bool,
    amount_format: &Format,
    text_format: &Format,
) -> Result<(), XlsxError> {
    match cell {
        Cell::Empty => Ok(()),
        Cell::Int(n) => {
            let format = if is_amount { amount_format } else { text_format };
            worksheet
                .write_number_with_format(row, col, *n as f64, format)
                .map(|_| ())
        }
        Cell::Number(x) => {
            let format = if is_amount { amount_format } else { text_format };
            worksheet
                .write_number_with_format(row, col, *x, format)
                .map(|_| ())
        }
        Cell::Text(s) => {
            if is_amount {
                let cleaned = s.replace(',', "").trim().to_string();
                if let Ok(num) = cleaned.parse::<f64>() {
                    return worksheet
                        .write_number_with_format(row, col, num, amount_format)
                        .map(|_| ());
                }
            }
            worksheet
                .write_string_with_format(row, col, sanitize_cell(s), text_format)
                .map(|_| ())
        }
    }
}

/// Write the grid to an xlsx file at `path`.
pub fn write_grid(grid: &Grid, path: &Path) -> Result<(), String> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(&grid.sheet_name)
        .map_err(|e: XlsxError| e.to_string())?;

    let title_format = Format::new()
        .set_bold()
        .set_font_size(14)
        .set_align(FormatAlign::Center)
        .set_background_color(Color::RGB(0xD3D3D3));
    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xE8E8E8))
        .set_text_wrap();
    let text_format = Format::new().set_text_wrap();
    let amount_format = Format::new()
        .set_num_format("#,##0.00")
        .set_align(FormatAlign::Right);

    for (col, &w) in column_widths(grid).iter().enumerate() {
        worksheet
            .set_column_width(col as u16, w)
            .map_err(|e: XlsxError| e.to_string())?;
    }

    let mut next_row = 0u32;
    if let Some(title) = &grid.title {
        if grid.columns.len() > 1 {
            worksheet
                .merge_range(
                    0,
                    0,
                    0,
                    (grid.columns.len() - 1) as u16,
                    title,
                    &title_format,
                )
                .map_err(|e: XlsxError| e.to_string())?;
        } else {
            worksheet
                .write_string_with_format(0, 0, title.as_str(), &title_format)
                .map_err(|e: XlsxError| e.to_string())?;
        }
        next_row = 1;
    }

    for (col, header) in grid.columns.iter().enumerate() {
        worksheet
            .write_string_with_format(next_row, col as u16, sanitize_cell(header), &header_format)
            .map_err(|e: XlsxError| e.to_string())?;
    }
    let header_row = next_row;
    next_row += 1;

    let is_amount: Vec<bool> = grid
        .columns
        .iter()
        .map(|c| grid.amount_columns.iter().any(|a| a == c))
        .collect();

    for row in grid.rows.iter().chain(grid.trailer.iter()) {
        for (col, cell) in row.iter().enumerate() {
            write_cell(
                worksheet,
                next_row,
                col as u16,
                cell,
                is_amount.get(col).copied().unwrap_or(false),
                &amount_format,
                &text_format,
            )
            .map_err(|e: XlsxError| e.to_string())?;
        }
        next_row += 1;
    }

    if grid.freeze_header {
        let _ = worksheet.set_freeze_panes(header_row + 1, 0);
    }

    workbook.save(path).map_err(|e: XlsxError| {
        let msg = e.to_string();
        if msg.contains("Permission denied") || msg.contains("being used") {
            "Please close the file in Excel first.".to_string()
        } else {
            format!("Cannot write to file: {}", msg)
        }
    })?;
    Ok(())
}

/// One row of the reference location workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct RefLocation {
    pub location_identifier: String,
    pub address: String,
    pub postal_code: String,
}

/// Postal-code-indexed lookup table loaded once per run.
pub type ReferenceDirectory = HashMap<String, RefLocation>;

fn header_index(headers: &[String], name: &str) -> Result<usize, String> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| format!("Reference workbook is missing the '{}' column.", name))
}

/// Load the reference directory from the first sheet of an xlsx file.
/// Row 1 names the columns; rows with a blank postal code are skipped.
pub fn load_reference_directory(path: &Path) -> Result<ReferenceDirectory, String> {
    if !path.exists() {
        return Err(format!("Reference Excel not found: {}", path.display()));
    }
    let mut workbook =
        open_workbook_auto(path).map_err(|e| format!("Could not open Excel file: {}", e))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or("Reference workbook has no sheets.")?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Sheet not found: {}", e))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|row| {
            row.iter()
                .map(|c| c.as_string().unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();
    let idx_identifier = header_index(&headers, "Location Identifier")?;
    let idx_address = header_index(&headers, "Address")?;
    let idx_postal = header_index(&headers, "Postal Code")?;

    let cell_text = |row: &[calamine::Data], idx: usize| -> String {
        row.get(idx)
            .and_then(|c| c.as_string())
            .unwrap_or_default()
    };

    let mut directory = ReferenceDirectory::new();
    for row in rows {
        let postal_code = cell_text(row, idx_postal).trim().to_string();
        if postal_code.is_empty() {
            continue;
        }
        directory.insert(
            postal_code.clone(),
            RefLocation {
                location_identifier: cell_text(row, idx_identifier),
                address: cell_text(row, idx_address),
                postal_code,
            },
        );
    }
    Ok(directory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_xlsx(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "invoice_reports_{}_{}.xlsx",
            tag,
            std::process::id()
        ))
    }

    #[test]
    fn assemble_preserves_shape() {
        let rows = vec![vec![Cell::text("a"), Cell::Int(1)]];
        let trailer = vec![vec![Cell::text("TOTAL"), Cell::Number(1.5)]];
        let grid = Grid::assemble("Sheet", &["Name", "Amount"], rows, trailer);
        assert_eq!(grid.columns, vec!["Name", "Amount"]);
        assert_eq!(grid.rows.len(), 1);
        assert_eq!(grid.trailer.len(), 1);
    }

    #[test]
    fn amount_columns_widen_to_fixed_width() {
        let mut grid = Grid::assemble(
            "Sheet",
            &["Long Description Column", "Amount"],
            vec![vec![Cell::text("x".repeat(80)), Cell::Number(1.0)]],
            vec![],
        );
        grid.amount_columns = vec!["Amount".to_string()];
        let widths = column_widths(&grid);
        assert_eq!(widths[1], 14.0);
        assert_eq!(widths[0], 50.0); // clamped
    }

    #[test]
    fn sanitize_strips_control_chars() {
        assert_eq!(sanitize_cell("a\u{0007}b\nc"), "ab\nc");
    }

    #[test]
    fn reference_directory_round_trip() {
        let path = temp_xlsx("refdir");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let headers = ["Location Identifier", "Address", "Postal Code"];
        for (col, h) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *h).unwrap();
        }
        sheet.write_string(1, 0, "LOC-001").unwrap();
        sheet.write_string(1, 1, "1 Station Rd").unwrap();
        sheet.write_string(1, 2, "560001").unwrap();
        // Blank postal code row is excluded from the directory.
        sheet.write_string(2, 0, "LOC-002").unwrap();
        sheet.write_string(2, 1, "2 High St").unwrap();
        workbook.save(&path).unwrap();

        let directory = load_reference_directory(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(directory.len(), 1);
        let entry = directory.get("560001").unwrap();
        assert_eq!(entry.location_identifier, "LOC-001");
        assert_eq!(entry.address, "1 Station Rd");
    }

    #[test]
    fn missing_reference_column_is_an_error() {
        let path = temp_xlsx("refbad");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Location Identifier").unwrap();
        sheet.write_string(0, 1, "Address").unwrap();
        workbook.save(&path).unwrap();

        let err = load_reference_directory(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.contains("Postal Code"));
    }
}
