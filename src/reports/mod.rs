//! Supplier report strategies. Each mode turns one extraction result
//! document into a report grid; writing the workbook is shared.

pub mod invoice_lines;
pub mod lease;
pub mod location_summary;

use crate::{config, document, excel};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Transformation strategy, selected per invoice source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    InvoiceLines,
    LocationSummary,
    Lease,
}

pub const ALL_KINDS: &[ReportKind] = &[
    ReportKind::InvoiceLines,
    ReportKind::LocationSummary,
    ReportKind::Lease,
];

impl ReportKind {
    pub fn from_arg(arg: &str) -> Result<ReportKind, String> {
        match arg {
            "invoice-lines" | "lines" => Ok(ReportKind::InvoiceLines),
            "location-summary" | "locations" => Ok(ReportKind::LocationSummary),
            "lease" => Ok(ReportKind::Lease),
            other => Err(format!(
                "Unknown report '{}'. Expected invoice-lines, location-summary, lease or all.",
                other
            )),
        }
    }

    /// Tag used in the output filename.
    pub fn file_tag(self) -> &'static str {
        match self {
            ReportKind::InvoiceLines => "invoice_lines",
            ReportKind::LocationSummary => "location_summary",
            ReportKind::Lease => "lease",
        }
    }
}

/// Run one report over a saved extraction result and write the workbook.
/// Returns the path of the written file.
pub fn run_report(kind: ReportKind, document: &Value, json_path: &Path) -> Result<PathBuf, String> {
    let grid = match kind {
        ReportKind::InvoiceLines => invoice_lines::run(document)?,
        ReportKind::LocationSummary => {
            let reference_path = config::reference_xlsx_path()?;
            let directory = excel::load_reference_directory(&reference_path)?;
            location_summary::run(document, &directory)?
        }
        ReportKind::Lease => lease::run(document)?,
    };

    let stem = document::source_stem(document, json_path);
    let out_path = config::output_dir()?.join(format!("{}_{}_report.xlsx", stem, kind.file_tag()));
    excel::write_grid(&grid, &out_path)?;
    Ok(out_path)
}
