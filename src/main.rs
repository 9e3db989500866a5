use invoice_reports::api;
use invoice_reports::reports::{self, ReportKind, ALL_KINDS};
use serde_json::Value;
use std::path::PathBuf;
use std::process;

fn usage() -> String {
    [
        "Usage: invoice-reports <invoice.pdf | result.json> [--report <name>]",
        "",
        "Reports: invoice-lines (default), location-summary, lease, all",
        "A .json argument skips extraction and reuses a saved result.",
    ]
    .join("\n")
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<(PathBuf, Option<ReportKind>), String> {
    let mut input: Option<PathBuf> = None;
    // None = all reports.
    let mut kind: Option<Option<ReportKind>> = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--report" => {
                let name = iter
                    .next()
                    .ok_or_else(|| format!("--report needs a value.\n{}", usage()))?;
                kind = Some(if name == "all" {
                    None
                } else {
                    Some(ReportKind::from_arg(name)?)
                });
            }
            "--help" | "-h" => return Err(usage()),
            other if input.is_none() => input = Some(PathBuf::from(other)),
            other => return Err(format!("Unexpected argument '{}'.\n{}", other, usage())),
        }
    }

    let input = input.ok_or_else(usage)?;
    Ok((input, kind.unwrap_or(Some(ReportKind::InvoiceLines))))
}

fn run(args: &[String]) -> Result<(), String> {
    let (input, kind) = parse_args(args)?;

    if !input.exists() {
        return Err(format!("File not found: {}", input.display()));
    }

    let is_json = input
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let json_path = if is_json {
        input
    } else {
        if input
            .extension()
            .map(|e| !e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(true)
        {
            eprintln!("Warning: file is not a PDF: {}", input.display());
        }
        api::extract_invoice(&input)?
    };

    let raw = std::fs::read_to_string(&json_path)
        .map_err(|e| format!("Could not read {}: {}", json_path.display(), e))?;
    let document: Value =
        serde_json::from_str(&raw).map_err(|e| format!("Invalid JSON result: {}", e))?;

    match kind {
        Some(kind) => {
            let out = reports::run_report(kind, &document, &json_path)?;
            println!("Report created: {}", out.display());
        }
        None => {
            // Run every report; a mode that finds nothing in this document is
            // a warning, not a failure, as long as one report succeeds.
            let mut created = 0u32;
            for &kind in ALL_KINDS {
                match reports::run_report(kind, &document, &json_path) {
                    Ok(out) => {
                        println!("Report created: {}", out.display());
                        created += 1;
                    }
                    Err(e) => eprintln!("[{}] skipped: {}", kind.file_tag(), e),
                }
            }
            if created == 0 {
                return Err("No report could be generated from this document.".to_string());
            }
        }
    }
    Ok(())
}
