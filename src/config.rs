//! Environment-based configuration. Credentials and paths come from the
//! process environment, with `.env` support so users can keep them next to
//! the binary.

use std::path::PathBuf;

/// Seconds to wait before the first status poll (extraction is slow to start).
pub const INITIAL_WAIT_SECS: u64 = 60;
/// Seconds between status polls.
pub const POLL_INTERVAL_SECS: u64 = 5;
/// Give up polling after this many minutes.
pub const MAX_WAIT_MINUTES: u64 = 10;

pub fn load_env() {
    let _ = dotenvy::dotenv();
}

/// Extraction API credentials and job parameters.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: String,
    pub customer_id: String,
    pub asset_id: String,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, String> {
        load_env();
        let base_url = std::env::var("EXTRACTION_API_BASE")
            .map_err(|_| "EXTRACTION_API_BASE not set in .env".to_string())?;
        let token = std::env::var("EXTRACTION_API_TOKEN")
            .map_err(|_| "EXTRACTION_API_TOKEN not set in .env".to_string())?;
        let asset_id = std::env::var("EXTRACTION_ASSET_ID")
            .map_err(|_| "EXTRACTION_ASSET_ID not set in .env".to_string())?;
        let customer_id =
            std::env::var("EXTRACTION_CUSTOMER_ID").unwrap_or_else(|_| "001".to_string());
        Ok(ApiConfig {
            base_url,
            token,
            customer_id,
            asset_id,
        })
    }
}

/// Directory where raw JSON extraction results are saved. Created on demand.
pub fn json_results_dir() -> Result<PathBuf, String> {
    load_env();
    let dir = match std::env::var("JSON_RESULTS_DIR") {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p.trim()),
        _ => std::env::current_dir()
            .map_err(|e| format!("Could not resolve working directory: {}", e))?
            .join("jsonresults"),
    };
    std::fs::create_dir_all(&dir)
        .map_err(|e| format!("Could not create results directory: {}", e))?;
    Ok(dir)
}

/// Directory where report workbooks are written. `OUTPUT_DIR` overrides;
/// the default is an `invoice-reports` folder under Downloads (or Desktop).
pub fn output_dir() -> Result<PathBuf, String> {
    load_env();
    let dir = match std::env::var("OUTPUT_DIR") {
        Ok(p) if !p.trim().is_empty() => PathBuf::from(p.trim()),
        _ => dirs::download_dir()
            .or_else(dirs::desktop_dir)
            .ok_or("Could not find Downloads or Desktop folder.")?
            .join("invoice-reports"),
    };
    std::fs::create_dir_all(&dir)
        .map_err(|e| format!("Could not create output directory: {}", e))?;
    Ok(dir)
}

/// Path of the reference location workbook. Only the location summary report
/// needs it, so it is resolved lazily and missing configuration is reported
/// at that boundary.
pub fn reference_xlsx_path() -> Result<PathBuf, String> {
    load_env();
    std::env::var("REFERENCE_XLSX")
        .map(PathBuf::from)
        .map_err(|_| {
            "REFERENCE_XLSX not set in .env (required for the location summary report)".to_string()
        })
}
