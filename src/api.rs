//! Extraction API client: submit a PDF, poll the job until it finishes and
//! save the raw JSON result locally. The report engines never touch the
//! network; they consume the saved document.

use crate::config::{self, ApiConfig};
use reqwest::blocking::{multipart, Client};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Full extraction pipeline for one PDF. Returns the path of the saved JSON
/// result file.
pub fn extract_invoice(pdf_path: &Path) -> Result<PathBuf, String> {
    let cfg = ApiConfig::from_env()?;
    let client = Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(|e| e.to_string())?;

    println!("[api] Submitting {} for extraction...", pdf_path.display());
    let job_id = submit_job(&client, &cfg, pdf_path)?;
    println!("[api] Job {} accepted, waiting for extraction...", job_id);
    let result = poll_job(&client, &cfg, &job_id)?;
    let json_path = save_json_result(&result, pdf_path)?;
    println!("[api] Result saved: {}", json_path.display());
    Ok(json_path)
}

fn network_error(e: reqwest::Error) -> String {
    if e.is_connect() || e.is_timeout() {
        "Check your internet connection and try again."
    } else {
        "Network error."
    }
    .to_string()
}

/// Submit the PDF and return the job id.
fn submit_job(client: &Client, cfg: &ApiConfig, pdf_path: &Path) -> Result<String, String> {
    let url = format!("{}/extract", cfg.base_url.trim_end_matches('/'));
    let form = multipart::Form::new()
        .text("customer_id", cfg.customer_id.clone())
        .text("asset_id", cfg.asset_id.clone())
        .file("files", pdf_path)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                "File not found.".to_string()
            } else {
                format!("Could not read file: {}", e)
            }
        })?;

    let response = client
        .post(&url)
        .bearer_auth(&cfg.token)
        .multipart(form)
        .send()
        .map_err(network_error)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(format!(
            "Submission failed ({}): {}",
            status,
            if body.is_empty() {
                "Invalid token or endpoint?"
            } else {
                body.as_str()
            }
        ));
    }

    let data: SubmitResponse = response
        .json()
        .map_err(|e| format!("Invalid JSON: {}", e))?;
    data.job_id
        .or(data.id)
        .ok_or("Job id missing in submission response".to_string())
}

/// Submission response: some deployments return `job_id`, older ones `id`.
#[derive(Deserialize)]
struct SubmitResponse {
    job_id: Option<String>,
    id: Option<String>,
}

/// Poll job status until SUCCESS, FAILED or timeout.
fn poll_job(client: &Client, cfg: &ApiConfig, job_id: &str) -> Result<Value, String> {
    let url = format!("{}/status/{}", cfg.base_url.trim_end_matches('/'), job_id);

    std::thread::sleep(Duration::from_secs(config::INITIAL_WAIT_SECS));

    let started = Instant::now();
    let max_wait = Duration::from_secs(config::MAX_WAIT_MINUTES * 60);
    let mut poll_count = 0u32;

    loop {
        poll_count += 1;
        let response = client
            .get(&url)
            .bearer_auth(&cfg.token)
            .send()
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(format!("Status check failed ({}): {}", status, body));
        }

        let data: Value = response
            .json()
            .map_err(|e| format!("Invalid JSON: {}", e))?;
        match data.get("status").and_then(Value::as_str).unwrap_or("") {
            "SUCCESS" => {
                println!("[api] Extraction complete after {} polls", poll_count);
                return Ok(data);
            }
            "FAILED" => return Err(format!("Extraction job failed: {}", data)),
            _ => {}
        }

        if started.elapsed() > max_wait {
            return Err(format!(
                "Extraction timed out after {} minutes.",
                config::MAX_WAIT_MINUTES
            ));
        }
        std::thread::sleep(Duration::from_secs(config::POLL_INTERVAL_SECS));
    }
}

/// Save the raw result as `{pdf_stem}_{timestamp}.json` under the results dir.
fn save_json_result(result: &Value, pdf_path: &Path) -> Result<PathBuf, String> {
    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().replace(' ', "_"))
        .unwrap_or_else(|| "result".to_string());
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let json_path = config::json_results_dir()?.join(format!("{}_{}.json", stem, timestamp));

    let pretty =
        serde_json::to_string_pretty(result).map_err(|e| format!("Could not encode JSON: {}", e))?;
    std::fs::write(&json_path, pretty)
        .map_err(|e| format!("Could not write {}: {}", json_path.display(), e))?;
    Ok(json_path)
}
