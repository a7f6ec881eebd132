use serde::{Deserialize, Serialize};

use crate::data_models::ScrapeReport;

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub product_name: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_include_detailed_info")]
    pub include_detailed_info: bool,
}

fn default_max_results() -> usize {
    30
}

fn default_include_detailed_info() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    #[serde(flatten)]
    pub report: ScrapeReport,
    pub api_version: &'static str,
    pub request_id: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    pub results: ScrapeReport,
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "csv".to_string()
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub scraper_ready: bool,
    pub api_key_configured: bool,
}
