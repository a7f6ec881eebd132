use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Local;
use std::sync::Arc;

use crate::error::ScrapeError;
use crate::scrape::{Scraper, generate_csv, generate_json};

use super::models::{
    DownloadRequest, ErrorResponse, HealthResponse, SearchRequest, SearchResponse,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: error.into() }))
}

pub async fn health_handler(State(_scraper): State<Arc<Scraper>>) -> Json<HealthResponse> {
    // Construction fails without a key, so reaching here implies both.
    Json(HealthResponse {
        status: "healthy",
        timestamp: Local::now().to_rfc3339(),
        scraper_ready: true,
        api_key_configured: true,
    })
}

pub async fn search_handler(
    State(scraper): State<Arc<Scraper>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    run_search(scraper, request).await
}

/// GET variant of the search endpoint, for testing from a browser.
pub async fn search_get_handler(
    State(scraper): State<Arc<Scraper>>,
    Query(request): Query<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    run_search(scraper, request).await
}

async fn run_search(
    scraper: Arc<Scraper>,
    request: SearchRequest,
) -> Result<Json<SearchResponse>, ApiError> {
    let product_name = request.product_name.trim().to_string();
    if product_name.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Product name is required"));
    }

    log::info!("searching for product: {product_name}");

    match scraper
        .scrape(&product_name, request.max_results, request.include_detailed_info)
        .await
    {
        Ok(report) => {
            log::info!(
                "search completed for '{product_name}': {} results",
                report.total_results
            );
            Ok(Json(SearchResponse {
                report,
                api_version: "1.0",
                request_id: Local::now().format("%Y%m%d_%H%M%S").to_string(),
            }))
        }
        Err(e @ ScrapeError::NoProductPages(_)) => {
            Err(api_error(StatusCode::NOT_FOUND, e.to_string()))
        }
        Err(e) => Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

pub async fn download_handler(
    State(_scraper): State<Arc<Scraper>>,
    Json(request): Json<DownloadRequest>,
) -> Result<Response, ApiError> {
    if request.results.products.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No results to download"));
    }

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let product_name = request.results.product_name.clone();

    match request.format.as_str() {
        "csv" => {
            let data = generate_csv(&request.results).ok_or_else(|| {
                api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate CSV data")
            })?;
            let filename = format!("tradeindia_{product_name}_{timestamp}.csv");
            Ok(attachment("text/csv", &filename, data))
        }
        "json" => {
            let data = generate_json(&request.results).ok_or_else(|| {
                api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate JSON data")
            })?;
            let filename = format!("tradeindia_{product_name}_{timestamp}.json");
            Ok(attachment("application/json", &filename, data.into_bytes()))
        }
        _ => Err(api_error(
            StatusCode::BAD_REQUEST,
            "Invalid format. Use 'csv' or 'json'",
        )),
    }
}

fn attachment(content_type: &str, filename: &str, data: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        data,
    )
        .into_response()
}
