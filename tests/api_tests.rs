use std::sync::Arc;
use std::time::Duration;

use mockito::Matcher;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use tradescout::api::create_router;
use tradescout::data_models::{ProductRecord, ScrapeReport};
use tradescout::extractor::PageExtractor;
use tradescout::scrape::Scraper;
use tradescout::search::{SearchRunner, SerpApiClient};

fn test_scraper(serp_base: String) -> Scraper {
    let serp = SerpApiClient::new("test-key".to_string()).with_base_url(serp_base);
    let runner = SearchRunner::new(serp).with_query_delay(Duration::ZERO);
    let extractor = PageExtractor::new().unwrap().with_retry_base(Duration::ZERO);
    Scraper::from_parts(runner, extractor, Duration::ZERO)
}

/// Serve the real router on an ephemeral port and return its base URL.
async fn spawn_app(scraper: Scraper) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(Arc::new(scraper));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn sample_report() -> ScrapeReport {
    let mut record = ProductRecord::sentinel("https://www.tradeindia.com/products/x.html".into());
    record.product_name = "Steel Pipe".to_string();
    ScrapeReport::new("steel".into(), vec![record])
}

#[tokio::test]
async fn health_reports_ready() {
    let app = spawn_app(test_scraper("http://127.0.0.1:1".into())).await;

    let response = reqwest::get(format!("{app}/health")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["scraper_ready"], true);
    assert_eq!(body["api_key_configured"], true);
}

#[tokio::test]
async fn blank_product_name_is_rejected() {
    let app = spawn_app(test_scraper("http://127.0.0.1:1".into())).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{app}/api/search"))
        .json(&json!({ "product_name": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Product name is required");

    // Same rule on the GET variant, where the parameter defaults to empty.
    let response = reqwest::get(format!("{app}/api/search")).await.unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn zero_candidates_surface_as_404_with_structured_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/")
        .match_query(Matcher::Any)
        .with_header("content-type", "application/json")
        .with_body(json!({ "organic_results": [] }).to_string())
        .expect(5)
        .create_async()
        .await;

    let app = spawn_app(test_scraper(server.url())).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{app}/api/search"))
        .json(&json!({ "product_name": "widget", "max_results": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No valid product pages found for 'widget'");
}

#[tokio::test]
async fn successful_search_carries_report_and_response_metadata() {
    let mut server = mockito::Server::new_async().await;

    let page_path = "/products/tradeindia.com-pipe.html";
    let page_url = format!("{}{page_path}", server.url());
    server
        .mock("GET", "/")
        .match_query(Matcher::Any)
        .with_header("content-type", "application/json")
        .with_body(json!({ "organic_results": [{ "link": page_url, "title": "Pipe" }] }).to_string())
        .expect_at_least(1)
        .create_async()
        .await;
    server
        .mock("GET", page_path)
        .with_header("content-type", "text/html")
        .with_body(r#"<html><body><h1 class="product-title">Steel Pipe</h1></body></html>"#)
        .create_async()
        .await;

    let app = spawn_app(test_scraper(server.url())).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{app}/api/search"))
        .json(&json!({ "product_name": "steel pipe", "max_results": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["product_name"], "steel pipe");
    assert_eq!(body["total_results"], 1);
    assert_eq!(body["products"][0]["Product Name"], "Steel Pipe");
    assert_eq!(body["api_version"], "1.0");
    assert!(body["request_id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn download_rejects_empty_reports_and_unknown_formats() {
    let app = spawn_app(test_scraper("http://127.0.0.1:1".into())).await;
    let client = reqwest::Client::new();

    let empty = ScrapeReport::new("steel".into(), Vec::new());
    let response = client
        .post(format!("{app}/api/download"))
        .json(&json!({ "results": empty, "format": "csv" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "No results to download");

    let response = client
        .post(format!("{app}/api/download"))
        .json(&json!({ "results": sample_report(), "format": "xml" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid format. Use 'csv' or 'json'");
}

#[tokio::test]
async fn download_returns_attachments_in_both_formats() {
    let app = spawn_app(test_scraper("http://127.0.0.1:1".into())).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{app}/api/download"))
        .json(&json!({ "results": sample_report(), "format": "csv" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/csv");
    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"tradeindia_steel_"));
    assert!(disposition.ends_with(".csv\""));
    let body = response.text().await.unwrap();
    assert!(body.starts_with(&ProductRecord::FIELD_NAMES.join(",")));
    assert!(body.contains("Steel Pipe"));

    let response = client
        .post(format!("{app}/api/download"))
        .json(&json!({ "results": sample_report(), "format": "json" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "application/json");
    let disposition = response.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.ends_with(".json\""));
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["products"][0]["Product Name"], "Steel Pipe");
}
