use std::time::Duration;

use anyhow::Result;
use reqwest::Url;
use reqwest::header::{self, HeaderMap, HeaderValue};
use scraper::{ElementRef, Html, Selector};

use crate::data_models::ProductRecord;

pub const BASE_ORIGIN: &str = "https://www.tradeindia.com";

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_RETRIES: u32 = 3;

// Ordered fallback chains, most specific selector first. The first one that
// yields non-empty trimmed text wins; otherwise the field keeps its sentinel.
const PRODUCT_NAME_SELECTORS: &[&str] = &[
    "h1.product-title",
    "h1",
    ".product-title",
    ".product-name",
    "h2.product-title",
    ".product-details h1",
    ".product-info h1",
    "h1[class*='title']",
    ".product-header h1",
    ".product-name h1",
    "h1.product-name",
];

const COMPANY_SELECTORS: &[&str] = &[
    "a.company-url",
    ".company-name",
    ".supplier-name",
    ".seller-name",
    "a[href*='/seller/']",
    ".product-supplier",
    ".company-info a",
    ".supplier-info a",
    "a[class*='company']",
    "a[class*='supplier']",
    ".seller-info a",
    ".company-details a",
];

const LOCATION_SELECTORS: &[&str] = &[
    "h3.erNFE",
    ".location",
    ".company-location",
    ".supplier-location",
    ".product-location",
    "[class*='location']",
    ".address",
    ".company-address",
    ".supplier-address",
    ".location-info",
    ".company-location-info",
];

const PRICE_SELECTORS: &[&str] = &[
    "span.price-text",
    ".price",
    ".product-price",
    ".price-value",
    "[class*='price']",
    ".cost",
    ".product-cost",
    ".price-info",
    ".product-price-info",
];

const BUSINESS_TYPE_SELECTOR: &str = "span.fSXCQo";
const ESTABLISHED_LABEL: &str = "Established In:";

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
        ),
    );
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));
    headers
}

/// Fetches one candidate page and pulls the product fields out of its markup.
/// Every failure here is soft: log it, return None, move on.
pub struct PageExtractor {
    http: reqwest::Client,
    retry_base: Duration,
}

impl PageExtractor {
    pub fn new() -> Result<PageExtractor> {
        let http = reqwest::Client::builder()
            .default_headers(browser_headers())
            .timeout(FETCH_TIMEOUT)
            .build()?;
        Ok(PageExtractor {
            http,
            retry_base: Duration::from_secs(1),
        })
    }

    /// Shrink the backoff between retries (tests).
    pub fn with_retry_base(mut self, retry_base: Duration) -> PageExtractor {
        self.retry_base = retry_base;
        self
    }

    pub async fn extract(&self, url: &str) -> Option<ProductRecord> {
        log::info!("fetching: {url}");
        let html = self.fetch_page(url).await?;
        let record = parse_product_page(url, &html);
        log::info!("extracted: {} - {}", record.product_name, record.company_name);
        Some(record)
    }

    // Server errors are retried with exponential backoff; any other non-200
    // is final for this candidate.
    async fn fetch_page(&self, url: &str) -> Option<String> {
        let mut attempt = 0u32;
        loop {
            match self.http.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.text().await {
                            Ok(body) => return Some(body),
                            Err(e) => {
                                log::warn!("failed to read body from {url}: {e}");
                                return None;
                            }
                        }
                    }
                    if is_retriable(status.as_u16()) && attempt < MAX_RETRIES {
                        attempt += 1;
                        log::warn!("HTTP {status} for {url}, retry {attempt}/{MAX_RETRIES}");
                        tokio::time::sleep(self.retry_base * 2u32.pow(attempt - 1)).await;
                        continue;
                    }
                    log::warn!("HTTP {status} for {url}");
                    return None;
                }
                Err(e) => {
                    if attempt < MAX_RETRIES {
                        attempt += 1;
                        log::warn!("fetch error for {url}: {e}, retry {attempt}/{MAX_RETRIES}");
                        tokio::time::sleep(self.retry_base * 2u32.pow(attempt - 1)).await;
                        continue;
                    }
                    log::warn!("fetch error for {url}: {e}");
                    return None;
                }
            }
        }
    }
}

fn is_retriable(status: u16) -> bool {
    matches!(status, 500 | 502 | 503 | 504)
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// First selector in the chain that yields non-empty trimmed text.
fn select_first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let text = element_text(&element);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

// Company needs both the display name and the href of the matched anchor.
fn select_company(document: &Html) -> Option<(String, String)> {
    for raw in COMPANY_SELECTORS {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        if let Some(element) = document.select(&selector).next() {
            let name = element_text(&element);
            if name.is_empty() {
                continue;
            }
            let href = element.value().attr("href").unwrap_or_default();
            return Some((name, absolutize(href)));
        }
    }
    None
}

/// Relative seller links are rewritten against the site's base origin, e.g.
/// `/seller/acme` becomes `https://www.tradeindia.com/seller/acme`.
fn absolutize(href: &str) -> String {
    if href.is_empty() || href.starts_with("http") {
        return href.to_string();
    }
    match Url::parse(BASE_ORIGIN).and_then(|base| base.join(href)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => href.to_string(),
    }
}

// Fallback for the product name: the page title, keeping the segment left of
// the first " - " delimiter.
fn title_fallback(document: &Html) -> Option<String> {
    let Ok(selector) = Selector::parse("title") else {
        return None;
    };
    let title = element_text(&document.select(&selector).next()?);
    if title.is_empty() {
        return None;
    }
    match title.split_once(" - ") {
        Some((left, _)) => Some(left.trim().to_string()),
        None => Some(title),
    }
}

// Badges are presence checks, not text extraction: either an image with the
// badge label as alt text, or a span whose whole text is the label.
fn has_badge(document: &Html, label: &str) -> bool {
    if let Ok(selector) = Selector::parse(&format!("img[alt=\"{label}\"]")) {
        if document.select(&selector).next().is_some() {
            return true;
        }
    }
    let Ok(selector) = Selector::parse("span") else {
        return false;
    };
    document
        .select(&selector)
        .any(|element| element_text(&element) == label)
}

// "Established In:" is a label span followed by the value span in document
// order.
fn labeled_next_span(document: &Html, label: &str) -> Option<String> {
    let Ok(selector) = Selector::parse("span") else {
        return None;
    };
    let mut spans = document.select(&selector);
    while let Some(element) = spans.next() {
        if element_text(&element) == label {
            return spans
                .next()
                .map(|next| element_text(&next))
                .filter(|text| !text.is_empty());
        }
    }
    None
}

/// Apply every fallback chain to the parsed page. Infallible: anything that
/// doesn't match leaves the sentinel in place.
pub fn parse_product_page(url: &str, html: &str) -> ProductRecord {
    let document = Html::parse_document(html);
    let mut record = ProductRecord::sentinel(url.to_string());

    if let Some(name) = select_first_text(&document, PRODUCT_NAME_SELECTORS) {
        record.product_name = name;
    } else if let Some(name) = title_fallback(&document) {
        record.product_name = name;
    }

    if let Some((name, link)) = select_company(&document) {
        record.company_name = name;
        record.company_link = link;
    }

    if let Some(location) = select_first_text(&document, LOCATION_SELECTORS) {
        record.location = location;
    }
    if let Some(price) = select_first_text(&document, PRICE_SELECTORS) {
        record.price_inr = price;
    }
    if has_badge(&document, "Trusted Seller") {
        record.trust_status = "Trusted Seller".to_string();
    }
    if has_badge(&document, "Super Seller") {
        record.super_seller = "Super Seller".to_string();
    }
    if let Some(year) = labeled_next_span(&document, ESTABLISHED_LABEL) {
        record.established_year = year;
    }
    if let Some(business_type) = select_first_text(&document, &[BUSINESS_TYPE_SELECTOR]) {
        record.business_type = business_type;
    }

    record
}
