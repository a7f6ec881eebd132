use std::time::Duration;

use anyhow::Result;

use crate::config::Config;
use crate::data_models::{ProductRecord, ScrapeReport};
use crate::error::ScrapeError;
use crate::extractor::PageExtractor;
use crate::search::{SearchRunner, SerpApiClient};

/// The full pipeline: search strategy runner -> page field extractor ->
/// report. One scrape run is strictly sequential.
pub struct Scraper {
    runner: SearchRunner,
    extractor: PageExtractor,
    fetch_delay: Duration,
}

impl Scraper {
    pub fn new(config: &Config) -> Result<Scraper> {
        let runner = SearchRunner::new(SerpApiClient::new(config.serpapi_key.clone()));
        let extractor = PageExtractor::new()?;
        Ok(Scraper {
            runner,
            extractor,
            fetch_delay: Duration::from_secs(1),
        })
    }

    /// Assemble a scraper from already-configured stages (tests).
    pub fn from_parts(
        runner: SearchRunner,
        extractor: PageExtractor,
        fetch_delay: Duration,
    ) -> Scraper {
        Scraper {
            runner,
            extractor,
            fetch_delay,
        }
    }

    /// Zero candidates is a caller-visible error. A report with zero products
    /// is not: it means every candidate's extraction failed, and those
    /// failures are absorbed per-candidate.
    ///
    /// `include_detailed_info` is accepted for API compatibility; extraction
    /// always runs.
    pub async fn scrape(
        &self,
        product_name: &str,
        max_results: usize,
        _include_detailed_info: bool,
    ) -> Result<ScrapeReport, ScrapeError> {
        log::info!("starting scrape for '{product_name}'");

        let links = self.runner.find_candidate_links(product_name, max_results).await;
        if links.is_empty() {
            return Err(ScrapeError::NoProductPages(product_name.to_string()));
        }

        let mut products: Vec<ProductRecord> = Vec::new();
        for (i, link) in links.iter().enumerate() {
            log::info!("processing product {}/{}: {}", i + 1, links.len(), link.title);
            if let Some(record) = self.extractor.extract(&link.url).await {
                products.push(record);
            }
            tokio::time::sleep(self.fetch_delay).await;
        }

        log::info!("scraped {} products for '{product_name}'", products.len());
        Ok(ScrapeReport::new(product_name.to_string(), products))
    }
}

/// Pretty-printed JSON rendering of the full report, non-ASCII preserved.
/// None when the report holds no products.
pub fn generate_json(report: &ScrapeReport) -> Option<String> {
    if report.products.is_empty() {
        return None;
    }
    serde_json::to_string_pretty(report).ok()
}

/// Tabular rendering, one row per record, columns in the fixed field order.
/// None when the report holds no products.
pub fn generate_csv(report: &ScrapeReport) -> Option<Vec<u8>> {
    if report.products.is_empty() {
        return None;
    }
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(ProductRecord::FIELD_NAMES).ok()?;
    for product in &report.products {
        writer.write_record(product.csv_row()).ok()?;
    }
    writer.into_inner().ok()
}
