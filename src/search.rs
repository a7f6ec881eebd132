use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use serde::Deserialize;

use crate::data_models::SearchResultLink;

pub const TARGET_DOMAIN: &str = "tradeindia.com";

const SERPAPI_URL: &str = "https://serpapi.com/search";
const RESULTS_PER_QUERY: &str = "10";

static EXCLUDE_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
static INCLUDE_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();

// Pages that are definitely not per-item detail pages: Q&A, blogs,
// country/city hubs, bare listing/category pages, documents, seller roots.
fn exclude_patterns() -> &'static Vec<Regex> {
    EXCLUDE_PATTERNS.get_or_init(|| {
        [
            r"(?i)/question-answer/",
            r"(?i)/blog/",
            r"(?i)/us/",
            r"(?i)/city-",
            r"(?i)/products/$",
            r"(?i)/products\?",
            r"(?i)/category/",
            r"(?i)/manufacturers/",
            r"(?i)/suppliers/",
            r"(?i)/seller/$",
            r"(?i)/seller\?",
            r"(?i)\.pdf$",
            r"(?i)\.doc$",
            r"(?i)\.docx$",
            r"(?i)Q\.",
            r"(?i)Question",
            r"(?i)Answer",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).unwrap())
        .collect()
    })
}

fn include_patterns() -> &'static Vec<Regex> {
    INCLUDE_PATTERNS.get_or_init(|| {
        [
            r"/products/.*\.html$",
            r"\.tradeindia\.com/.*\.html$",
            r"/seller/.*\.html$",
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).unwrap())
        .collect()
    })
}

/// Exclusion is checked first, on both URL and title, and short-circuits
/// rejection. Only then must the URL match one of the detail-page shapes.
pub fn is_valid_product_page(url: &str, title: &str) -> bool {
    for pattern in exclude_patterns() {
        if pattern.is_match(url) || pattern.is_match(title) {
            return false;
        }
    }
    include_patterns().iter().any(|pattern| pattern.is_match(url))
}

#[derive(Deserialize, Debug)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Deserialize, Debug)]
struct OrganicResult {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
}

/// Thin client for the SerpApi Google engine.
pub struct SerpApiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SerpApiClient {
    pub fn new(api_key: String) -> SerpApiClient {
        SerpApiClient {
            http: reqwest::Client::new(),
            api_key,
            base_url: SERPAPI_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (tests).
    pub fn with_base_url(mut self, base_url: String) -> SerpApiClient {
        self.base_url = base_url;
        self
    }

    async fn search(&self, query: &str) -> Result<Vec<OrganicResult>> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("num", RESULTS_PER_QUERY),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: SerpResponse = response.json().await?;
        Ok(body.organic_results)
    }
}

/// Runs the fixed list of query variants against the search provider and
/// accumulates deduplicated candidate links.
pub struct SearchRunner {
    serp: SerpApiClient,
    query_delay: Duration,
}

impl SearchRunner {
    pub fn new(serp: SerpApiClient) -> SearchRunner {
        SearchRunner {
            serp,
            query_delay: Duration::from_secs(1),
        }
    }

    pub fn with_query_delay(mut self, delay: Duration) -> SearchRunner {
        self.query_delay = delay;
        self
    }

    // A single query form under-recalls because the indexed site structure
    // is inconsistent; several phrasings buy coverage for a few extra calls.
    fn build_queries(product_name: &str) -> Vec<String> {
        vec![
            format!("\"{product_name}\" site:{TARGET_DOMAIN}/products"),
            format!("{product_name} supplier site:{TARGET_DOMAIN}"),
            format!("{product_name} manufacturer site:{TARGET_DOMAIN}"),
            format!("{product_name} site:{TARGET_DOMAIN} -question -answer -blog"),
            format!("{product_name} site:{TARGET_DOMAIN} filetype:html"),
        ]
    }

    /// Returns at most `max_results` candidates in first-seen order. A failed
    /// query variant is logged and skipped; it never aborts the run.
    pub async fn find_candidate_links(
        &self,
        product_name: &str,
        max_results: usize,
    ) -> Vec<SearchResultLink> {
        log::info!("searching for '{product_name}' products on TradeIndia");

        let mut seen: HashSet<String> = HashSet::new();
        let mut candidates: Vec<SearchResultLink> = Vec::new();

        for query in Self::build_queries(product_name) {
            log::info!("trying query: {query}");

            let results = match self.serp.search(&query).await {
                Ok(results) => results,
                Err(e) => {
                    log::warn!("search query failed, skipping: {:#}", e);
                    continue;
                }
            };
            if results.is_empty() {
                log::info!("no results for this query");
                continue;
            }

            let mut added = 0usize;
            for result in results {
                if !result.link.contains(TARGET_DOMAIN) {
                    continue;
                }
                if !is_valid_product_page(&result.link, &result.title) {
                    continue;
                }
                if seen.insert(result.link.clone()) {
                    candidates.push(SearchResultLink {
                        url: result.link,
                        title: result.title,
                    });
                    added += 1;
                }
            }
            log::info!("found {added} new valid product links");

            if candidates.len() >= max_results {
                break;
            }

            // Courtesy delay so we don't trip the provider's rate limiter.
            tokio::time::sleep(self.query_delay).await;
        }

        candidates.truncate(max_results);
        log::info!("found {} total valid product links", candidates.len());
        candidates
    }
}

#[test]
fn test_build_queries_cover_all_strategies() {
    let queries = SearchRunner::build_queries("steel");
    assert_eq!(queries.len(), 5);
    assert_eq!(queries[0], "\"steel\" site:tradeindia.com/products");
    assert_eq!(queries[1], "steel supplier site:tradeindia.com");
    assert_eq!(queries[2], "steel manufacturer site:tradeindia.com");
    assert_eq!(queries[3], "steel site:tradeindia.com -question -answer -blog");
    assert_eq!(queries[4], "steel site:tradeindia.com filetype:html");
}

#[test]
fn test_page_validity_filter() {
    // Detail-page shapes are accepted
    assert!(is_valid_product_page(
        "https://www.tradeindia.com/products/steel-pipe-123.html",
        "Steel Pipe"
    ));
    assert!(is_valid_product_page(
        "https://acme.tradeindia.com/steel-pipe.html",
        "Steel Pipe"
    ));
    assert!(is_valid_product_page(
        "https://www.tradeindia.com/seller/acme-widgets.html",
        "Acme Widgets"
    ));

    // Exclusion wins even when an inclusion pattern also matches
    assert!(!is_valid_product_page(
        "https://x.tradeindia.com/products/blog/widget.html",
        "Widget"
    ));

    // Hub, listing and document pages are rejected
    assert!(!is_valid_product_page("https://www.tradeindia.com/products/", "Products"));
    assert!(!is_valid_product_page("https://www.tradeindia.com/category/steel", "Steel"));
    assert!(!is_valid_product_page("https://www.tradeindia.com/specs.pdf", "Specs"));

    // Title exclusions are case-insensitive
    assert!(!is_valid_product_page(
        "https://www.tradeindia.com/products/widget.html",
        "question about widgets"
    ));

    // A plain page that matches no inclusion pattern is rejected
    assert!(!is_valid_product_page("https://www.tradeindia.com/about", "About"));
}
