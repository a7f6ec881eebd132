use chrono::Local;
use serde::{Deserialize, Serialize};

pub const NOT_AVAILABLE: &str = "N/A";
pub const NOT_TRUSTED: &str = "Not Trusted";
pub const NOT_SUPER_SELLER: &str = "Not Super Seller";

/// Capture timestamp in the format used across records and reports.
pub fn timestamp_now() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// One organic search hit that survived the page-validity filter.
/// Deduplicated by `url`, first occurrence wins.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchResultLink {
    pub url: String,
    pub title: String,
}

/// Everything we pull off a single product page. Every field is always
/// present; anything the selectors missed keeps its sentinel value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProductRecord {
    #[serde(rename = "Product Name")]
    pub product_name: String,
    #[serde(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "Company Link")]
    pub company_link: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Price (INR)")]
    pub price_inr: String,
    #[serde(rename = "Trust Status")]
    pub trust_status: String,
    #[serde(rename = "Super Seller")]
    pub super_seller: String,
    #[serde(rename = "Established Year")]
    pub established_year: String,
    #[serde(rename = "Business Type")]
    pub business_type: String,
    #[serde(rename = "Product Link")]
    pub product_link: String,
    #[serde(rename = "Scraped At")]
    pub scraped_at: String,
}

impl ProductRecord {
    /// Column order for tabular export, matching the serialized field names.
    pub const FIELD_NAMES: [&'static str; 11] = [
        "Product Name",
        "Company Name",
        "Company Link",
        "Location",
        "Price (INR)",
        "Trust Status",
        "Super Seller",
        "Established Year",
        "Business Type",
        "Product Link",
        "Scraped At",
    ];

    /// A record with every field at its sentinel, stamped with the input URL
    /// and the capture time. The extractor overwrites whatever it finds.
    pub fn sentinel(product_link: String) -> ProductRecord {
        ProductRecord {
            product_name: NOT_AVAILABLE.to_string(),
            company_name: NOT_AVAILABLE.to_string(),
            company_link: String::new(),
            location: NOT_AVAILABLE.to_string(),
            price_inr: NOT_AVAILABLE.to_string(),
            trust_status: NOT_TRUSTED.to_string(),
            super_seller: NOT_SUPER_SELLER.to_string(),
            established_year: NOT_AVAILABLE.to_string(),
            business_type: NOT_AVAILABLE.to_string(),
            product_link,
            scraped_at: timestamp_now(),
        }
    }

    pub fn csv_row(&self) -> [&str; 11] {
        [
            self.product_name.as_str(),
            self.company_name.as_str(),
            self.company_link.as_str(),
            self.location.as_str(),
            self.price_inr.as_str(),
            self.trust_status.as_str(),
            self.super_seller.as_str(),
            self.established_year.as_str(),
            self.business_type.as_str(),
            self.product_link.as_str(),
            self.scraped_at.as_str(),
        ]
    }
}

/// Aggregate result of one scrape invocation.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScrapeReport {
    pub product_name: String,
    pub total_results: usize,
    pub scraped_at: String,
    pub products: Vec<ProductRecord>,
}

impl ScrapeReport {
    pub fn new(product_name: String, products: Vec<ProductRecord>) -> ScrapeReport {
        ScrapeReport {
            product_name,
            total_results: products.len(),
            scraped_at: timestamp_now(),
            products,
        }
    }
}
