use thiserror::Error;

/// The only failures that reach the caller. Everything else (a bad page, a
/// failed query variant) is absorbed where it happens.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("SERPAPI_KEY not found. Set it in your .env file or environment")]
    MissingApiKey,

    #[error("No valid product pages found for '{0}'")]
    NoProductPages(String),
}
