use dotenvy::dotenv;
use std::env;

use crate::error::ScrapeError;

/// Process configuration, loaded once in main and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub serpapi_key: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from the environment (and a .env file if present).
    /// A missing search API key is fatal: nothing downstream can run without it.
    pub fn from_env() -> Result<Config, ScrapeError> {
        dotenv().ok(); // Load .env file if present
        let serpapi_key = env::var("SERPAPI_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(ScrapeError::MissingApiKey)?;

        Ok(Config {
            serpapi_key,
            host: get_env_or_default("HOST", "0.0.0.0"),
            port: parse_port(&get_env_or_default("PORT", "5000")),
        })
    }
}

const DEFAULT_PORT: u16 = 5000;

fn parse_port(value: &str) -> u16 {
    value.parse().unwrap_or_else(|_| {
        log::warn!("invalid PORT value '{value}', falling back to {DEFAULT_PORT}");
        DEFAULT_PORT
    })
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[test]
fn test_parse_port_falls_back_on_garbage() {
    assert_eq!(parse_port("8080"), 8080);
    assert_eq!(parse_port("5000"), 5000);
    assert_eq!(parse_port("not-a-port"), DEFAULT_PORT);
    assert_eq!(parse_port(""), DEFAULT_PORT);
    assert_eq!(parse_port("70000"), DEFAULT_PORT);
}
