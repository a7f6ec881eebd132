use std::sync::Arc;

use tokio::net::TcpListener;

use tradescout::api::create_router;
use tradescout::config::Config;
use tradescout::scrape::Scraper;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber (handles both tracing and log crate)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    let config = Config::from_env()?;
    let scraper = Arc::new(Scraper::new(&config)?);
    log::info!("scraper initialized");

    let app = create_router(scraper);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    log::info!("listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
