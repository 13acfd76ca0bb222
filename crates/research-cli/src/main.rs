//! research-cli: score tickers from the command line and print JSON.
//!
//! Usage:
//!   cargo run -p research-cli -- AAPL MSFT
//!   STOCKSCOPE_PROVIDER=finnhub cargo run -p research-cli -- BRK.B

use std::sync::Arc;

use sector_metrics::SectorTables;
use stock_repository::{build_provider, RepositoryConfig, SqlCacheStore, StockRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "research_cli=info,stock_repository=info".into()),
        )
        .init();

    let tickers: Vec<String> = std::env::args().skip(1).collect();
    if tickers.is_empty() {
        anyhow::bail!("usage: research-cli TICKER [TICKER...]");
    }

    let config = RepositoryConfig::from_env()?;
    let provider = build_provider(&config)?;
    tracing::info!("using {} provider", provider.name());

    let store = Arc::new(SqlCacheStore::connect(&config.database_url).await?);
    let repository = StockRepository::new(
        provider,
        store,
        Arc::new(SectorTables::builtin()),
        config.provider_timeout,
    );

    let mut failures = 0;
    for ticker in &tickers {
        match repository.get_scored_stock(ticker).await {
            Ok(scored) => println!("{}", serde_json::to_string_pretty(&scored)?),
            Err(e) => {
                failures += 1;
                tracing::error!("{}: {}", ticker, e);
            }
        }
    }

    if failures == tickers.len() {
        anyhow::bail!("all {} tickers failed", failures);
    }
    Ok(())
}
