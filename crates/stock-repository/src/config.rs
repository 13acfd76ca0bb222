//! Env-driven configuration and provider selection.
//!
//! The provider implementation is chosen once at startup; business logic
//! never branches on the concrete provider type.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use fmp_client::FmpClient;
use finnhub_client::FinnhubClient;
use research_core::FundamentalsProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Fmp,
    Finnhub,
}

impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fmp" => Ok(ProviderKind::Fmp),
            "finnhub" => Ok(ProviderKind::Finnhub),
            other => bail!("unknown provider '{}', expected 'fmp' or 'finnhub'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    pub provider: ProviderKind,
    pub fmp_api_key: Option<String>,
    pub finnhub_api_key: Option<String>,
    pub database_url: String,
    pub provider_timeout: Duration,
}

impl RepositoryConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let provider = std::env::var("STOCKSCOPE_PROVIDER")
            .unwrap_or_else(|_| "fmp".to_string())
            .parse()?;

        let timeout_secs: u64 = std::env::var("PROVIDER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            provider,
            fmp_api_key: std::env::var("FMP_API_KEY").ok(),
            finnhub_api_key: std::env::var("FINNHUB_API_KEY").ok(),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://stockscope.db?mode=rwc".to_string()),
            provider_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

pub fn build_provider(
    config: &RepositoryConfig,
) -> anyhow::Result<Arc<dyn FundamentalsProvider>> {
    match config.provider {
        ProviderKind::Fmp => {
            let key = config
                .fmp_api_key
                .clone()
                .context("FMP_API_KEY is required for the fmp provider")?;
            Ok(Arc::new(FmpClient::new(key)))
        }
        ProviderKind::Finnhub => {
            let key = config
                .finnhub_api_key
                .clone()
                .context("FINNHUB_API_KEY is required for the finnhub provider")?;
            Ok(Arc::new(FinnhubClient::new(key)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_kind_parses() {
        assert_eq!("fmp".parse::<ProviderKind>().unwrap(), ProviderKind::Fmp);
        assert_eq!(
            "Finnhub".parse::<ProviderKind>().unwrap(),
            ProviderKind::Finnhub
        );
        assert!("bloomberg".parse::<ProviderKind>().is_err());
    }
}
