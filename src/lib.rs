pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::{ConversionRequest, Currency, QuoteService, RateProvider};
use crate::providers::{
    BinanceRateProvider, CachingRateProvider, FixedRateProvider, RoutingRateProvider,
};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    /// Quote `amount`; missing currencies fall back to the configured defaults.
    Convert {
        amount: String,
        from: Option<String>,
        to: Option<String>,
        reverse: bool,
        json: bool,
    },
    /// Show the current USDT rates of `currencies`.
    Rates { currencies: Vec<String> },
}

/// Wires the configured rate sources: fixed rates first, then the exchange,
/// behind a TTL cache.
pub fn build_rate_provider(config: &AppConfig) -> Result<Arc<dyn RateProvider>> {
    let binance = &config.providers.binance;
    let exchange = BinanceRateProvider::new(&binance.base_url)?.with_price_only(binance.price_only);

    let mut fixed = FixedRateProvider::new();
    for (currency, rate) in &config.fixed_rates {
        fixed = fixed.with_rate(currency.clone(), rate.sell_rate, rate.buy_rate)?;
    }

    let routed = RoutingRateProvider::new(fixed, Arc::new(exchange));
    let ttl = Duration::from_secs(config.cache_ttl_secs);
    Ok(Arc::new(CachingRateProvider::new(routed, ttl)))
}

pub fn build_quote_service(config: &AppConfig) -> Result<QuoteService> {
    let provider = build_rate_provider(config)?;
    Ok(QuoteService::new(provider, config.converter()?)
        .with_fetch_timeout(Duration::from_secs(config.fetch_timeout_secs)))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("bridgefx starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let service = build_quote_service(&config)?;

    match command {
        AppCommand::Convert {
            amount,
            from,
            to,
            reverse,
            json,
        } => {
            let from = match from {
                Some(code) => Currency::new(&code)?,
                None => config.default_from.clone(),
            };
            let to = match to {
                Some(code) => Currency::new(&code)?,
                None => config.default_to.clone(),
            };
            let amount = crate::core::conversion::parse_amount(&amount)?;
            let request = ConversionRequest::new(amount, from, to)?;
            let request = if reverse { request.reversed() } else { request };
            cli::convert::run(&service, &request, json).await
        }
        AppCommand::Rates { currencies } => {
            let currencies = if currencies.is_empty() {
                vec![config.default_from.clone(), config.default_to.clone()]
            } else {
                currencies
                    .iter()
                    .map(|c| Currency::new(c))
                    .collect::<Result<Vec<_>, _>>()?
            };
            cli::rates::run(&service, &currencies).await
        }
    }
}
