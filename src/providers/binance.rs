use super::util::with_retry;
use crate::core::currency::Currency;
use crate::core::error::{ConversionError, QuoteResult};
use crate::core::rate::{Rate, RateProvider};
use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Quotes a currency against USDT using the `USDT<CODE>` spot market.
pub struct BinanceRateProvider {
    base_url: String,
    client: reqwest::Client,
    price_only: bool,
    retries: usize,
    retry_delay_ms: u64,
}

impl BinanceRateProvider {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("bridgefx/0.1")
            .build()
            .context("Failed to build HTTP client")?;
        Ok(BinanceRateProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            price_only: false,
            retries: 2,
            retry_delay_ms: 300,
        })
    }

    /// Use the last traded price for both legs instead of the order book.
    pub fn with_price_only(mut self, price_only: bool) -> Self {
        self.price_only = price_only;
        self
    }

    pub fn with_retries(mut self, retries: usize, delay_ms: u64) -> Self {
        self.retries = retries;
        self.retry_delay_ms = delay_ms;
        self
    }

    fn symbol(currency: &Currency) -> String {
        format!("USDT{}", currency.code())
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        currency: &Currency,
    ) -> QuoteResult<T> {
        let unavailable = |reason: String| ConversionError::rate_unavailable(currency.code(), reason);

        let response = with_retry(
            || {
                let client = &self.client;
                async move { client.get(url).send().await }
            },
            self.retries,
            self.retry_delay_ms,
        )
        .await
        .map_err(|e| unavailable(format!("request error: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| unavailable(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<BinanceError>(&text)
                .map(|e| e.msg)
                .unwrap_or(text);
            warn!(%status, %message, "Exchange API returned an error");
            return Err(unavailable(format!("HTTP error {status}: {message}")));
        }

        serde_json::from_str(&text).map_err(|e| {
            warn!(error = ?e, response = %text, "Failed to parse exchange response");
            unavailable(format!("failed to parse response: {e}"))
        })
    }
}

#[derive(Debug, Deserialize)]
struct BinanceError {
    msg: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookTicker {
    symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    bid_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    ask_price: Decimal,
}

#[derive(Debug, Deserialize)]
struct PriceTicker {
    symbol: String,
    #[serde(with = "rust_decimal::serde::str")]
    price: Decimal,
}

#[async_trait]
impl RateProvider for BinanceRateProvider {
    #[instrument(name = "BinanceRateFetch", skip(self), fields(currency = %currency))]
    async fn fetch_rate(&self, currency: &Currency) -> QuoteResult<Rate> {
        let symbol = Self::symbol(currency);

        // Buying USDT with the currency pays the ask; selling USDT for it receives the bid.
        let (sell_rate, buy_rate) = if self.price_only {
            let url = format!("{}/api/v3/ticker/price?symbol={symbol}", self.base_url);
            debug!("Requesting price from {}", url);
            let ticker: PriceTicker = self.get_json(&url, currency).await?;
            debug!(symbol = %ticker.symbol, price = %ticker.price, "Received price");
            (ticker.price, ticker.price)
        } else {
            let url = format!("{}/api/v3/ticker/bookTicker?symbol={symbol}", self.base_url);
            debug!("Requesting book ticker from {}", url);
            let ticker: BookTicker = self.get_json(&url, currency).await?;
            debug!(
                symbol = %ticker.symbol,
                bid = %ticker.bid_price,
                ask = %ticker.ask_price,
                "Received book ticker"
            );
            (ticker.ask_price, ticker.bid_price)
        };

        Rate::new(currency.clone(), sell_rate, buy_rate, Utc::now())
    }
}
