//! Rates pinned in configuration, e.g. a USD peg to USDT.

use crate::core::currency::Currency;
use crate::core::error::{ConversionError, QuoteResult};
use crate::core::rate::{Rate, RateProvider};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct FixedRateProvider {
    rates: HashMap<Currency, (Decimal, Decimal)>,
}

impl FixedRateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pinned `(sell, buy)` pair for `currency`, rejecting non-positive legs.
    pub fn with_rate(
        mut self,
        currency: Currency,
        sell_rate: Decimal,
        buy_rate: Decimal,
    ) -> QuoteResult<Self> {
        if sell_rate <= Decimal::ZERO || buy_rate <= Decimal::ZERO {
            return Err(ConversionError::InvalidConfiguration(format!(
                "fixed rate for {currency} must be positive"
            )));
        }
        self.rates.insert(currency, (sell_rate, buy_rate));
        Ok(self)
    }

    pub fn supports(&self, currency: &Currency) -> bool {
        self.rates.contains_key(currency)
    }
}

#[async_trait]
impl RateProvider for FixedRateProvider {
    async fn fetch_rate(&self, currency: &Currency) -> QuoteResult<Rate> {
        let (sell_rate, buy_rate) = self.rates.get(currency).copied().ok_or_else(|| {
            ConversionError::rate_unavailable(currency.code(), "no fixed rate configured")
        })?;
        debug!(%currency, %sell_rate, %buy_rate, "Using fixed rate");
        Rate::new(currency.clone(), sell_rate, buy_rate, Utc::now())
    }
}
