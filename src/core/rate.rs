//! Exchange rates against USDT and the provider abstraction that supplies them.

use crate::core::currency::Currency;
use crate::core::error::{ConversionError, QuoteResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quote for one currency against one unit of USDT.
///
/// `sell_rate` is what one USDT costs when acquiring it with `currency`,
/// `buy_rate` is what one USDT pays out in `currency`. Both are expressed in
/// units of `currency` per USDT and may differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rate {
    pub currency: Currency,
    #[serde(with = "rust_decimal::serde::float")]
    pub sell_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub buy_rate: Decimal,
    pub observed_at: DateTime<Utc>,
}

impl Rate {
    /// Creates a rate, rejecting non-positive legs.
    pub fn new(
        currency: Currency,
        sell_rate: Decimal,
        buy_rate: Decimal,
        observed_at: DateTime<Utc>,
    ) -> QuoteResult<Self> {
        let rate = Rate {
            currency,
            sell_rate,
            buy_rate,
            observed_at,
        };
        rate.check_positive()?;
        Ok(rate)
    }

    pub fn check_positive(&self) -> QuoteResult<()> {
        if self.sell_rate <= Decimal::ZERO || self.buy_rate <= Decimal::ZERO {
            return Err(ConversionError::rate_unavailable(
                self.currency.code(),
                format!(
                    "non-positive rate (sell {}, buy {})",
                    self.sell_rate, self.buy_rate
                ),
            ));
        }
        Ok(())
    }

    /// Rejects the rate if it is older than `max_age` at `as_of`.
    ///
    /// `None` disables the check.
    pub fn check_fresh(&self, max_age: Option<Duration>, as_of: DateTime<Utc>) -> QuoteResult<()> {
        let Some(max_age) = max_age else {
            return Ok(());
        };
        let age = as_of.signed_duration_since(self.observed_at);
        if age > max_age {
            return Err(ConversionError::rate_unavailable(
                self.currency.code(),
                format!(
                    "stale rate observed {}s ago (max {}s)",
                    age.num_seconds(),
                    max_age.num_seconds()
                ),
            ));
        }
        Ok(())
    }

    /// Age of the rate at `as_of`.
    pub fn age(&self, as_of: DateTime<Utc>) -> Duration {
        as_of.signed_duration_since(self.observed_at)
    }
}

/// Supplies the USDT quote for a currency.
#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rate(&self, currency: &Currency) -> QuoteResult<Rate>;
}
