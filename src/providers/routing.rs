use super::fixed::FixedRateProvider;
use crate::core::currency::Currency;
use crate::core::error::QuoteResult;
use crate::core::rate::{Rate, RateProvider};
use async_trait::async_trait;
use std::sync::Arc;

/// Serves pinned rates where configured and asks `fallback` for the rest.
pub struct RoutingRateProvider {
    fixed: FixedRateProvider,
    fallback: Arc<dyn RateProvider>,
}

impl RoutingRateProvider {
    pub fn new(fixed: FixedRateProvider, fallback: Arc<dyn RateProvider>) -> Self {
        Self { fixed, fallback }
    }
}

#[async_trait]
impl RateProvider for RoutingRateProvider {
    async fn fetch_rate(&self, currency: &Currency) -> QuoteResult<Rate> {
        if self.fixed.supports(currency) {
            return self.fixed.fetch_rate(currency).await;
        }
        self.fallback.fetch_rate(currency).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_routes_fixed_then_fallback() {
        let usd = Currency::new("USD").unwrap();
        let brl = Currency::new("BRL").unwrap();
        let fixed = FixedRateProvider::new()
            .with_rate(usd.clone(), dec!(1), dec!(1))
            .unwrap();
        let fallback = FixedRateProvider::new()
            .with_rate(brl.clone(), dec!(5.4), dec!(5.3))
            .unwrap();

        let provider = RoutingRateProvider::new(fixed, Arc::new(fallback));

        assert_eq!(provider.fetch_rate(&usd).await.unwrap().sell_rate, dec!(1));
        assert_eq!(provider.fetch_rate(&brl).await.unwrap().sell_rate, dec!(5.4));
        assert!(
            provider
                .fetch_rate(&Currency::new("BOB").unwrap())
                .await
                .is_err()
        );
    }
}
