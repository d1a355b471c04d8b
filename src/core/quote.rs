//! Fetches both rates of a conversion concurrently and runs the pipeline.

use crate::core::conversion::{ConversionRequest, ConversionResult, Converter};
use crate::core::currency::Currency;
use crate::core::error::{ConversionError, QuoteResult};
use crate::core::rate::{Rate, RateProvider};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct QuoteService {
    provider: Arc<dyn RateProvider>,
    converter: Converter,
    fetch_timeout: Duration,
}

impl QuoteService {
    pub fn new(provider: Arc<dyn RateProvider>, converter: Converter) -> Self {
        Self {
            provider,
            converter,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Quotes `request`, failing as a whole if either rate cannot be obtained.
    #[instrument(
        name = "Quote",
        skip(self, request),
        fields(from = %request.source, to = %request.target, amount = %request.amount)
    )]
    pub async fn quote(&self, request: &ConversionRequest) -> QuoteResult<ConversionResult> {
        if request.is_same_currency() {
            let identity = self.identity_rate(&request.source);
            return self
                .converter
                .convert(request, &identity, &identity, Utc::now());
        }

        // try_join drops the other fetch as soon as one fails
        let (rate_from, rate_to) = tokio::try_join!(
            self.fetch_rate(&request.source),
            self.fetch_rate(&request.target)
        )?;

        let result = self
            .converter
            .convert(request, &rate_from, &rate_to, Utc::now())?;
        info!(final_amount = %result.final_amount, "Quote computed");
        Ok(result)
    }

    /// Fetches a rate under the configured timeout.
    pub async fn fetch_rate(&self, currency: &Currency) -> QuoteResult<Rate> {
        debug!(%currency, "Fetching rate");
        match tokio::time::timeout(self.fetch_timeout, self.provider.fetch_rate(currency)).await {
            Ok(result) => result,
            Err(_) => Err(ConversionError::rate_unavailable(
                currency.code(),
                format!("timed out after {}ms", self.fetch_timeout.as_millis()),
            )),
        }
    }

    /// Fetches the rates of several currencies concurrently, keeping each outcome.
    pub async fn rates(&self, currencies: &[Currency]) -> Vec<(Currency, QuoteResult<Rate>)> {
        let futures = currencies.iter().map(|currency| async move {
            (currency.clone(), self.fetch_rate(currency).await)
        });
        join_all(futures).await
    }

    fn identity_rate(&self, currency: &Currency) -> Rate {
        Rate {
            currency: currency.clone(),
            sell_rate: rust_decimal::Decimal::ONE,
            buy_rate: rust_decimal::Decimal::ONE,
            observed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fees::FeePolicy;
    use crate::providers::FixedRateProvider;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn currency(code: &str) -> Currency {
        Currency::new(code).unwrap()
    }

    fn fixed_provider() -> FixedRateProvider {
        FixedRateProvider::new()
            .with_rate(currency("BRL"), dec!(5.00), dec!(4.95))
            .unwrap()
            .with_rate(currency("BOB"), dec!(7.05), dec!(7.00))
            .unwrap()
    }

    fn service(provider: Arc<dyn RateProvider>) -> QuoteService {
        let policy = FeePolicy::new(dec!(0.02), dec!(0.0195), dec!(0.01)).unwrap();
        QuoteService::new(provider, Converter::new(policy))
    }

    /// Delays every lookup and counts calls.
    struct SlowProvider {
        inner: FixedRateProvider,
        delay: Duration,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RateProvider for SlowProvider {
        async fn fetch_rate(&self, currency: &Currency) -> QuoteResult<Rate> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.inner.fetch_rate(currency).await
        }
    }

    #[tokio::test]
    async fn test_quote_uses_both_rates() {
        let result = service(Arc::new(fixed_provider()))
            .quote(&ConversionRequest::parse("1000", "BRL", "BOB").unwrap())
            .await
            .unwrap();

        assert_eq!(result.final_amount, dec!(1331.79354));
        let steps = result.steps.unwrap();
        assert_eq!(steps.exchange_rate_used.from, dec!(5.00));
        assert_eq!(steps.exchange_rate_used.to, dec!(7.00));
    }

    #[tokio::test]
    async fn test_same_currency_skips_fetching() {
        let provider = Arc::new(SlowProvider {
            inner: FixedRateProvider::new(),
            delay: Duration::from_millis(1),
            calls: AtomicUsize::new(0),
        });
        let result = service(provider.clone())
            .quote(&ConversionRequest::parse("42.5", "bob", "BOB").unwrap())
            .await
            .unwrap();

        assert_eq!(result.final_amount, dec!(42.5));
        assert!(result.steps.is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_rate_fails_whole_quote() {
        let err = service(Arc::new(fixed_provider()))
            .quote(&ConversionRequest::parse("1000", "BRL", "ARS").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConversionError::RateUnavailable { ref currency, .. } if currency == "ARS"
        ));
    }

    #[tokio::test]
    async fn test_fetches_run_concurrently() {
        let provider = Arc::new(SlowProvider {
            inner: fixed_provider(),
            delay: Duration::from_millis(200),
            calls: AtomicUsize::new(0),
        });
        let service = service(provider.clone()).with_fetch_timeout(Duration::from_millis(300));

        // Sequential fetches would need 400ms and trip the 300ms timeout on the second one.
        let started = std::time::Instant::now();
        let result = service
            .quote(&ConversionRequest::parse("1000", "BRL", "BOB").unwrap())
            .await;
        assert!(result.is_ok(), "quote failed: {result:?}");
        assert!(started.elapsed() < Duration::from_millis(390));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_slow_rate_times_out() {
        let provider = Arc::new(SlowProvider {
            inner: fixed_provider(),
            delay: Duration::from_secs(5),
            calls: AtomicUsize::new(0),
        });
        let service = service(provider).with_fetch_timeout(Duration::from_millis(20));

        let err = service
            .quote(&ConversionRequest::parse("1000", "BRL", "BOB").unwrap())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_rates_keeps_each_outcome() {
        let results = service(Arc::new(fixed_provider()))
            .rates(&[currency("BRL"), currency("EUR"), currency("BOB")])
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0, currency("BRL"));
        assert!(results[0].1.is_ok());
        assert!(results[1].1.is_err());
        assert_eq!(results[2].1.as_ref().unwrap().buy_rate, dec!(7.00));
    }
}
