use crate::core::cache::Cache;
use crate::core::currency::Currency;
use crate::core::error::QuoteResult;
use crate::core::rate::{Rate, RateProvider};
use crate::store::MemoryCache;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Reuses fetched rates for `ttl`. Failures are never cached.
pub struct CachingRateProvider<T: RateProvider> {
    inner: T,
    cache: Arc<dyn Cache<Currency, Rate>>,
    ttl: Duration,
}

impl<T: RateProvider> CachingRateProvider<T> {
    pub fn new(inner: T, ttl: Duration) -> Self {
        Self::with_cache(inner, Arc::new(MemoryCache::<Currency, Rate>::new()), ttl)
    }

    pub fn with_cache(inner: T, cache: Arc<dyn Cache<Currency, Rate>>, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }

    /// Drops every cached rate so the next lookup goes to the inner provider.
    pub async fn invalidate(&self) {
        self.cache.clear().await;
    }
}

#[async_trait]
impl<T: RateProvider> RateProvider for CachingRateProvider<T> {
    async fn fetch_rate(&self, currency: &Currency) -> QuoteResult<Rate> {
        if let Some(rate) = self.cache.get(currency).await {
            debug!("Cache hit for rate: {}", currency);
            return Ok(rate);
        }
        debug!("Cache miss for rate: {}", currency);
        let rate = self.inner.fetch_rate(currency).await?;
        self.cache
            .put(currency.clone(), rate.clone(), Some(self.ttl))
            .await;
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ConversionError;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockInnerProvider {
        call_count: AtomicUsize,
    }

    impl MockInnerProvider {
        fn new() -> Self {
            Self {
                call_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl<'a> RateProvider for &'a MockInnerProvider {
        async fn fetch_rate(&self, currency: &Currency) -> QuoteResult<Rate> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            if currency.code() == "BRL" {
                Rate::new(currency.clone(), dec!(5.4), dec!(5.3), Utc::now())
            } else {
                Err(ConversionError::rate_unavailable(currency.code(), "unknown"))
            }
        }
    }

    #[tokio::test]
    async fn test_caching_rate_provider() {
        let inner_provider = MockInnerProvider::new();
        let caching_provider =
            CachingRateProvider::new(&inner_provider, Duration::from_secs(60));
        let brl = Currency::new("BRL").unwrap();
        let bob = Currency::new("BOB").unwrap();

        // First call - should hit inner provider
        let rate = caching_provider.fetch_rate(&brl).await.unwrap();
        assert_eq!(rate.sell_rate, dec!(5.4));
        assert_eq!(inner_provider.call_count.load(Ordering::SeqCst), 1);

        // Second call - should be cached
        caching_provider.fetch_rate(&brl).await.unwrap();
        assert_eq!(inner_provider.call_count.load(Ordering::SeqCst), 1);

        // Failures are retried on every call
        assert!(caching_provider.fetch_rate(&bob).await.is_err());
        assert!(caching_provider.fetch_rate(&bob).await.is_err());
        assert_eq!(inner_provider.call_count.load(Ordering::SeqCst), 3);

        caching_provider.invalidate().await;
        caching_provider.fetch_rate(&brl).await.unwrap();
        assert_eq!(inner_provider.call_count.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_cached_rate_expires() {
        let inner_provider = MockInnerProvider::new();
        let caching_provider =
            CachingRateProvider::new(&inner_provider, Duration::from_millis(10));
        let brl = Currency::new("BRL").unwrap();

        caching_provider.fetch_rate(&brl).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        caching_provider.fetch_rate(&brl).await.unwrap();
        assert_eq!(inner_provider.call_count.load(Ordering::SeqCst), 2);
    }
}
