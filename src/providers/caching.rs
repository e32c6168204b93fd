use crate::core::cache::{CacheLookup, KeyValueCollection};
use crate::core::currency::{
    AvailableCurrency, ConversionRequest, CurrencyPreferences, CurrencyService, ExchangeRate,
    RateTable, RemoteConversion, normalize_code,
};
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const PREFERENCES_KEY: &str = "preferences";

fn rates_key(base: &str) -> String {
    format!("rates:{}", normalize_code(base))
}

async fn store_value<T: Serialize>(
    cache: &dyn KeyValueCollection,
    key: &str,
    value: &T,
    ttl: Duration,
) {
    match serde_json::to_vec(value) {
        Ok(bytes) => cache.put(key.as_bytes(), &bytes, Some(ttl)).await,
        Err(e) => debug!("Failed to serialize cache value for {}: {}", key, e),
    }
}

/// Caches preferences and exchange rates in front of a [`CurrencyService`].
///
/// Expired entries are served immediately while one background refresh per
/// key brings them up to date.
pub struct CachingCurrencyService<S: CurrencyService + 'static> {
    inner: Arc<S>,
    cache: Arc<dyn KeyValueCollection>,
    preferences_ttl: Duration,
    rates_ttl: Duration,
    refreshing: Arc<Mutex<HashSet<String>>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: CurrencyService + 'static> CachingCurrencyService<S> {
    pub fn new(
        inner: S,
        cache: Arc<dyn KeyValueCollection>,
        preferences_ttl: Duration,
        rates_ttl: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(inner),
            cache,
            preferences_ttl,
            rates_ttl,
            refreshing: Arc::new(Mutex::new(HashSet::new())),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Rates for `base` as a lookup table.
    pub async fn rate_table(&self, base: &str) -> Result<RateTable> {
        let rates = self.get_rates(base).await?;
        Ok(RateTable::from_rates(base, &rates))
    }

    /// Waits for background refreshes started so far.
    pub async fn settle(&self) {
        let handles: Vec<_> = match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => return,
        };
        for handle in handles {
            if let Err(e) = handle.await {
                debug!("Background refresh task failed: {}", e);
            }
        }
    }

    async fn cached<T, F, Fut>(&self, key: String, ttl: Duration, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync + 'static,
        F: FnOnce(Arc<S>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        match self.cache.lookup(key.as_bytes()).await {
            CacheLookup::Fresh(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => return Ok(value),
                Err(e) => debug!("Discarding unreadable cache entry {}: {}", key, e),
            },
            CacheLookup::Stale(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => {
                    self.spawn_refresh(key, ttl, fetch);
                    return Ok(value);
                }
                Err(e) => debug!("Discarding unreadable cache entry {}: {}", key, e),
            },
            CacheLookup::Miss => {}
        }

        let value = fetch(Arc::clone(&self.inner)).await?;
        store_value(self.cache.as_ref(), &key, &value, ttl).await;
        Ok(value)
    }

    fn spawn_refresh<T, F, Fut>(&self, key: String, ttl: Duration, fetch: F)
    where
        T: Serialize + Send + Sync + 'static,
        F: FnOnce(Arc<S>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        {
            let Ok(mut refreshing) = self.refreshing.lock() else {
                return;
            };
            if !refreshing.insert(key.clone()) {
                debug!("Refresh already in flight for {}", key);
                return;
            }
        }

        debug!("Serving stale {} while refreshing", key);
        let inner = Arc::clone(&self.inner);
        let cache = Arc::clone(&self.cache);
        let refreshing = Arc::clone(&self.refreshing);
        let handle = tokio::spawn(async move {
            match fetch(inner).await {
                Ok(value) => store_value(cache.as_ref(), &key, &value, ttl).await,
                Err(e) => warn!("Background refresh of {} failed: {}", key, e),
            }
            if let Ok(mut refreshing) = refreshing.lock() {
                refreshing.remove(&key);
            }
        });

        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }
    }
}

#[async_trait]
impl<S: CurrencyService + 'static> CurrencyService for CachingCurrencyService<S> {
    async fn get_preferences(&self) -> Result<CurrencyPreferences> {
        self.cached(
            PREFERENCES_KEY.to_string(),
            self.preferences_ttl,
            |inner| async move { inner.get_preferences().await },
        )
        .await
    }

    async fn update_preferences(
        &self,
        prefs: &CurrencyPreferences,
    ) -> Result<CurrencyPreferences> {
        let updated = self.inner.update_preferences(prefs).await?;
        store_value(
            self.cache.as_ref(),
            PREFERENCES_KEY,
            &updated,
            self.preferences_ttl,
        )
        .await;
        Ok(updated)
    }

    async fn get_rates(&self, base: &str) -> Result<Vec<ExchangeRate>> {
        let base = normalize_code(base);
        self.cached(rates_key(&base), self.rates_ttl, move |inner| async move {
            inner.get_rates(&base).await
        })
        .await
    }

    async fn convert_remote(&self, request: &ConversionRequest) -> Result<RemoteConversion> {
        self.inner.convert_remote(request).await
    }

    async fn available_currencies(&self) -> Result<Vec<AvailableCurrency>> {
        self.inner.available_currencies().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryCollection;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use tokio::time::sleep;

    struct MockCurrencyService {
        preference_calls: AtomicUsize,
        rate_calls: AtomicUsize,
        fail: AtomicBool,
        eur_rate: Mutex<f64>,
        default_currency: Mutex<String>,
        hold_rates: AtomicBool,
        release_rates: Notify,
    }

    impl MockCurrencyService {
        fn new() -> Self {
            Self {
                preference_calls: AtomicUsize::new(0),
                rate_calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                eur_rate: Mutex::new(0.9),
                default_currency: Mutex::new("EUR".to_string()),
                hold_rates: AtomicBool::new(false),
                release_rates: Notify::new(),
            }
        }

        fn set_eur_rate(&self, rate: f64) {
            *self.eur_rate.lock().unwrap() = rate;
        }
    }

    #[async_trait]
    impl CurrencyService for MockCurrencyService {
        async fn get_preferences(&self) -> Result<CurrencyPreferences> {
            self.preference_calls.fetch_add(1, Ordering::SeqCst);
            Ok(CurrencyPreferences {
                default_currency: self.default_currency.lock().unwrap().clone(),
                display_secondary: false,
                secondary_currency: "USD".to_string(),
            })
        }

        async fn update_preferences(
            &self,
            prefs: &CurrencyPreferences,
        ) -> Result<CurrencyPreferences> {
            Ok(prefs.clone())
        }

        async fn get_rates(&self, base: &str) -> Result<Vec<ExchangeRate>> {
            self.rate_calls.fetch_add(1, Ordering::SeqCst);
            if self.hold_rates.load(Ordering::SeqCst) {
                self.release_rates.notified().await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(anyhow!("rates unavailable for {}", base));
            }
            Ok(vec![ExchangeRate {
                to_currency: "EUR".to_string(),
                rate: *self.eur_rate.lock().unwrap(),
                valid_from: None,
                source: "mock".to_string(),
            }])
        }

        async fn convert_remote(&self, _request: &ConversionRequest) -> Result<RemoteConversion> {
            Err(anyhow!("not used"))
        }

        async fn available_currencies(&self) -> Result<Vec<AvailableCurrency>> {
            Ok(Vec::new())
        }
    }

    fn service(ttl: Duration) -> CachingCurrencyService<MockCurrencyService> {
        CachingCurrencyService::new(
            MockCurrencyService::new(),
            Arc::new(MemoryCollection::new()),
            ttl,
            ttl,
        )
    }

    #[tokio::test]
    async fn test_fresh_values_are_served_from_cache() {
        let service = service(Duration::from_secs(60));

        let first = service.get_preferences().await.unwrap();
        let second = service.get_preferences().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(service.inner().preference_calls.load(Ordering::SeqCst), 1);

        service.get_rates("USD").await.unwrap();
        service.get_rates("usd").await.unwrap();
        assert_eq!(service.inner().rate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_value_served_while_refreshing() {
        let service = service(Duration::from_millis(10));

        let table = service.rate_table("USD").await.unwrap();
        assert_eq!(table.get("EUR"), Some(0.9));

        service.inner().set_eur_rate(0.8);
        sleep(Duration::from_millis(20)).await;

        // Stale read returns the old value and triggers a refresh
        let table = service.rate_table("USD").await.unwrap();
        assert_eq!(table.get("EUR"), Some(0.9));
        service.settle().await;
        assert_eq!(service.inner().rate_calls.load(Ordering::SeqCst), 2);

        // Refreshed value is now cached
        let table = service.rate_table("USD").await.unwrap();
        assert_eq!(table.get("EUR"), Some(0.8));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_value() {
        let service = service(Duration::from_millis(10));
        service.get_rates("USD").await.unwrap();

        service.inner().fail.store(true, Ordering::SeqCst);
        sleep(Duration::from_millis(20)).await;

        let rates = service.get_rates("USD").await.unwrap();
        assert_eq!(rates[0].rate, 0.9);
        service.settle().await;

        let rates = service.get_rates("USD").await.unwrap();
        assert_eq!(rates[0].rate, 0.9);
    }

    #[tokio::test]
    async fn test_miss_propagates_fetch_error() {
        let service = service(Duration::from_secs(60));
        service.inner().fail.store(true, Ordering::SeqCst);

        let result = service.get_rates("USD").await;
        assert_eq!(result.unwrap_err().to_string(), "rates unavailable for USD");
    }

    #[tokio::test]
    async fn test_update_preferences_writes_through() {
        let service = service(Duration::from_secs(60));
        service.get_preferences().await.unwrap();

        let prefs = CurrencyPreferences {
            default_currency: "JPY".to_string(),
            display_secondary: true,
            secondary_currency: "USD".to_string(),
        };
        service.update_preferences(&prefs).await.unwrap();

        assert_eq!(service.get_preferences().await.unwrap(), prefs);
        assert_eq!(service.inner().preference_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_stale_reads_share_one_refresh() {
        let service = service(Duration::from_millis(10));
        service.get_rates("USD").await.unwrap();

        service.inner().set_eur_rate(0.7);
        service.inner().hold_rates.store(true, Ordering::SeqCst);
        sleep(Duration::from_millis(20)).await;

        // The first refresh is held open while a second stale read arrives
        let (first, second) = tokio::join!(service.get_rates("USD"), service.get_rates("usd"));
        assert_eq!(first.unwrap()[0].rate, 0.9);
        assert_eq!(second.unwrap()[0].rate, 0.9);

        service.inner().release_rates.notify_one();
        service.settle().await;
        assert_eq!(service.inner().rate_calls.load(Ordering::SeqCst), 2);

        service.inner().hold_rates.store(false, Ordering::SeqCst);
        let rates = service.get_rates("USD").await.unwrap();
        assert_eq!(rates[0].rate, 0.7);
    }

    #[tokio::test]
    async fn test_stale_preferences_are_refreshed() {
        let service = service(Duration::from_millis(10));
        assert_eq!(service.get_preferences().await.unwrap().default_currency, "EUR");

        *service.inner().default_currency.lock().unwrap() = "GBP".to_string();
        sleep(Duration::from_millis(20)).await;

        let stale = service.get_preferences().await.unwrap();
        assert_eq!(stale.default_currency, "EUR");
        service.settle().await;
        assert_eq!(service.inner().preference_calls.load(Ordering::SeqCst), 2);

        let refreshed = service.get_preferences().await.unwrap();
        assert_eq!(refreshed.default_currency, "GBP");
    }
}
