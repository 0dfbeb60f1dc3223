use crate::core::{CurrencyCode, RateSource, RateTable};
use crate::utils::error::{FxError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

type Slot = Arc<OnceCell<Arc<RateTable>>>;

/// Memoizes one rate table per base currency.
///
/// Each base gets a slot that is filled at most once. Callers racing on an
/// empty slot wait on the same fetch; a failed fetch leaves the slot empty so
/// the next caller tries again. Tables are never evicted or refreshed.
pub struct RateStore<S: RateSource> {
    source: S,
    cache: Mutex<HashMap<CurrencyCode, Slot>>,
}

impl<S: RateSource> RateStore<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_rates(&self, base: &CurrencyCode) -> Result<Arc<RateTable>> {
        let slot = {
            let mut cache = self.cache.lock().await;
            cache.entry(base.clone()).or_default().clone()
        };

        if let Some(table) = slot.get() {
            tracing::debug!(base = %base, "Rate cache hit");
            return Ok(table.clone());
        }

        let fetched = slot
            .get_or_try_init(|| async {
                tracing::info!(base = %base, "📡 Fetching rate table");
                let table = self.source.fetch_rates(base).await?;
                tracing::debug!(base = %base, rates = table.len(), "Rate table stored");
                Ok::<_, FxError>(Arc::new(table))
            })
            .await
            .cloned();

        match fetched {
            Ok(table) => Ok(table),
            Err(e) => {
                tracing::warn!(base = %base, error = %e, "Rate fetch failed");
                self.release_empty_slot(base, &slot).await;
                Err(e)
            }
        }
    }

    /// Drops a slot left empty by a failed fetch, unless another caller is
    /// still waiting on it.
    async fn release_empty_slot(&self, base: &CurrencyCode, slot: &Slot) {
        let mut cache = self.cache.lock().await;
        let unused = cache.get(base).is_some_and(|current| {
            Arc::ptr_eq(current, slot) && !current.initialized() && Arc::strong_count(current) <= 2
        });
        if unused {
            cache.remove(base);
        }
    }

    pub async fn is_cached(&self, base: &CurrencyCode) -> bool {
        let cache = self.cache.lock().await;
        cache.get(base).is_some_and(|slot| slot.initialized())
    }

    /// Bases with a stored table, sorted.
    pub async fn cached_bases(&self) -> Vec<CurrencyCode> {
        let cache = self.cache.lock().await;
        let mut bases: Vec<CurrencyCode> = cache
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(code, _)| code.clone())
            .collect();
        bases.sort();
        bases
    }

    pub async fn len(&self) -> usize {
        let cache = self.cache.lock().await;
        cache.values().filter(|slot| slot.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Fake rate source that counts calls and can fail a fixed number of times.
    pub(crate) struct FakeRateSource {
        tables: HashMap<String, Vec<(&'static str, f64)>>,
        calls: Arc<AtomicUsize>,
        failures_left: AtomicUsize,
        delay: Duration,
    }

    impl FakeRateSource {
        pub(crate) fn new() -> Self {
            let mut tables = HashMap::new();
            tables.insert("USD".to_string(), vec![("EUR", 0.9123), ("GBP", 0.81), ("USD", 1.0)]);
            tables.insert("EUR".to_string(), vec![("USD", 1.0961), ("GBP", 0.8879), ("EUR", 1.0)]);
            Self {
                tables,
                calls: Arc::new(AtomicUsize::new(0)),
                failures_left: AtomicUsize::new(0),
                delay: Duration::ZERO,
            }
        }

        pub(crate) fn failing(self, times: usize) -> Self {
            self.failures_left.store(times, Ordering::SeqCst);
            self
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub(crate) fn with_table(mut self, base: &str, rates: Vec<(&'static str, f64)>) -> Self {
            self.tables.insert(base.to_string(), rates);
            self
        }

        pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
            self.calls.clone()
        }
    }

    #[async_trait]
    impl RateSource for FakeRateSource {
        async fn fetch_rates(&self, base: &CurrencyCode) -> Result<RateTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let failing = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(FxError::fetch("HTTP error! status: 503"));
            }

            let rates = self
                .tables
                .get(base.as_str())
                .ok_or_else(|| FxError::fetch(format!("no table for {}", base)))?
                .iter()
                .map(|(code, rate)| (CurrencyCode::new(code).unwrap(), *rate))
                .collect();
            RateTable::new(base.clone(), rates)
        }
    }

    fn code(s: &str) -> CurrencyCode {
        CurrencyCode::new(s).unwrap()
    }

    #[tokio::test]
    async fn test_cache_hit_returns_same_table_without_fetch() {
        let source = FakeRateSource::new();
        let calls = source.calls();
        let store = RateStore::new(source);

        let first = store.get_rates(&code("USD")).await.unwrap();
        let second = store.get_rates(&code("USD")).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert!(store.is_cached(&code("USD")).await);
    }

    #[tokio::test]
    async fn test_distinct_bases_fetch_once_each() {
        let source = FakeRateSource::new();
        let calls = source.calls();
        let store = RateStore::new(source);

        store.get_rates(&code("USD")).await.unwrap();
        store.get_rates(&code("EUR")).await.unwrap();
        store.get_rates(&code("USD")).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.cached_bases().await, vec![code("EUR"), code("USD")]);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_misses_share_one_fetch() {
        let source = FakeRateSource::new().with_delay(Duration::from_millis(50));
        let calls = source.calls();
        let store = RateStore::new(source);
        let usd = code("USD");

        let (a, b) = tokio::join!(store.get_rates(&usd), store.get_rates(&usd));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached_and_retried() {
        let source = FakeRateSource::new().failing(1);
        let calls = source.calls();
        let store = RateStore::new(source);

        let err = store.get_rates(&code("USD")).await.unwrap_err();
        assert!(matches!(err, FxError::FetchError { .. }));
        assert!(!store.is_cached(&code("USD")).await);
        assert!(store.is_empty().await);
        assert!(store.cache.lock().await.is_empty());

        let table = store.get_rates(&code("USD")).await.unwrap();
        assert_eq!(table.rate(&code("EUR")), Some(0.9123));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_bases_leave_no_slots_behind() {
        let store = RateStore::new(FakeRateSource::new());

        for base in ["AAA", "BBB", "CCC"] {
            assert!(store.get_rates(&code(base)).await.is_err());
        }
        store.get_rates(&code("USD")).await.unwrap();

        let cache = store.cache.lock().await;
        assert_eq!(cache.len(), 1);
        assert!(cache.contains_key(&code("USD")));
    }
}
