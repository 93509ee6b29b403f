//! In-memory exchange rate cache with request coalescing.
//!
//! The cache is an ordinary owned value: the application builds one at
//! startup, shares it through `Arc`, and drops it at shutdown. There is no
//! process-wide instance.
//!
//! Concurrent lookups for the same token share a single in-flight fetch.
//! Failed fetches never evict a cached entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt, Shared};
use tokio::time::Instant;

use crate::fetch::{fetch_exchange_rate, fetch_exchange_rates};
use crate::models::{normalize_token, ExchangeRate};
use crate::source::RateSource;

/// Default time a fetched rate is served without refetching (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

type InFlightFetch = Shared<BoxFuture<'static, Option<ExchangeRate>>>;

#[derive(Debug, Clone)]
struct CachedRate {
    rate: ExchangeRate,
    fetched_at: Instant,
}

#[derive(Default)]
struct CacheState {
    entries: Mutex<HashMap<String, CachedRate>>,
    in_flight: Mutex<HashMap<String, InFlightFetch>>,
}

/// Recover from a poisoned mutex; a half-written cache map is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        log::warn!("Rate cache mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

impl CacheState {
    fn store(&self, rate: ExchangeRate) {
        lock(&self.entries).insert(
            rate.token.clone(),
            CachedRate {
                rate,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Stores before clearing the in-flight slot, so a concurrent lookup
    /// always sees one or the other.
    fn finish(&self, token: &str, result: Option<&ExchangeRate>) {
        if let Some(rate) = result {
            self.store(rate.clone());
        }
        lock(&self.in_flight).remove(token);
    }
}

/// Exchange rate cache keyed by normalized token symbol.
pub struct RateCache {
    source: Arc<dyn RateSource>,
    ttl: Duration,
    state: Arc<CacheState>,
}

impl RateCache {
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self::with_ttl(source, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(source: Arc<dyn RateSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            state: Arc::new(CacheState::default()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn source_id(&self) -> &'static str {
        self.source.id()
    }

    fn fresh(&self, token: &str) -> Option<ExchangeRate> {
        let entries = lock(&self.state.entries);
        entries
            .get(token)
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.rate.clone())
    }

    /// Joins the in-flight fetch for `token` or starts one.
    ///
    /// With `reuse_fresh`, a fresh entry stored by a fetch that finished after
    /// the caller's own cache check is returned instead of fetching again.
    fn fetch_coalesced(&self, token: String, reuse_fresh: bool) -> InFlightFetch {
        let mut in_flight = lock(&self.state.in_flight);
        if let Some(existing) = in_flight.get(&token) {
            log::debug!("Joining in-flight rate fetch for {}", token);
            return existing.clone();
        }
        if reuse_fresh {
            if let Some(rate) = self.fresh(&token) {
                return future::ready(Some(rate)).boxed().shared();
            }
        }

        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let key = token.clone();
        let fetch = async move {
            let result = fetch_exchange_rate(source.as_ref(), &key).await;
            state.finish(&key, result.as_ref());
            result
        }
        .boxed()
        .shared();

        in_flight.insert(token, fetch.clone());
        fetch
    }

    /// Returns a cached rate younger than the TTL, fetching otherwise.
    ///
    /// `None` means the rate is unavailable; callers fall back.
    pub async fn get(&self, token: &str) -> Option<ExchangeRate> {
        let token = normalize_token(token);
        if let Some(rate) = self.fresh(&token) {
            log::debug!("Rate cache hit for {}", token);
            return Some(rate);
        }
        self.fetch_coalesced(token, true).await
    }

    /// Fetches `token` regardless of the cached entry's age.
    pub async fn refresh(&self, token: &str) -> Option<ExchangeRate> {
        self.fetch_coalesced(normalize_token(token), false).await
    }

    /// Looks up several tokens: fresh entries come from the cache, the rest
    /// are fetched in one batch. Results keep the request order and skip
    /// tokens that could not be resolved.
    pub async fn get_many(&self, tokens: &[String]) -> Vec<ExchangeRate> {
        let mut requested: Vec<String> = Vec::with_capacity(tokens.len());
        for token in tokens.iter().map(|t| normalize_token(t)) {
            if !token.is_empty() && !requested.contains(&token) {
                requested.push(token);
            }
        }

        let mut found: HashMap<String, ExchangeRate> = HashMap::new();
        let mut missing: Vec<String> = Vec::new();
        for token in &requested {
            match self.fresh(token) {
                Some(rate) => {
                    found.insert(token.clone(), rate);
                }
                None => missing.push(token.clone()),
            }
        }

        match missing.len() {
            0 => {}
            1 => {
                if let Some(rate) = self.fetch_coalesced(missing[0].clone(), true).await {
                    found.insert(rate.token.clone(), rate);
                }
            }
            _ => {
                for rate in fetch_exchange_rates(self.source.as_ref(), &missing).await {
                    if missing.contains(&rate.token) {
                        self.state.store(rate.clone());
                        found.insert(rate.token.clone(), rate);
                    }
                }
            }
        }

        requested
            .into_iter()
            .filter_map(|token| found.remove(&token))
            .collect()
    }

    /// The cached entry for `token`, however old, without fetching.
    pub fn peek(&self, token: &str) -> Option<ExchangeRate> {
        lock(&self.state.entries)
            .get(&normalize_token(token))
            .map(|cached| cached.rate.clone())
    }

    pub fn invalidate(&self, token: &str) {
        lock(&self.state.entries).remove(&normalize_token(token));
    }

    pub fn clear(&self) {
        lock(&self.state.entries).clear();
    }

    pub fn len(&self) -> usize {
        lock(&self.state.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
