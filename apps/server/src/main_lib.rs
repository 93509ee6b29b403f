use std::collections::HashMap;
use std::sync::Arc;

use onramp_core::quotes::{QuoteService, QuoteServiceTrait};
use onramp_rates::{normalize_token, HttpRateSource, RateCache, RateSource, RateSubscription};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

pub struct AppState {
    pub quote_service: Arc<dyn QuoteServiceTrait + Send + Sync>,
    pub rate_cache: Arc<RateCache>,
    /// Background subscriptions for the configured watched tokens, keyed by
    /// normalized symbol. Dropping the state stops them.
    pub subscriptions: HashMap<String, RateSubscription>,
}

impl AppState {
    pub fn subscription(&self, token: &str) -> Option<&RateSubscription> {
        self.subscriptions.get(&normalize_token(token))
    }
}

/// Filter used when `RUST_LOG` is unset. `TraceLayer` logs requests at debug.
const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

pub fn init_tracing() {
    let log_format = std::env::var("ONRAMP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().flatten_event(true).with_current_span(false))
            .init();
    } else {
        registry.with(fmt::layer().compact().with_target(true)).init();
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    tracing::info!("Exchange rate backend: {}", config.rates_api_url);
    let source: Arc<dyn RateSource> = Arc::new(HttpRateSource::new(&config.rates_api_url));
    build_state_with_source(config, source).await
}

/// Builds the state around an arbitrary rate source.
pub async fn build_state_with_source(
    config: &Config,
    source: Arc<dyn RateSource>,
) -> anyhow::Result<Arc<AppState>> {
    let settings = config.settings.clone();
    settings.validate()?;

    let rate_cache = Arc::new(RateCache::with_ttl(source, settings.cache_ttl));
    let quote_service: Arc<dyn QuoteServiceTrait + Send + Sync> =
        Arc::new(QuoteService::new(rate_cache.clone(), settings.clone()));

    let options = settings.subscription_options();
    let mut subscriptions = HashMap::new();
    for token in settings.watched() {
        tracing::info!(
            "Watching {} (refresh every {}s)",
            token,
            options.refresh_interval.as_secs()
        );
        let subscription = RateSubscription::spawn(rate_cache.clone(), &token, options.clone());
        subscriptions.insert(token, subscription);
    }

    Ok(Arc::new(AppState {
        quote_service,
        rate_cache,
        subscriptions,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_log_filter_enables_request_traces() {
        let filter = EnvFilter::try_new(DEFAULT_LOG_FILTER).unwrap();
        assert!(filter.to_string().contains("tower_http=debug"));
    }
}
