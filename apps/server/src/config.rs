use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use onramp_core::settings::RampSettings;

const DEFAULT_RATES_API_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    /// Base URL of the backend serving `/api/exchange-rates`.
    pub rates_api_url: String,
    /// Empty or `*` allows any origin.
    pub cors_allow_origins: Vec<String>,
    pub settings: RampSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8088)),
            rates_api_url: DEFAULT_RATES_API_URL.to_string(),
            cors_allow_origins: vec!["*".to_string()],
            settings: RampSettings::default(),
        }
    }
}

impl Config {
    /// Reads `ONRAMP_*` variables, loading `.env` first when present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Config::default();
        let mut settings = defaults.settings.clone();

        let listen_addr = parse_var("ONRAMP_LISTEN_ADDR", defaults.listen_addr);
        let rates_api_url = std::env::var("ONRAMP_RATES_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(defaults.rates_api_url);
        let cors_allow_origins = std::env::var("ONRAMP_CORS_ALLOW_ORIGINS")
            .map(|raw| split_list(&raw))
            .unwrap_or(defaults.cors_allow_origins);

        settings.fallback_rate = parse_var("ONRAMP_FALLBACK_RATE", settings.fallback_rate);
        settings.fees.onramp_rate = parse_var("ONRAMP_ONRAMP_FEE_RATE", settings.fees.onramp_rate);
        settings.fees.offramp_rate =
            parse_var("ONRAMP_OFFRAMP_FEE_RATE", settings.fees.offramp_rate);
        settings.fees.minimum_fee = parse_var("ONRAMP_MINIMUM_FEE", settings.fees.minimum_fee);

        let refresh_secs = parse_var(
            "ONRAMP_REFRESH_SECS",
            settings.refresh_interval.as_secs(),
        );
        if refresh_secs > 0 {
            settings.refresh_interval = Duration::from_secs(refresh_secs);
            settings.cache_ttl = settings.refresh_interval;
        } else {
            tracing::warn!("ONRAMP_REFRESH_SECS must be positive, keeping default");
        }

        if let Ok(token) = std::env::var("ONRAMP_DEFAULT_TOKEN") {
            if !token.trim().is_empty() {
                settings.default_token = token;
            }
        }
        if let Ok(raw) = std::env::var("ONRAMP_WATCHED_TOKENS") {
            settings.watched_tokens = split_list(&raw);
        }

        Self {
            listen_addr,
            rates_api_url,
            cors_allow_origins,
            settings,
        }
    }
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Invalid value '{}' for {}, using {}", raw, key, default);
                default
            }
        },
        Err(_) => default,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
