//! App state: relay, config.

use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use rssrelay_cache::{MemoryStore, MemoryStoreConfig, RedisStore, RedisStoreConfig};
use rssrelay_core::constants::{
    DEFAULT_CACHE_TTL_SECONDS, DEFAULT_FETCH_MAX_BODY_BYTES, DEFAULT_FETCH_MAX_REDIRECTS,
    DEFAULT_FETCH_TIMEOUT_SECONDS, DEFAULT_ITEMS_TO_CACHE_PER_FEED, DEFAULT_ITEM_COUNT,
    DEFAULT_STORE_TIMEOUT_MS,
};
use rssrelay_core::error::{RelayError, Result};
use rssrelay_core::traits::CacheStore;
use rssrelay_feed::XmlFeedNormalizer;
use rssrelay_fetch::{FetchConfig, HttpFetcher};
use rssrelay_service::{FeedRelay, RelayConfig};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Which browser origins may call the API.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CorsPolicy {
    /// No CORS headers are sent
    #[default]
    Disabled,
    /// Any origin
    AllowAll,
    /// Only the listed origins
    AllowList(Vec<String>),
}

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Relay settings
    pub relay: RelayConfig,
    /// Fetcher settings
    pub fetch: FetchConfig,
    /// Redis store; `None` selects the in-memory store
    pub redis: Option<RedisStoreConfig>,
    /// In-memory store settings
    pub memory: MemoryStoreConfig,
    /// When set, requests must carry this value as `key`
    pub api_key: Option<String>,
    /// CORS policy
    pub cors: CorsPolicy,
    /// Listen address
    pub bind: IpAddr,
    /// Listen port
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            relay: RelayConfig::default(),
            fetch: FetchConfig::default(),
            redis: None,
            memory: MemoryStoreConfig::default(),
            api_key: None,
            cors: CorsPolicy::Disabled,
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
        }
    }
}

impl ApiConfig {
    /// Reads the configuration from the environment, loading `.env` first.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from a variable lookup.
    ///
    /// Blank values count as unset. Numbers that do not parse fall back to
    /// their default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup: &dyn Fn(&str) -> Option<String> = &lookup;

        let relay = RelayConfig::new()
            .default_count(parsed(lookup, "DEFAULT_COUNT", DEFAULT_ITEM_COUNT))
            .items_to_cache_per_feed(parsed(
                lookup,
                "NUMBER_OF_ITEMS_TO_CACHE_PER_FEED",
                DEFAULT_ITEMS_TO_CACHE_PER_FEED,
            ))
            .cache_ttl_seconds(parsed(lookup, "CACHE_LIFE", DEFAULT_CACHE_TTL_SECONDS));

        let fetch = FetchConfig::default()
            .with_timeout_seconds(parsed(
                lookup,
                "FETCH_TIMEOUT_SECONDS",
                DEFAULT_FETCH_TIMEOUT_SECONDS,
            ))
            .with_max_redirects(parsed(
                lookup,
                "FETCH_MAX_REDIRECTS",
                DEFAULT_FETCH_MAX_REDIRECTS,
            ))
            .with_max_body_bytes(parsed(
                lookup,
                "FETCH_MAX_BODY_BYTES",
                DEFAULT_FETCH_MAX_BODY_BYTES,
            ));

        let redis = setting(lookup, "REDIS_URL").map(|url| {
            RedisStoreConfig::new(url).with_timeout_ms(parsed(
                lookup,
                "REDIS_TIMEOUT_MS",
                DEFAULT_STORE_TIMEOUT_MS,
            ))
        });

        let allow_all = setting(lookup, "ALLOW_ALL_ORIGINS")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let cors = if allow_all {
            CorsPolicy::AllowAll
        } else {
            match setting(lookup, "ORIGINS") {
                Some(origins) => CorsPolicy::AllowList(
                    origins
                        .split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(String::from)
                        .collect(),
                ),
                None => CorsPolicy::Disabled,
            }
        };

        Self {
            relay,
            fetch,
            redis,
            memory: MemoryStoreConfig::default(),
            api_key: setting(lookup, "API_KEY"),
            cors,
            bind: parsed(lookup, "BIND", IpAddr::V4(Ipv4Addr::UNSPECIFIED)),
            port: parsed(lookup, "PORT", DEFAULT_PORT),
        }
    }

    /// Socket address to listen on.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn setting(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed<T>(lookup: &dyn Fn(&str) -> Option<String>, name: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match setting(lookup, name) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(setting = name, value = %raw, default = %default, "Ignoring unparseable setting");
            default
        }),
    }
}

/// Shared state behind every handler.
pub struct AppState {
    /// Configuration the server was started with
    pub config: ApiConfig,
    /// The relay
    pub relay: FeedRelay,
    started_at: Instant,
}

impl AppState {
    /// Wires the store, fetcher and normalizer named by `config`.
    ///
    /// Fails if Redis is configured but cannot be reached.
    pub async fn from_config(config: ApiConfig) -> Result<Self> {
        let store: Arc<dyn CacheStore> = match &config.redis {
            Some(redis) => Arc::new(
                RedisStore::connect(redis.clone())
                    .await
                    .map_err(|e| RelayError::Config(format!("cannot connect to Redis: {}", e)))?,
            ),
            None => {
                info!("REDIS_URL not set, using in-memory store");
                Arc::new(MemoryStore::with_config(config.memory.clone()))
            }
        };

        let fetcher = Arc::new(HttpFetcher::with_config(config.fetch.clone())?);
        let relay = FeedRelay::new(
            store,
            fetcher,
            Arc::new(XmlFeedNormalizer::new()),
            config.relay.clone(),
        );

        Ok(Self::with_relay(config, relay))
    }

    /// Creates state around an already built relay.
    pub fn with_relay(config: ApiConfig, relay: FeedRelay) -> Self {
        Self {
            config,
            relay,
            started_at: Instant::now(),
        }
    }

    /// Seconds since the state was created.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ApiConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.relay, RelayConfig::default());
        assert_eq!(config.fetch.timeout_seconds, DEFAULT_FETCH_TIMEOUT_SECONDS);
        assert_eq!(config.fetch.max_body_bytes, DEFAULT_FETCH_MAX_BODY_BYTES);
        assert!(config.redis.is_none());
        assert!(config.api_key.is_none());
        assert_eq!(config.cors, CorsPolicy::Disabled);
        assert_eq!(config.listen_addr(), "0.0.0.0:3000".parse().unwrap());
    }

    #[test]
    fn test_reads_relay_settings() {
        let config = config_from(&[
            ("DEFAULT_COUNT", "10"),
            ("NUMBER_OF_ITEMS_TO_CACHE_PER_FEED", "50"),
            ("CACHE_LIFE", "600"),
            ("FETCH_TIMEOUT_SECONDS", "4"),
            ("FETCH_MAX_REDIRECTS", "0"),
            ("FETCH_MAX_BODY_BYTES", "65536"),
        ]);
        assert_eq!(config.relay.default_count, 10);
        assert_eq!(config.relay.items_to_cache_per_feed, 50);
        assert_eq!(config.relay.cache_ttl_seconds, 600);
        assert_eq!(config.fetch.timeout_seconds, 4);
        assert_eq!(config.fetch.max_redirects, 0);
        assert_eq!(config.fetch.max_body_bytes, 65536);
    }

    #[test]
    fn test_unparseable_number_falls_back() {
        let config = config_from(&[("DEFAULT_COUNT", "lots"), ("PORT", "-1")]);
        assert_eq!(config.relay.default_count, DEFAULT_ITEM_COUNT);
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_redis_settings() {
        let config = config_from(&[
            ("REDIS_URL", "redis://cache:6379/1"),
            ("REDIS_TIMEOUT_MS", "500"),
        ]);
        let redis = config.redis.unwrap();
        assert_eq!(redis.url, "redis://cache:6379/1");
        assert_eq!(redis.timeout_ms, 500);
    }

    #[test]
    fn test_cors_policies() {
        assert_eq!(
            config_from(&[("ALLOW_ALL_ORIGINS", "TRUE"), ("ORIGINS", "https://a")]).cors,
            CorsPolicy::AllowAll
        );
        assert_eq!(
            config_from(&[("ALLOW_ALL_ORIGINS", "no"), ("ORIGINS", "https://a, https://b,")]).cors,
            CorsPolicy::AllowList(vec!["https://a".into(), "https://b".into()])
        );
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        assert!(config_from(&[("API_KEY", "  ")]).api_key.is_none());
        assert_eq!(
            config_from(&[("API_KEY", "s3cret")]).api_key.as_deref(),
            Some("s3cret")
        );
    }
}
