use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BRAVE_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config::from_lookup(|key| env::var(key).ok())
});

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Prefix for download links. When unset the request's Host header is used.
    pub public_base_url: Option<String>,
    pub brave_search_url: String,
    /// `None` means outbound calls never time out.
    pub upstream_timeout: Option<Duration>,
    pub image_fetch_timeout: Option<Duration>,
    pub max_image_bytes: usize,
    pub output_dir: PathBuf,
    /// `None` means generated files never expire.
    pub file_ttl: Option<Duration>,
    pub sweep_interval: Duration,
    /// Empty allows any retrieval endpoint host.
    pub rag_allowed_hosts: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config::from_lookup(|_| None)
    }
}

impl Config {
    /// Builds a config from an arbitrary key lookup. `CONFIG` passes the
    /// process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Config {
            host: get_or_default(&get, "HOST", "0.0.0.0".to_string()),
            port: get_parsed_or_default(&get, "PORT", 5000),
            public_base_url: get("PUBLIC_BASE_URL").map(|url| url.trim_end_matches('/').to_string()),
            brave_search_url: get_or_default(&get, "BRAVE_SEARCH_URL", DEFAULT_BRAVE_SEARCH_URL.to_string()),
            upstream_timeout: optional_secs(get_parsed_or_default(&get, "UPSTREAM_TIMEOUT_SECS", 30)),
            image_fetch_timeout: optional_secs(get_parsed_or_default(&get, "IMAGE_FETCH_TIMEOUT_SECS", 20)),
            max_image_bytes: get_parsed_or_default(&get, "MAX_IMAGE_BYTES", 10 * 1024 * 1024),
            output_dir: get("OUTPUT_DIR").map(PathBuf::from).unwrap_or_else(env::temp_dir),
            file_ttl: optional_secs(get_parsed_or_default(&get, "GENERATED_FILE_TTL_SECS", 3600)),
            sweep_interval: Duration::from_secs(
                get_parsed_or_default(&get, "FILE_SWEEP_INTERVAL_SECS", 300u64).max(1),
            ),
            rag_allowed_hosts: get("RAG_ALLOWED_HOSTS")
                .map(|hosts| {
                    hosts
                        .split(',')
                        .map(|h| h.trim().to_ascii_lowercase())
                        .filter(|h| !h.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn get_or_default<G>(get: &G, key: &str, default: String) -> String
where
    G: Fn(&str) -> Option<String>,
{
    get(key).unwrap_or(default)
}

fn get_parsed_or_default<G, T>(get: &G, key: &str, default: T) -> T
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("ignoring unparsable value for {key}: {raw}");
            default
        }),
        None => default,
    }
}

fn optional_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
