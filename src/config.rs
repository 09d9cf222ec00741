use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_upstream_addr")]
    pub upstream_addr: String,
    #[serde(default = "default_pending_timeout_ms")]
    pub pending_timeout_ms: u64,
    #[serde(default = "default_sweeper_interval_ms")]
    pub sweeper_interval_ms: u64,
    #[serde(default = "default_cache_max_cost")]
    pub cache_max_cost: u64,
    #[serde(default = "default_cache_counters")]
    pub cache_counters: u64,
    #[serde(default = "default_metrics_addr")]
    pub metrics_addr: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:53".to_string()
}
fn default_upstream_addr() -> String {
    "9.9.9.9:53".to_string()
}
fn default_pending_timeout_ms() -> u64 {
    250
}
fn default_sweeper_interval_ms() -> u64 {
    200
}
fn default_cache_max_cost() -> u64 {
    1 << 30
}
fn default_cache_counters() -> u64 {
    100_000
}
fn default_metrics_addr() -> String {
    "127.0.0.1:9053".to_string()
}

impl Default for Config {
    fn default() -> Self {
        serde_json::from_str("{}").unwrap()
    }
}

impl Config {
    /// Load from an optional TOML file (a missing file is not an error,
    /// just the all-defaults config), then apply environment overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)?;
            toml::from_str(&text)?
        } else {
            Config::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DNSFWD_LISTEN_ADDR") {
            self.listen_addr = v;
        }
        if let Ok(v) = std::env::var("DNSFWD_UPSTREAM_ADDR") {
            self.upstream_addr = v;
        }
        if let Ok(v) = std::env::var("DNSFWD_METRICS_ADDR") {
            self.metrics_addr = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_empty_document() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:53");
        assert_eq!(config.upstream_addr, "9.9.9.9:53");
        assert_eq!(config.pending_timeout_ms, 250);
        assert_eq!(config.sweeper_interval_ms, 200);
        assert_eq!(config.cache_max_cost, 1 << 30);
        assert_eq!(config.metrics_addr, "127.0.0.1:9053");
    }

    #[test]
    fn partial_document_fills_remaining_defaults() {
        let config: Config = toml::from_str(r#"listen_addr = "127.0.0.1:5353""#).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:5353");
        assert_eq!(config.upstream_addr, "9.9.9.9:53");
    }

    #[test]
    fn missing_file_loads_defaults() {
        let config = Config::load(Path::new("/nonexistent/dnsfwd.toml")).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:53");
    }
}
