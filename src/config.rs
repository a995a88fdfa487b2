use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PLAYERS_API_URL: &str = "https://api.balldontlie.io/v1/players";
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMode {
    Api,
    Demo,
    Auto,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub total_players: u32,
    pub failure_rate: f64,
    pub rate_limit_rate: f64,
    pub latency: Duration,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            total_players: 120,
            failure_rate: 0.0,
            rate_limit_rate: 0.0,
            latency: Duration::from_millis(350),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub source: SourceMode,
    pub api_url: String,
    pub page_size: u32,
    pub http_timeout: Duration,
    pub data_dir: Option<PathBuf>,
    pub scroll_lookahead_rows: u16,
    pub demo: DemoConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            source: SourceMode::Auto,
            api_url: DEFAULT_PLAYERS_API_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            http_timeout: Duration::from_secs(10),
            data_dir: None,
            scroll_lookahead_rows: 3,
            demo: DemoConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't have to touch the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let source = match non_empty("PLAYERS_SOURCE")
            .map(|v| v.to_lowercase())
            .as_deref()
        {
            Some("api") => SourceMode::Api,
            Some("demo") => SourceMode::Demo,
            _ => SourceMode::Auto,
        };
        let page_size = non_empty("PLAYERS_PAGE_SIZE")
            .and_then(|val| val.parse::<u32>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, 100);
        let timeout_secs = non_empty("HTTP_TIMEOUT_SECS")
            .and_then(|val| val.parse::<u64>().ok())
            .unwrap_or(10)
            .max(2);
        let scroll_lookahead_rows = non_empty("ROSTER_SCROLL_LOOKAHEAD_ROWS")
            .and_then(|val| val.parse::<u16>().ok())
            .unwrap_or(defaults.scroll_lookahead_rows);

        let demo = DemoConfig {
            total_players: non_empty("DEMO_TOTAL_PLAYERS")
                .and_then(|val| val.parse::<u32>().ok())
                .unwrap_or(defaults.demo.total_players),
            failure_rate: parse_rate(non_empty("DEMO_FAILURE_RATE")),
            rate_limit_rate: parse_rate(non_empty("DEMO_RATE_LIMIT_RATE")),
            latency: non_empty("DEMO_LATENCY_MS")
                .and_then(|val| val.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.demo.latency),
        };

        Self {
            api_key: non_empty("BALLDONTLIE_API_KEY"),
            source,
            api_url: non_empty("PLAYERS_API_URL").unwrap_or(defaults.api_url),
            page_size,
            http_timeout: Duration::from_secs(timeout_secs),
            data_dir: non_empty("ROSTER_DATA_DIR").map(PathBuf::from),
            scroll_lookahead_rows,
            demo,
        }
    }

    pub fn use_demo_source(&self) -> bool {
        match self.source {
            SourceMode::Demo => true,
            SourceMode::Api => false,
            SourceMode::Auto => self.api_key.is_none(),
        }
    }
}

fn parse_rate(raw: Option<String>) -> f64 {
    raw.and_then(|val| val.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_env_uses_defaults_and_demo_source() {
        let config = config_from(&[]);
        assert_eq!(config, AppConfig::default());
        assert!(config.use_demo_source());
    }

    #[test]
    fn api_key_switches_auto_mode_to_api() {
        let config = config_from(&[("BALLDONTLIE_API_KEY", "secret")]);
        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert!(!config.use_demo_source());

        let forced = config_from(&[("BALLDONTLIE_API_KEY", "secret"), ("PLAYERS_SOURCE", "demo")]);
        assert!(forced.use_demo_source());
    }

    #[test]
    fn numeric_settings_are_clamped() {
        let config = config_from(&[
            ("PLAYERS_PAGE_SIZE", "500"),
            ("HTTP_TIMEOUT_SECS", "0"),
            ("DEMO_FAILURE_RATE", "3.5"),
            ("DEMO_RATE_LIMIT_RATE", "nope"),
        ]);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.http_timeout, Duration::from_secs(2));
        assert_eq!(config.demo.failure_rate, 1.0);
        assert_eq!(config.demo.rate_limit_rate, 0.0);
    }
}
