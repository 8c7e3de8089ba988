use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub cors_origin: String,
    pub seed_grammar_rules: bool,
    pub pagination: PaginationConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone)]
pub struct PaginationConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub is_leader: bool,
    pub enable_statistics_rollup: bool,
}

/// Every setting at its built-in value.
impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or unparsable keys take
    /// their defaults and page sizes are at least 1.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let vars = Vars(lookup);
        Self {
            host: vars.parse("HOST", IpAddr::V4(Ipv4Addr::LOCALHOST)),
            port: vars.parse("PORT", 3000_u16),
            log_level: vars.string("RUST_LOG", "info"),
            enable_file_logs: vars.flag("ENABLE_FILE_LOGS", false),
            log_dir: vars.string("LOG_DIR", "./logs"),
            sled_path: vars.string("SLED_PATH", "./data/japanese-learning.sled"),
            cors_origin: vars.string("CORS_ORIGIN", "http://localhost:5173"),
            seed_grammar_rules: vars.flag("SEED_GRAMMAR_RULES", true),
            pagination: PaginationConfig {
                default_page_size: vars.parse("DEFAULT_PAGE_SIZE", DEFAULT_PAGE_SIZE).max(1),
                max_page_size: vars.parse("MAX_PAGE_SIZE", MAX_PAGE_SIZE).max(1),
            },
            worker: WorkerConfig {
                is_leader: vars.flag("WORKER_LEADER", true),
                enable_statistics_rollup: vars.flag("ENABLE_STATISTICS_ROLLUP", true),
            },
        }
    }
}

struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn string(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T: FromStr>(&self, key: &str, default: T) -> T {
        let Some(raw) = (self.0)(key) else {
            return default;
        };
        raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Unparsable config value, using default");
            default
        })
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        match (self.0)(key).map(|raw| raw.trim().to_ascii_lowercase()) {
            Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
            Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
            _ => default,
        }
    }
}
