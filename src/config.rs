use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub logging: LoggingConfig,
    pub api: ApiConfig,
    pub intervals: IntervalConfig,
    pub registry: RegistryConfig,
    pub doors: DoorConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub directory: String,
    pub debug_file: String,
    pub info_file: String,
    pub warn_file: String,
    pub error_file: String,
    pub console_level: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IntervalConfig {
    pub status_poll_seconds: u64,
}

impl IntervalConfig {
    pub fn status_poll(&self) -> Duration {
        // a zero period would panic inside tokio::time::interval
        Duration::from_secs(self.status_poll_seconds.max(1))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RegistryConfig {
    /// Substitute the built-in location list when the device list is empty.
    pub use_fallback_locations: bool,
    /// TTL for the cached device list and script catalogue.
    pub device_cache_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DoorConfig {
    pub unlock_duration_seconds: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LimitsConfig {
    pub notification_channel_size: usize,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn example() -> Self {
        Config {
            logging: LoggingConfig {
                directory: "./logs".to_string(),
                debug_file: "log_debug.log".to_string(),
                info_file: "log_info.log".to_string(),
                warn_file: "log_warn.log".to_string(),
                error_file: "log_error.log".to_string(),
                console_level: "info".to_string(),
            },
            api: ApiConfig {
                base_url: "http://localhost:3001/api".to_string(),
                token: "REPLACE_WITH_YOUR_CLUBOS_TOKEN".to_string(),
            },
            intervals: IntervalConfig {
                status_poll_seconds: 30,
            },
            registry: RegistryConfig {
                use_fallback_locations: true,
                device_cache_seconds: 300,
            },
            doors: DoorConfig {
                unlock_duration_seconds: 30,
            },
            limits: LimitsConfig {
                notification_channel_size: 32,
            },
        }
    }

    pub fn save_example(path: impl AsRef<Path>) -> Result<()> {
        let toml_content = toml::to_string_pretty(&Self::example())?;
        fs::write(path, toml_content)?;
        Ok(())
    }
}
