use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::{ExerciseBounds, JudgeConfig};

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// `tracing` filter directive. Default: "info".
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory of the filesystem store. Default: "./data".
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "./data".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Grader application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct GraderAppConfig {
    #[serde(default)]
    pub limits: ExerciseBounds,
    #[serde(default)]
    pub judge: JudgeConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl GraderAppConfig {
    /// Load from `GRADER_CONFIG` (default `config/config`) and `GRADER__*` env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("GRADER_CONFIG").unwrap_or_else(|_| "config/config".to_string());
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("limits.min_time_limit_secs", 5_i64)?
            .set_default("limits.max_time_limit_secs", 300_i64)?
            .set_default("limits.min_memory_limit_mb", 16_i64)?
            .set_default("limits.max_memory_limit_mb", 512_i64)?
            .set_default("judge.max_concurrency", 4_i64)?
            .set_default("judge.default_time_limit_secs", 10_i64)?
            .set_default("judge.default_memory_limit_mb", 256_i64)?
            .set_default("judge.timeout_grace_ms", 500_i64)?
            .set_default("log.level", "info")?
            .set_default("storage.data_dir", "./data")?
            .add_source(File::with_name(config_path).required(false))
            // e.g. GRADER__JUDGE__MAX_CONCURRENCY=8
            .add_source(Environment::with_prefix("GRADER").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
