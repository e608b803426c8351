use serde::Deserialize;

use crate::exercise::Exercise;
use crate::judge::ExecutionLimits;
use crate::retry::RetryPolicy;

/// Platform bounds for per-call limits an exercise may request.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ExerciseBounds {
    /// Default: 5.
    #[serde(default = "default_min_time_limit_secs")]
    pub min_time_limit_secs: u32,
    /// Default: 300.
    #[serde(default = "default_max_time_limit_secs")]
    pub max_time_limit_secs: u32,
    /// Default: 16.
    #[serde(default = "default_min_memory_limit_mb")]
    pub min_memory_limit_mb: u32,
    /// Default: 512.
    #[serde(default = "default_max_memory_limit_mb")]
    pub max_memory_limit_mb: u32,
}

fn default_min_time_limit_secs() -> u32 {
    5
}
fn default_max_time_limit_secs() -> u32 {
    300
}
fn default_min_memory_limit_mb() -> u32 {
    16
}
fn default_max_memory_limit_mb() -> u32 {
    512
}

impl Default for ExerciseBounds {
    fn default() -> Self {
        Self {
            min_time_limit_secs: default_min_time_limit_secs(),
            max_time_limit_secs: default_max_time_limit_secs(),
            min_memory_limit_mb: default_min_memory_limit_mb(),
            max_memory_limit_mb: default_max_memory_limit_mb(),
        }
    }
}

/// How the engine talks to the judge.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct JudgeConfig {
    /// Maximum judge calls in flight per run. Default: 4.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Used when an exercise sets no time limit. Default: 10.
    #[serde(default = "default_time_limit_secs")]
    pub default_time_limit_secs: u32,
    /// Used when an exercise sets no memory limit. Default: 256.
    #[serde(default = "default_memory_limit_mb")]
    pub default_memory_limit_mb: u32,
    /// Extra wall-clock allowance on top of the time limit before a call is abandoned. Default: 500.
    #[serde(default = "default_timeout_grace_ms")]
    pub timeout_grace_ms: u64,
    /// Retries for internal judge errors. Default: 1.
    #[serde(default = "default_max_internal_retries")]
    pub max_internal_retries: u8,
    /// Default: 100.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Default: 2000.
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

fn default_max_concurrency() -> usize {
    4
}
fn default_time_limit_secs() -> u32 {
    10
}
fn default_memory_limit_mb() -> u32 {
    256
}
fn default_timeout_grace_ms() -> u64 {
    500
}
fn default_max_internal_retries() -> u8 {
    1
}
fn default_retry_base_delay_ms() -> u64 {
    100
}
fn default_retry_max_delay_ms() -> u64 {
    2000
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            default_time_limit_secs: default_time_limit_secs(),
            default_memory_limit_mb: default_memory_limit_mb(),
            timeout_grace_ms: default_timeout_grace_ms(),
            max_internal_retries: default_max_internal_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl JudgeConfig {
    /// Per-call limits for an exercise, falling back to the configured defaults.
    pub fn limits_for(&self, exercise: &Exercise) -> ExecutionLimits {
        ExecutionLimits {
            time_limit_secs: exercise
                .time_limit_secs
                .unwrap_or(self.default_time_limit_secs),
            memory_limit_mb: exercise
                .memory_limit_mb
                .unwrap_or(self.default_memory_limit_mb),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_internal_retries,
            base_delay_ms: self.retry_base_delay_ms,
            max_delay_ms: self.retry_max_delay_ms,
        }
    }
}
