use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::exercise::Language;

/// Resource limits applied to a single judge call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionLimits {
    pub time_limit_secs: u32,
    pub memory_limit_mb: u32,
}

impl ExecutionLimits {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(u64::from(self.time_limit_secs))
    }

    pub fn time_limit_ms(&self) -> u64 {
        u64::from(self.time_limit_secs) * 1000
    }

    pub fn memory_limit_bytes(&self) -> u64 {
        u64::from(self.memory_limit_mb) * 1024 * 1024
    }
}

/// A request to execute code against one test case input.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JudgeRequest {
    /// Request identifier (UUID), useful for correlating judge logs.
    pub request_id: String,
    pub code: String,
    pub language: Language,
    pub test_case_id: String,
    /// Data fed to the program on stdin.
    pub input: String,
    pub limits: ExecutionLimits,
}

impl JudgeRequest {
    pub fn new(
        code: impl Into<String>,
        language: Language,
        test_case_id: impl Into<String>,
        input: impl Into<String>,
        limits: ExecutionLimits,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            code: code.into(),
            language,
            test_case_id: test_case_id.into(),
            input: input.into(),
            limits,
        }
    }
}

/// Raw observations from a successful execution.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub actual_output: String,
    pub execution_time_ms: u64,
    pub memory_usage_bytes: u64,
}

/// Typed failure of a single judge call.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum JudgeFailure {
    #[error("Compile error: {0}")]
    CompileError(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),

    #[error("Time limit exceeded")]
    TimeLimitExceeded,

    #[error("Memory limit exceeded")]
    MemoryLimitExceeded,

    #[error("Internal judge error: {0}")]
    InternalJudgeError(String),
}

impl JudgeFailure {
    /// Machine-readable failure code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::CompileError(_) => "COMPILE_ERROR",
            Self::RuntimeError(_) => "RUNTIME_ERROR",
            Self::TimeLimitExceeded => "TIME_LIMIT_EXCEEDED",
            Self::MemoryLimitExceeded => "MEMORY_LIMIT_EXCEEDED",
            Self::InternalJudgeError(_) => "INTERNAL_JUDGE_ERROR",
        }
    }

    /// Only judge-side faults are worth retrying; the rest describe the code.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InternalJudgeError(_))
    }
}

pub type TestExecutionOutcome = Result<ExecutionReport, JudgeFailure>;

/// External service that executes code against a single test case.
///
/// Implementations may be arbitrarily slow and may fail independently per call.
#[async_trait]
pub trait JudgeClient: Send + Sync {
    /// Build whatever `code` needs before its test cases run, such as a
    /// compiled binary. Called once per evaluation, outside the per-call time
    /// limit. A failure here is reported again by `execute`.
    async fn prepare(&self, _code: &str, _language: Language) -> Result<(), JudgeFailure> {
        Ok(())
    }

    async fn execute(&self, request: JudgeRequest) -> TestExecutionOutcome;
}
