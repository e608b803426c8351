use std::sync::Arc;
use std::time::Duration;

use common::config::JudgeConfig;
use common::judge::TestExecutionOutcome;
use common::retry::RetryPolicy;
use common::{
    ExecutionLimits, ExecutionReport, Exercise, JudgeClient, JudgeFailure, JudgeRequest,
    Language, TestCase, TestResult,
};
use futures::stream;
use futures::{FutureExt, StreamExt};
use tracing::{debug, info, instrument, warn};

/// Runs code against every test case of an exercise through a judge.
///
/// Judge calls are issued concurrently up to `max_concurrency`; a slot is
/// freed as soon as its call finishes, and results come back in test case
/// order regardless of completion order. Every judge failure becomes a
/// failing `TestResult`, so evaluation itself cannot fail.
#[derive(Clone)]
pub struct Evaluator {
    judge: Arc<dyn JudgeClient>,
    config: JudgeConfig,
    retry: RetryPolicy,
}

impl Evaluator {
    pub fn new(judge: Arc<dyn JudgeClient>, config: JudgeConfig) -> Self {
        let retry = config.retry_policy();
        Self {
            judge,
            config,
            retry,
        }
    }

    #[instrument(skip(self, exercise, code), fields(exercise_id = exercise.id, test_cases = exercise.test_cases.len()))]
    pub async fn evaluate(&self, exercise: &Exercise, code: &str) -> Vec<TestResult> {
        let limits = self.config.limits_for(exercise);
        let language = exercise.language;
        let concurrency = self.config.max_concurrency.max(1);

        if let Err(failure) = self.judge.prepare(code, language).await {
            debug!(code = failure.code(), error = %failure, "Judge preparation failed");
        }

        // Per-case futures own their inputs so the evaluation stays `Send`.
        let code: Arc<str> = Arc::from(code);
        let cases: Vec<(usize, TestCase)> =
            exercise.test_cases.iter().cloned().enumerate().collect();

        let mut indexed: Vec<(usize, TestResult)> = stream::iter(cases)
            .map(|(index, test_case)| {
                let evaluator = self.clone();
                let code = Arc::clone(&code);
                async move {
                    let result = evaluator
                        .evaluate_case(language, &code, &test_case, limits)
                        .await;
                    (index, result)
                }
                .boxed()
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;
        indexed.sort_by_key(|(index, _)| *index);
        let results: Vec<TestResult> = indexed.into_iter().map(|(_, result)| result).collect();

        info!(
            passed = results.iter().filter(|r| r.passed).count(),
            total = results.len(),
            "Evaluation completed"
        );
        results
    }

    #[instrument(skip(self, code, test_case), fields(test_case_id = %test_case.id))]
    async fn evaluate_case(
        &self,
        language: Language,
        code: &str,
        test_case: &TestCase,
        limits: ExecutionLimits,
    ) -> TestResult {
        let request = JudgeRequest::new(code, language, &test_case.id, &test_case.input, limits);

        match self.execute_with_retry(request).await {
            Ok(report) => {
                let passed = outputs_match(&report.actual_output, &test_case.expected_output);
                debug!(passed, time_ms = report.execution_time_ms, "Test case evaluated");
                TestResult::from_report(test_case, report, passed)
            }
            Err(failure) => {
                warn!(code = failure.code(), error = %failure, "Judge call failed");
                TestResult::from_failure(test_case, failure)
            }
        }
    }

    async fn execute_with_retry(&self, request: JudgeRequest) -> TestExecutionOutcome {
        let limits = request.limits;
        let wall_timeout = limits.time_limit() + Duration::from_millis(self.config.timeout_grace_ms);
        let mut retries: u8 = 0;

        loop {
            let outcome =
                match tokio::time::timeout(wall_timeout, self.judge.execute(request.clone())).await
                {
                    Ok(outcome) => outcome.and_then(|report| enforce_limits(report, limits)),
                    Err(_) => {
                        warn!(
                            request_id = %request.request_id,
                            timeout_ms = wall_timeout.as_millis() as u64,
                            "Judge call abandoned after wall-clock timeout"
                        );
                        Err(JudgeFailure::TimeLimitExceeded)
                    }
                };

            match outcome {
                Err(failure) if failure.is_retryable() && self.retry.should_retry(retries) => {
                    retries += 1;
                    let delay = self.retry.delay_for(retries);
                    warn!(
                        request_id = %request.request_id,
                        retry = retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %failure,
                        "Retrying judge call"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

/// Reject reports whose measurements exceed the limits, even if the judge did not.
fn enforce_limits(report: ExecutionReport, limits: ExecutionLimits) -> TestExecutionOutcome {
    if report.execution_time_ms > limits.time_limit_ms() {
        return Err(JudgeFailure::TimeLimitExceeded);
    }
    if report.memory_usage_bytes > limits.memory_limit_bytes() {
        return Err(JudgeFailure::MemoryLimitExceeded);
    }
    Ok(report)
}

/// Compare output: trim trailing whitespace per line, ignore trailing empty lines.
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    let normalize = |s: &str| -> Vec<String> {
        let mut lines: Vec<String> = s.lines().map(|l| l.trim_end().to_string()).collect();
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines
    };
    normalize(actual) == normalize(expected)
}
