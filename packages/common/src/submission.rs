use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::exercise::{ExerciseId, TestCase};
use crate::fingerprint::CodeFingerprint;
use crate::judge::{ExecutionReport, JudgeFailure};
use crate::submission_status::SubmissionStatus;

pub type StudentId = i32;

/// Identifies the single live submission of a student for an exercise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionKey {
    pub exercise_id: ExerciseId,
    pub student_id: StudentId,
}

impl SubmissionKey {
    pub fn new(exercise_id: ExerciseId, student_id: StudentId) -> Self {
        Self {
            exercise_id,
            student_id,
        }
    }
}

/// Result of evaluating one test case during a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_case_id: String,
    pub input: String,
    pub expected_output: String,
    pub actual_output: String,
    pub passed: bool,
    pub execution_time_ms: u64,
    pub memory_usage_bytes: u64,
    pub error_message: Option<String>,
    /// Typed judge failure, if the call did not complete normally.
    #[serde(default)]
    pub failure: Option<JudgeFailure>,
    /// Copied from the test case at evaluation time.
    pub points: u32,
    /// Copied from the test case at evaluation time.
    pub is_hidden: bool,
}

impl TestResult {
    /// Result for a call that produced output; `passed` is decided by the caller.
    pub fn from_report(test_case: &TestCase, report: ExecutionReport, passed: bool) -> Self {
        Self {
            test_case_id: test_case.id.clone(),
            input: test_case.input.clone(),
            expected_output: test_case.expected_output.clone(),
            actual_output: report.actual_output,
            passed,
            execution_time_ms: report.execution_time_ms,
            memory_usage_bytes: report.memory_usage_bytes,
            error_message: None,
            failure: None,
            points: test_case.points,
            is_hidden: test_case.is_hidden,
        }
    }

    /// Failing result for a call that ended in a judge failure.
    pub fn from_failure(test_case: &TestCase, failure: JudgeFailure) -> Self {
        Self {
            test_case_id: test_case.id.clone(),
            input: test_case.input.clone(),
            expected_output: test_case.expected_output.clone(),
            actual_output: String::new(),
            passed: false,
            execution_time_ms: 0,
            memory_usage_bytes: 0,
            error_message: Some(failure.to_string()),
            failure: Some(failure),
            points: test_case.points,
            is_hidden: test_case.is_hidden,
        }
    }
}

/// A student's mutable attempt record against one exercise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub exercise_id: ExerciseId,
    pub student_id: StudentId,
    pub code: String,
    pub status: SubmissionStatus,
    /// Number of accepted runs. Never decremented.
    pub attempts: u32,
    /// Revealed hint ids. Never shrinks.
    pub hints_used: BTreeSet<String>,
    /// Results of the most recent evaluation only, in test case order.
    pub test_results: Vec<TestResult>,
    pub score: u64,
    pub max_score: u64,
    pub passed_tests: u32,
    pub total_tests: u32,
    /// Fingerprint of the code that produced `test_results`.
    pub evaluated_fingerprint: Option<CodeFingerprint>,
    /// Frozen at submission time.
    pub is_late: bool,
    pub submitted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    pub fn new(key: SubmissionKey, code: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            exercise_id: key.exercise_id,
            student_id: key.student_id,
            code: code.into(),
            status: SubmissionStatus::Draft,
            attempts: 0,
            hints_used: BTreeSet::new(),
            test_results: Vec::new(),
            score: 0,
            max_score: 0,
            passed_tests: 0,
            total_tests: 0,
            evaluated_fingerprint: None,
            is_late: false,
            submitted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> SubmissionKey {
        SubmissionKey::new(self.exercise_id, self.student_id)
    }

    /// True if `test_results` were produced for exactly this code.
    pub fn is_evaluated_for(&self, code: &str) -> bool {
        self.evaluated_fingerprint
            .is_some_and(|fingerprint| fingerprint.matches(code))
    }

    /// Drop the last evaluation and its derived numbers.
    pub fn clear_results(&mut self) {
        self.test_results.clear();
        self.score = 0;
        self.max_score = 0;
        self.passed_tests = 0;
        self.total_tests = 0;
        self.evaluated_fingerprint = None;
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
