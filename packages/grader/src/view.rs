//! What a student is allowed to see.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use common::{
    Difficulty, Exercise, ExerciseId, Language, StudentId, Submission, SubmissionStatus, TestCase,
    TestResult,
};
use serde::Serialize;
use uuid::Uuid;

use crate::hints::{self, HintStatus};

/// A submission with hidden test details withheld until it is graded.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubmissionView {
    pub id: Uuid,
    pub exercise_id: ExerciseId,
    pub student_id: StudentId,
    pub code: String,
    pub status: SubmissionStatus,
    pub attempts: u32,
    pub hints_used: BTreeSet<String>,
    pub test_results: Vec<TestResult>,
    /// Number of results left out of `test_results`.
    pub hidden_results: u32,
    pub score: u64,
    pub max_score: u64,
    pub passed_tests: u32,
    pub total_tests: u32,
    pub is_late: bool,
    pub submitted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl SubmissionView {
    pub fn for_student(submission: &Submission) -> Self {
        let disclose_hidden = submission.status.is_graded();
        let test_results: Vec<TestResult> = submission
            .test_results
            .iter()
            .filter(|r| disclose_hidden || !r.is_hidden)
            .cloned()
            .collect();
        let hidden_results = (submission.test_results.len() - test_results.len()) as u32;

        Self {
            id: submission.id,
            exercise_id: submission.exercise_id,
            student_id: submission.student_id,
            code: submission.code.clone(),
            status: submission.status,
            attempts: submission.attempts,
            hints_used: submission.hints_used.clone(),
            test_results,
            hidden_results,
            score: submission.score,
            max_score: submission.max_score,
            passed_tests: submission.passed_tests,
            total_tests: submission.total_tests,
            is_late: submission.is_late,
            submitted_at: submission.submitted_at,
            updated_at: submission.updated_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TestCaseView {
    pub id: String,
    pub input: String,
    pub expected_output: String,
    pub description: Option<String>,
    pub points: u32,
}

impl From<&TestCase> for TestCaseView {
    fn from(tc: &TestCase) -> Self {
        Self {
            id: tc.id.clone(),
            input: tc.input.clone(),
            expected_output: tc.expected_output.clone(),
            description: tc.description.clone(),
            points: tc.points,
        }
    }
}

/// An exercise without hidden test cases, unrevealed hints or the solution.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExerciseView {
    pub id: ExerciseId,
    pub title: String,
    pub prompt: String,
    pub language: Language,
    pub difficulty: Difficulty,
    pub starter_code: String,
    pub points: u32,
    pub allow_execution: bool,
    pub allow_multiple_submissions: bool,
    pub time_limit_secs: Option<u32>,
    pub memory_limit_mb: Option<u32>,
    pub test_cases: Vec<TestCaseView>,
    pub hidden_test_cases: usize,
    pub hints: Vec<HintStatus>,
    pub solution_code: Option<String>,
}

impl ExerciseView {
    pub fn for_student(exercise: &Exercise, submission: Option<&Submission>) -> Self {
        let test_cases: Vec<TestCaseView> =
            exercise.visible_test_cases().map(TestCaseView::from).collect();
        let hidden_test_cases = exercise.test_cases.len() - test_cases.len();

        let hints = match submission {
            Some(s) => hints::hint_status(&exercise.hints, s.attempts, &s.hints_used),
            None => hints::hint_status(&exercise.hints, 0, &BTreeSet::new()),
        };

        let graded = submission.is_some_and(|s| s.status.is_graded());
        let solution_code = if exercise.show_solution_after_grading && graded {
            exercise.solution_code.clone()
        } else {
            None
        };

        Self {
            id: exercise.id,
            title: exercise.title.clone(),
            prompt: exercise.prompt.clone(),
            language: exercise.language,
            difficulty: exercise.difficulty,
            starter_code: exercise.starter_code.clone(),
            points: exercise.points,
            allow_execution: exercise.allow_execution,
            allow_multiple_submissions: exercise.allow_multiple_submissions,
            time_limit_secs: exercise.time_limit_secs,
            memory_limit_mb: exercise.memory_limit_mb,
            test_cases,
            hidden_test_cases,
            hints,
            solution_code,
        }
    }
}
