use common::{Submission, SubmissionStatus, TestResult};
use serde::{Deserialize, Serialize};

/// Outcome of grading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeVerdict {
    Passed,
    Failed,
}

impl GradeVerdict {
    pub fn status(self) -> SubmissionStatus {
        match self {
            Self::Passed => SubmissionStatus::Passed,
            Self::Failed => SubmissionStatus::Failed,
        }
    }
}

/// Aggregate over the results of one evaluation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub score: u64,
    pub max_score: u64,
    pub passed_tests: u32,
    pub total_tests: u32,
}

impl ScoreSummary {
    /// Passed iff at least one test case was evaluated and all of them passed.
    pub fn verdict(&self) -> GradeVerdict {
        if self.total_tests > 0 && self.passed_tests == self.total_tests {
            GradeVerdict::Passed
        } else {
            GradeVerdict::Failed
        }
    }

    /// Copy the derived numbers onto a submission.
    pub fn apply_to(&self, submission: &mut Submission) {
        submission.score = self.score;
        submission.max_score = self.max_score;
        submission.passed_tests = self.passed_tests;
        submission.total_tests = self.total_tests;
    }
}

/// Score a list of test results.
///
/// Zero-point cases count toward `total_tests`/`passed_tests` but add nothing
/// to `score` or `max_score`.
pub fn score(results: &[TestResult]) -> ScoreSummary {
    results.iter().fold(ScoreSummary::default(), |mut acc, r| {
        let points = u64::from(r.points);
        acc.max_score += points;
        acc.total_tests += 1;
        if r.passed {
            acc.score += points;
            acc.passed_tests += 1;
        }
        acc
    })
}
