pub mod config;
pub mod content;
pub mod exercise;
pub mod fingerprint;
pub mod judge;
pub mod retry;
pub mod storage;
pub mod submission;
pub mod submission_status;

pub use exercise::{Difficulty, Exercise, ExerciseId, Hint, Language, TestCase};
pub use fingerprint::CodeFingerprint;
pub use judge::{ExecutionLimits, ExecutionReport, JudgeClient, JudgeFailure, JudgeRequest};
pub use submission::{StudentId, Submission, SubmissionKey, TestResult};
pub use submission_status::SubmissionStatus;
