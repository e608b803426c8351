use common::SubmissionStatus;
use common::storage::StoreError;
use thiserror::Error;

use crate::state::SubmissionEvent;

/// Reasons an exercise definition is rejected at authoring time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Exercise must have at least one test case")]
    NoTestCases,

    #[error("Test case id must not be empty (position {0})")]
    EmptyTestCaseId(usize),

    #[error("Duplicate test case id: '{0}'")]
    DuplicateTestCaseId(String),

    #[error("Test case '{0}' must have a non-empty expected output")]
    MissingExpectedOutput(String),

    #[error("Hint id must not be empty (position {0})")]
    EmptyHintId(usize),

    #[error("Duplicate hint id: '{0}'")]
    DuplicateHintId(String),

    #[error("Exercise points must be positive")]
    NonPositivePoints,

    #[error("Sum of test case points must be positive")]
    NoScorableTestCases,

    #[error("Time limit must be {min}-{max} seconds, got {actual}")]
    TimeLimitOutOfBounds { actual: u32, min: u32, max: u32 },

    #[error("Memory limit must be {min}-{max} MB, got {actual}")]
    MemoryLimitOutOfBounds { actual: u32, min: u32, max: u32 },
}

/// Engine-level errors surfaced to the caller.
#[derive(Debug, Error)]
pub enum GraderError {
    #[error("Invalid exercise: {0}")]
    Validation(#[from] ValidationError),

    #[error("Code execution is disabled for this exercise")]
    FeatureDisabled,

    #[error("Submission is open in read-only mode")]
    ReadOnly,

    #[error("Code must be run before it can be submitted")]
    SubmissionNotEvaluated,

    #[error("Cannot {event} a submission in status {status}")]
    SubmissionLocked {
        status: SubmissionStatus,
        event: SubmissionEvent,
    },

    #[error("Another operation is in progress for this submission")]
    SubmissionBusy,

    #[error("Exercise {0} not found")]
    ExerciseNotFound(i32),

    #[error("Hint '{0}' not found")]
    HintNotFound(String),

    #[error("Hint '{hint_id}' unlocks after {remaining} more attempt(s)")]
    HintNotAvailable { hint_id: String, remaining: u32 },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl GraderError {
    /// Machine-readable error code for presentation layers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::FeatureDisabled => "FEATURE_DISABLED",
            Self::ReadOnly => "READ_ONLY",
            Self::SubmissionNotEvaluated => "SUBMISSION_NOT_EVALUATED",
            Self::SubmissionLocked { .. } => "SUBMISSION_LOCKED",
            Self::SubmissionBusy => "SUBMISSION_BUSY",
            Self::ExerciseNotFound(_) => "NOT_FOUND",
            Self::HintNotFound(_) => "NOT_FOUND",
            Self::HintNotAvailable { .. } => "HINT_NOT_AVAILABLE",
            Self::Store(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, GraderError>;
