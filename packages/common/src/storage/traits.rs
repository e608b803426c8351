use async_trait::async_trait;

use super::error::StoreError;
use crate::exercise::{Exercise, ExerciseId};
use crate::submission::{Submission, SubmissionKey};

/// Read access to exercise definitions owned by the authoring workflow.
#[async_trait]
pub trait ExerciseStore: Send + Sync {
    async fn load_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StoreError>;
}

/// Persistence of the single live submission per (exercise, student) pair.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn load_submission(&self, key: SubmissionKey) -> Result<Option<Submission>, StoreError>;

    /// Insert or replace the submission for its key.
    async fn save_submission(&self, submission: &Submission) -> Result<(), StoreError>;
}
