use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::error::StoreError;
use super::traits::{ExerciseStore, SubmissionStore};
use crate::exercise::{Exercise, ExerciseId};
use crate::submission::{Submission, SubmissionKey};

/// Process-local store, used by tests and single-process tools.
#[derive(Default)]
pub struct InMemoryStore {
    exercises: RwLock<HashMap<ExerciseId, Exercise>>,
    submissions: RwLock<HashMap<SubmissionKey, Submission>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an exercise definition.
    pub async fn put_exercise(&self, exercise: Exercise) {
        self.exercises.write().await.insert(exercise.id, exercise);
    }

    pub async fn submission_count(&self) -> usize {
        self.submissions.read().await.len()
    }
}

#[async_trait]
impl ExerciseStore for InMemoryStore {
    async fn load_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StoreError> {
        Ok(self.exercises.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl SubmissionStore for InMemoryStore {
    async fn load_submission(&self, key: SubmissionKey) -> Result<Option<Submission>, StoreError> {
        Ok(self.submissions.read().await.get(&key).cloned())
    }

    async fn save_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        self.submissions
            .write()
            .await
            .insert(submission.key(), submission.clone());
        Ok(())
    }
}
