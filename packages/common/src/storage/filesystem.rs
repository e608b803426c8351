use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::fs;

use super::error::StoreError;
use super::traits::{ExerciseStore, SubmissionStore};
use crate::exercise::{Exercise, ExerciseId};
use crate::submission::{Submission, SubmissionKey};

/// Filesystem-backed JSON document store.
///
/// Layout:
/// `{base_path}/exercises/{exercise_id}.json` and
/// `{base_path}/submissions/{exercise_id}/{student_id}.json`.
/// Writes go through `{base_path}/.tmp` and are renamed into place.
pub struct FilesystemStore {
    base_path: PathBuf,
}

impl FilesystemStore {
    /// Create the store, creating its directories if needed.
    pub async fn new(base_path: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(base_path.join("exercises")).await?;
        fs::create_dir_all(base_path.join("submissions")).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self { base_path })
    }

    fn exercise_path(&self, id: ExerciseId) -> PathBuf {
        self.base_path.join("exercises").join(format!("{id}.json"))
    }

    fn submission_path(&self, key: SubmissionKey) -> PathBuf {
        self.base_path
            .join("submissions")
            .join(key.exercise_id.to_string())
            .join(format!("{}.json", key.student_id))
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Insert or replace an exercise definition.
    pub async fn put_exercise(&self, exercise: &Exercise) -> Result<(), StoreError> {
        self.write_document(&self.exercise_path(exercise.id), exercise)
            .await
    }

    async fn write_document<T: Serialize + Sync>(
        &self,
        path: &Path,
        value: &T,
    ) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(value)?;

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, &data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(())
    }

    async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
        match fs::read(path).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ExerciseStore for FilesystemStore {
    async fn load_exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StoreError> {
        let exercise: Option<Exercise> = Self::read_document(&self.exercise_path(id)).await?;
        match exercise {
            Some(exercise) if exercise.id != id => Err(StoreError::Corrupted(format!(
                "exercise file for {id} contains exercise {}",
                exercise.id
            ))),
            other => Ok(other),
        }
    }
}

#[async_trait]
impl SubmissionStore for FilesystemStore {
    async fn load_submission(&self, key: SubmissionKey) -> Result<Option<Submission>, StoreError> {
        let submission: Option<Submission> =
            Self::read_document(&self.submission_path(key)).await?;
        match submission {
            Some(submission) if submission.key() != key => Err(StoreError::Corrupted(format!(
                "submission file for exercise {} student {} belongs to another pair",
                key.exercise_id, key.student_id
            ))),
            other => Ok(other),
        }
    }

    async fn save_submission(&self, submission: &Submission) -> Result<(), StoreError> {
        self.write_document(&self.submission_path(submission.key()), submission)
            .await
    }
}
