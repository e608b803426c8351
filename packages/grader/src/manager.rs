use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::storage::{ExerciseStore, SubmissionStore};
use common::{CodeFingerprint, Exercise, Hint, Submission, SubmissionKey, TestResult};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, instrument, warn};

use crate::error::{GraderError, Result};
use crate::evaluation::Evaluator;
use crate::hints::{self, HintStatus};
use crate::scoring::{self, ScoreSummary};
use crate::state::{SubmissionEvent, TransitionPolicy, reopen_for, transition};
use crate::view::{ExerciseView, SubmissionView};

/// Whether the caller may mutate the submission. Decided outside the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AccessMode {
    #[default]
    Editable,
    ReadOnly,
}

impl AccessMode {
    fn ensure_editable(self) -> Result<()> {
        match self {
            Self::Editable => Ok(()),
            Self::ReadOnly => Err(GraderError::ReadOnly),
        }
    }
}

/// Caller-supplied context for a submit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubmitOptions {
    pub deadline: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
}

impl SubmitOptions {
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn is_late(&self) -> bool {
        self.deadline.is_some_and(|deadline| self.now > deadline)
    }
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            deadline: None,
            now: Utc::now(),
        }
    }
}

/// Orchestrates every mutation of a submission.
///
/// Operations on the same (exercise, student) pair are mutually exclusive: a
/// request that arrives while another one holds the pair fails fast with
/// `SubmissionBusy` instead of queueing.
pub struct SubmissionManager {
    exercises: Arc<dyn ExerciseStore>,
    submissions: Arc<dyn SubmissionStore>,
    evaluator: Evaluator,
    locks: DashMap<SubmissionKey, Arc<Mutex<()>>>,
}

impl SubmissionManager {
    pub fn new(
        exercises: Arc<dyn ExerciseStore>,
        submissions: Arc<dyn SubmissionStore>,
        evaluator: Evaluator,
    ) -> Self {
        Self {
            exercises,
            submissions,
            evaluator,
            locks: DashMap::new(),
        }
    }

    /// Build a manager over a single store that holds both exercises and submissions.
    pub fn with_store<S>(store: Arc<S>, evaluator: Evaluator) -> Self
    where
        S: ExerciseStore + SubmissionStore + 'static,
    {
        Self::new(store.clone(), store, evaluator)
    }

    #[instrument(skip(self, key, code), fields(exercise_id = key.exercise_id, student_id = key.student_id))]
    pub async fn save_draft(
        &self,
        key: SubmissionKey,
        code: &str,
        access: AccessMode,
    ) -> Result<Submission> {
        access.ensure_editable()?;
        let _guard = self.try_lock(key)?;

        let exercise = self.load_exercise(key).await?;
        let policy = TransitionPolicy::from(&exercise);
        let mut submission = self.load_or_create(key, &exercise).await?;

        let status = reopen_for(submission.status, SubmissionEvent::SaveDraft, policy)?;
        submission.status = transition(status, SubmissionEvent::SaveDraft, policy)?;
        submission.code = code.to_string();
        submission.touch();

        self.submissions.save_submission(&submission).await?;
        debug!(bytes = code.len(), "Draft saved");
        Ok(submission)
    }

    /// Run `code` against every test case and record the results.
    ///
    /// The attempt is persisted before any judge call is made. Results replace
    /// the previous run's in a single step once every call has finished, so a
    /// run abandoned midway leaves the earlier results in place.
    #[instrument(skip(self, key, code), fields(exercise_id = key.exercise_id, student_id = key.student_id))]
    pub async fn run(&self, key: SubmissionKey, code: &str, access: AccessMode) -> Result<Submission> {
        access.ensure_editable()?;
        let _guard = self.try_lock(key)?;

        let exercise = self.load_exercise(key).await?;
        if !exercise.allow_execution {
            return Err(GraderError::FeatureDisabled);
        }
        let policy = TransitionPolicy::from(&exercise);
        let mut submission = self.load_or_create(key, &exercise).await?;

        let status = reopen_for(submission.status, SubmissionEvent::Run, policy)?;
        submission.status = transition(status, SubmissionEvent::Run, policy)?;
        submission.code = code.to_string();
        submission.attempts = submission.attempts.saturating_add(1);
        submission.touch();
        self.submissions.save_submission(&submission).await?;
        info!(attempt = submission.attempts, "Run accepted");

        let results = self.evaluator.evaluate(&exercise, code).await;
        let summary = record_evaluation(&mut submission, results, code);
        self.submissions.save_submission(&submission).await?;

        info!(
            attempt = submission.attempts,
            score = summary.score,
            max_score = summary.max_score,
            passed = summary.passed_tests,
            total = summary.total_tests,
            "Run recorded"
        );
        Ok(submission)
    }

    /// Hand in `code` and grade it.
    ///
    /// The code must match the last run unless the exercise allows blind
    /// submission. A blind submission is evaluated here when execution is
    /// enabled (without counting an attempt); otherwise it stays `SUBMITTED`
    /// for an external grading step.
    #[instrument(skip(self, key, code), fields(exercise_id = key.exercise_id, student_id = key.student_id))]
    pub async fn submit(
        &self,
        key: SubmissionKey,
        code: &str,
        options: SubmitOptions,
        access: AccessMode,
    ) -> Result<Submission> {
        access.ensure_editable()?;
        let _guard = self.try_lock(key)?;

        let exercise = self.load_exercise(key).await?;
        let policy = TransitionPolicy::from(&exercise);
        let mut submission = self.load_or_create(key, &exercise).await?;

        let status = reopen_for(submission.status, SubmissionEvent::Submit, policy)?;
        let evaluated = submission.is_evaluated_for(code);
        if !evaluated && !exercise.allow_blind_submission {
            return Err(GraderError::SubmissionNotEvaluated);
        }
        let mut status = transition(status, SubmissionEvent::Submit, policy)?;

        if !evaluated {
            if exercise.allow_execution {
                info!("Evaluating blind submission");
                let results = self.evaluator.evaluate(&exercise, code).await;
                record_evaluation(&mut submission, results, code);
            } else {
                submission.clear_results();
            }
        }

        submission.code = code.to_string();
        submission.is_late = options.is_late();
        submission.submitted_at = Some(options.now);

        if submission.is_evaluated_for(code) {
            let summary = scoring::score(&submission.test_results);
            summary.apply_to(&mut submission);
            status = transition(status, SubmissionEvent::Grade, policy)?;
            status = transition(status, SubmissionEvent::Conclude(summary.verdict()), policy)?;
            info!(
                score = summary.score,
                max_score = summary.max_score,
                verdict = ?summary.verdict(),
                is_late = submission.is_late,
                "Submission graded"
            );
        } else {
            warn!("Submission awaiting external grading");
        }

        submission.status = status;
        submission.touch();
        self.submissions.save_submission(&submission).await?;
        Ok(submission)
    }

    /// Explicitly reopen a handed-in submission for editing.
    #[instrument(skip(self, key), fields(exercise_id = key.exercise_id, student_id = key.student_id))]
    pub async fn resubmit(&self, key: SubmissionKey, access: AccessMode) -> Result<Submission> {
        access.ensure_editable()?;
        let _guard = self.try_lock(key)?;

        let exercise = self.load_exercise(key).await?;
        let policy = TransitionPolicy::from(&exercise);
        let mut submission = self.load_or_create(key, &exercise).await?;

        submission.status = transition(submission.status, SubmissionEvent::Resubmit, policy)?;
        submission.touch();
        self.submissions.save_submission(&submission).await?;
        info!("Submission reopened");
        Ok(submission)
    }

    /// Restore the starter code and drop the last evaluation.
    ///
    /// Attempts and revealed hints are kept.
    #[instrument(skip(self, key), fields(exercise_id = key.exercise_id, student_id = key.student_id))]
    pub async fn reset(&self, key: SubmissionKey, access: AccessMode) -> Result<Submission> {
        access.ensure_editable()?;
        let _guard = self.try_lock(key)?;

        let exercise = self.load_exercise(key).await?;
        let policy = TransitionPolicy::from(&exercise);
        let mut submission = self.load_or_create(key, &exercise).await?;

        let status = reopen_for(submission.status, SubmissionEvent::Reset, policy)?;
        submission.status = transition(status, SubmissionEvent::Reset, policy)?;
        submission.code = exercise.starter_code.clone();
        submission.clear_results();
        submission.touch();

        self.submissions.save_submission(&submission).await?;
        info!(attempts = submission.attempts, "Submission reset");
        Ok(submission)
    }

    /// Reveal an unlocked hint. Revealing an already revealed hint is a no-op.
    #[instrument(skip(self, key), fields(exercise_id = key.exercise_id, student_id = key.student_id))]
    pub async fn reveal_hint(
        &self,
        key: SubmissionKey,
        hint_id: &str,
        access: AccessMode,
    ) -> Result<Hint> {
        access.ensure_editable()?;
        let _guard = self.try_lock(key)?;

        let exercise = self.load_exercise(key).await?;
        let hint = exercise
            .hint(hint_id)
            .cloned()
            .ok_or_else(|| GraderError::HintNotFound(hint_id.to_string()))?;
        let mut submission = self.load_or_create(key, &exercise).await?;

        if submission.hints_used.contains(&hint.id) {
            return Ok(hint);
        }
        if !hint.is_unlocked(submission.attempts) {
            return Err(GraderError::HintNotAvailable {
                hint_id: hint.id,
                remaining: hint.reveal_after_attempts - submission.attempts,
            });
        }

        hints::reveal(&mut submission.hints_used, &hint.id);
        submission.touch();
        self.submissions.save_submission(&submission).await?;
        info!(revealed = submission.hints_used.len(), "Hint revealed");
        Ok(hint)
    }

    pub async fn available_hints(&self, key: SubmissionKey) -> Result<Vec<Hint>> {
        let exercise = self.load_exercise(key).await?;
        let attempts = self.attempts(key).await?;
        Ok(hints::available_hints(&exercise.hints, attempts))
    }

    pub async fn hint_status(&self, key: SubmissionKey) -> Result<Vec<HintStatus>> {
        let exercise = self.load_exercise(key).await?;
        let submission = self.submissions.load_submission(key).await?;
        Ok(match submission {
            Some(s) => hints::hint_status(&exercise.hints, s.attempts, &s.hints_used),
            None => hints::hint_status(&exercise.hints, 0, &Default::default()),
        })
    }

    pub async fn get_submission(&self, key: SubmissionKey) -> Result<Option<Submission>> {
        Ok(self.submissions.load_submission(key).await?)
    }

    /// The submission as a student may see it.
    pub async fn student_view(&self, key: SubmissionKey) -> Result<Option<SubmissionView>> {
        let submission = self.submissions.load_submission(key).await?;
        Ok(submission.as_ref().map(SubmissionView::for_student))
    }

    /// The exercise as a student may see it, given their current submission.
    pub async fn exercise_view(&self, key: SubmissionKey) -> Result<ExerciseView> {
        let exercise = self.load_exercise(key).await?;
        let submission = self.submissions.load_submission(key).await?;
        Ok(ExerciseView::for_student(&exercise, submission.as_ref()))
    }

    fn try_lock(&self, key: SubmissionKey) -> Result<SubmissionGuard<'_>> {
        let lock = self.locks.entry(key).or_default().clone();
        let guard = lock.try_lock_owned().map_err(|_| {
            warn!(
                exercise_id = key.exercise_id,
                student_id = key.student_id,
                "Rejected concurrent operation"
            );
            GraderError::SubmissionBusy
        })?;
        Ok(SubmissionGuard {
            guard: Some(guard),
            locks: &self.locks,
            key,
        })
    }

    async fn load_exercise(&self, key: SubmissionKey) -> Result<Exercise> {
        self.exercises
            .load_exercise(key.exercise_id)
            .await?
            .ok_or(GraderError::ExerciseNotFound(key.exercise_id))
    }

    async fn load_or_create(&self, key: SubmissionKey, exercise: &Exercise) -> Result<Submission> {
        Ok(match self.submissions.load_submission(key).await? {
            Some(submission) => submission,
            None => {
                debug!("Creating submission");
                Submission::new(key, exercise.starter_code.clone())
            }
        })
    }

    async fn attempts(&self, key: SubmissionKey) -> Result<u32> {
        Ok(self
            .submissions
            .load_submission(key)
            .await?
            .map_or(0, |s| s.attempts))
    }
}

/// Exclusive hold on one (exercise, student) pair.
///
/// Dropping it releases the pair and removes its lock entry once nobody else
/// references it, so the map only holds pairs in use.
struct SubmissionGuard<'a> {
    guard: Option<OwnedMutexGuard<()>>,
    locks: &'a DashMap<SubmissionKey, Arc<Mutex<()>>>,
    key: SubmissionKey,
}

impl Drop for SubmissionGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Clones are taken under the shard lock, so a count of 1 means no
        // other caller can still reach this mutex.
        self.locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// Replace the previous evaluation with `results` for `code`.
fn record_evaluation(submission: &mut Submission, results: Vec<TestResult>, code: &str) -> ScoreSummary {
    let summary = scoring::score(&results);
    submission.test_results = results;
    summary.apply_to(submission);
    submission.evaluated_fingerprint = Some(CodeFingerprint::compute(code));
    submission.touch();
    summary
}
