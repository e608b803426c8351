use ::common::{JudgeFailure, SubmissionStatus};
use chrono::{Duration, Utc};
use grader::{AccessMode, GraderError, SubmissionEvent, SubmitOptions};

use crate::common::{ScriptedJudge, TestGrader, exercise, key};

const EDIT: AccessMode = AccessMode::Editable;

mod run {
    use super::*;

    #[tokio::test]
    async fn run_records_results_and_stays_draft() {
        let app = TestGrader::new(exercise(1), ScriptedJudge::interpreter()).await;

        let submission = app.manager.run(key(1), "echo", EDIT).await.unwrap();

        assert_eq!(submission.status, SubmissionStatus::Draft);
        assert_eq!(submission.attempts, 1);
        assert_eq!(submission.code, "echo");
        assert_eq!(submission.test_results.len(), 2);
        assert!(submission.test_results.iter().all(|r| r.passed));
        assert_eq!(submission.score, 3);
        assert_eq!(submission.max_score, 3);
        assert!(submission.is_evaluated_for("echo"));
        assert_eq!(app.judge.calls(), 2);
    }

    #[tokio::test]
    async fn judge_failures_become_failing_results() {
        let app = TestGrader::new(exercise(1), ScriptedJudge::interpreter()).await;

        let crashed = app.manager.run(key(1), "crash", EDIT).await.unwrap();
        assert_eq!(crashed.attempts, 1);
        assert_eq!(crashed.status, SubmissionStatus::Draft);
        assert_eq!(crashed.score, 0);
        for result in &crashed.test_results {
            assert!(!result.passed);
            assert!(matches!(result.failure, Some(JudgeFailure::RuntimeError(_))));
            assert!(result.error_message.is_some());
        }

        let broken = app.manager.run(key(1), "syntax error", EDIT).await.unwrap();
        assert_eq!(broken.attempts, 2);
        assert!(
            broken
                .test_results
                .iter()
                .all(|r| matches!(r.failure, Some(JudgeFailure::CompileError(_))))
        );
    }

    #[tokio::test]
    async fn latest_run_replaces_previous_results() {
        let app = TestGrader::new(exercise(1), ScriptedJudge::interpreter()).await;

        app.manager.run(key(1), "echo", EDIT).await.unwrap();
        let second = app.manager.run(key(1), "upper", EDIT).await.unwrap();

        assert_eq!(second.test_results.len(), 2);
        assert_eq!(second.score, 2);
        assert!(!second.is_evaluated_for("echo"));
        assert!(second.is_evaluated_for("upper"));
    }

    #[tokio::test]
    async fn rerunning_identical_code_is_deterministic() {
        let app = TestGrader::new(exercise(1), ScriptedJudge::interpreter()).await;

        let first = app.manager.run(key(1), "lower", EDIT).await.unwrap();
        let second = app.manager.run(key(1), "lower", EDIT).await.unwrap();

        assert_eq!(first.test_results, second.test_results);
        assert_eq!(first.score, second.score);
        assert_eq!(second.attempts, first.attempts + 1);
    }

    #[tokio::test]
    async fn execution_disabled_rejects_run() {
        let mut ex = exercise(1);
        ex.allow_execution = false;
        let app = TestGrader::new(ex, ScriptedJudge::interpreter()).await;

        let err = app.manager.run(key(1), "echo", EDIT).await.unwrap_err();
        assert!(matches!(err, GraderError::FeatureDisabled));
        assert_eq!(app.judge.calls(), 0);
        assert!(app.manager.get_submission(key(1)).await.unwrap().is_none());

        app.manager.save_draft(key(1), "echo", EDIT).await.unwrap();
        let err = app.manager.run(key(1), "echo", EDIT).await.unwrap_err();
        assert!(matches!(err, GraderError::FeatureDisabled));
        let stored = app.manager.get_submission(key(1)).await.unwrap().unwrap();
        assert_eq!(stored.attempts, 0);
    }

    #[tokio::test]
    async fn unknown_exercise() {
        let app = TestGrader::new(exercise(1), ScriptedJudge::interpreter()).await;
        let err = app.manager.run(key(99), "echo", EDIT).await.unwrap_err();
        assert!(matches!(err, GraderError::ExerciseNotFound(99)));
        assert_eq!(err.code(), "NOT_FOUND");
    }
}

mod submit {
    use super::*;

    #[tokio::test]
    async fn partial_pass_is_graded_failed() {
        let app = TestGrader::new(exercise(1), ScriptedJudge::interpreter()).await;

        app.manager.run(key(1), "lower", EDIT).await.unwrap();
        let graded = app
            .manager
            .submit(key(1), "lower", SubmitOptions::default(), EDIT)
            .await
            .unwrap();

        assert_eq!(graded.score, 1);
        assert_eq!(graded.max_score, 3);
        assert_eq!(graded.passed_tests, 1);
        assert_eq!(graded.total_tests, 2);
        assert_eq!(graded.status, SubmissionStatus::Failed);
        assert!(graded.submitted_at.is_some());
    }

    #[tokio::test]
    async fn full_pass_is_graded_passed() {
        let app = TestGrader::new(exercise(1), ScriptedJudge::interpreter()).await;

        app.manager.run(key(1), "echo", EDIT).await.unwrap();
        let graded = app
            .manager
            .submit(key(1), "echo", SubmitOptions::default(), EDIT)
            .await
            .unwrap();

        assert_eq!(graded.status, SubmissionStatus::Passed);
        assert_eq!(graded.score, graded.max_score);
        // Submitting reuses the last run.
        assert_eq!(app.judge.calls(), 2);
    }

    #[tokio::test]
    async fn submit_requires_results_for_the_same_code() {
        let app = TestGrader::new(exercise(1), ScriptedJudge::interpreter()).await;

        let err = app
            .manager
            .submit(key(1), "echo", SubmitOptions::default(), EDIT)
            .await
            .unwrap_err();
        assert!(matches!(err, GraderError::SubmissionNotEvaluated));

        app.manager.run(key(1), "echo", EDIT).await.unwrap();
        let err = app
            .manager
            .submit(key(1), "echo // edited", SubmitOptions::default(), EDIT)
            .await
            .unwrap_err();
        assert!(matches!(err, GraderError::SubmissionNotEvaluated));

        let stored = app.manager.get_submission(key(1)).await.unwrap().unwrap();
        assert_eq!(stored.status, SubmissionStatus::Draft);
    }

    #[tokio::test]
    async fn graded_record_is_locked_without_multiple_submissions() {
        let app = TestGrader::new(exercise(1), ScriptedJudge::interpreter()).await;

        app.manager.run(key(1), "lower", EDIT).await.unwrap();
        app.manager
            .submit(key(1), "lower", SubmitOptions::default(), EDIT)
            .await
            .unwrap();
        let graded = app.manager.get_submission(key(1)).await.unwrap().unwrap();

        let err = app
            .manager
            .submit(key(1), "lower", SubmitOptions::default(), EDIT)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GraderError::SubmissionLocked {
                status: SubmissionStatus::Failed,
                event: SubmissionEvent::Submit,
            }
        ));

        for err in [
            app.manager.run(key(1), "echo", EDIT).await.unwrap_err(),
            app.manager.save_draft(key(1), "echo", EDIT).await.unwrap_err(),
            app.manager.reset(key(1), EDIT).await.unwrap_err(),
            app.manager.resubmit(key(1), EDIT).await.unwrap_err(),
        ] {
            assert_eq!(err.code(), "SUBMISSION_LOCKED");
        }

        let after = app.manager.get_submission(key(1)).await.unwrap().unwrap();
        assert_eq!(after, graded);
    }

    #[tokio::test]
    async fn last_submission_wins_with_multiple_submissions() {
        let mut ex = exercise(1);
        ex.allow_multiple_submissions = true;
        let app = TestGrader::new(ex, ScriptedJudge::interpreter()).await;

        app.manager.run(key(1), "lower", EDIT).await.unwrap();
        let first = app
            .manager
            .submit(key(1), "lower", SubmitOptions::default(), EDIT)
            .await
            .unwrap();
        assert_eq!(first.status, SubmissionStatus::Failed);

        // Running again reopens the graded record.
        let reopened = app.manager.run(key(1), "echo", EDIT).await.unwrap();
        assert_eq!(reopened.status, SubmissionStatus::Draft);

        let second = app
            .manager
            .submit(key(1), "echo", SubmitOptions::default(), EDIT)
            .await
            .unwrap();
        assert_eq!(second.status, SubmissionStatus::Passed);
        assert_eq!(second.score, 3);
        assert_eq!(second.attempts, 2);
        assert_eq!(second.id, first.id);
    }

    #[tokio::test]
    async fn explicit_resubmit() {
        let mut ex = exercise(1);
        ex.allow_multiple_submissions = true;
        let app = TestGrader::new(ex, ScriptedJudge::interpreter()).await;

        let err = app.manager.resubmit(key(1), EDIT).await.unwrap_err();
        assert!(matches!(
            err,
            GraderError::SubmissionLocked {
                status: SubmissionStatus::Draft,
                ..
            }
        ));

        app.manager.run(key(1), "echo", EDIT).await.unwrap();
        app.manager
            .submit(key(1), "echo", SubmitOptions::default(), EDIT)
            .await
            .unwrap();
        let reopened = app.manager.resubmit(key(1), EDIT).await.unwrap();

        assert_eq!(reopened.status, SubmissionStatus::Draft);
        assert_eq!(reopened.score, 3);
        assert_eq!(reopened.attempts, 1);
    }

    #[tokio::test]
    async fn lateness_is_frozen_at_submission() {
        let mut ex = exercise(1);
        ex.allow_multiple_submissions = true;
        let app = TestGrader::new(ex, ScriptedJudge::interpreter()).await;
        let now = Utc::now();

        app.manager.run(key(1), "echo", EDIT).await.unwrap();
        let late = app
            .manager
            .submit(
                key(1),
                "echo",
                SubmitOptions {
                    deadline: Some(now - Duration::minutes(5)),
                    now,
                },
                EDIT,
            )
            .await
            .unwrap();
        assert!(late.is_late);
        assert_eq!(late.submitted_at, Some(now));

        // Reopening does not recompute it.
        let reopened = app.manager.save_draft(key(1), "echo", EDIT).await.unwrap();
        assert!(reopened.is_late);

        let on_time = app
            .manager
            .submit(
                key(1),
                "echo",
                SubmitOptions {
                    deadline: Some(now + Duration::minutes(5)),
                    now,
                },
                EDIT,
            )
            .await
            .unwrap();
        assert!(!on_time.is_late);
    }

    #[tokio::test]
    async fn blind_submission_is_evaluated_without_an_attempt() {
        let mut ex = exercise(1);
        ex.allow_blind_submission = true;
        let app = TestGrader::new(ex, ScriptedJudge::interpreter()).await;

        let graded = app
            .manager
            .submit(key(1), "echo", SubmitOptions::default(), EDIT)
            .await
            .unwrap();

        assert_eq!(graded.status, SubmissionStatus::Passed);
        assert_eq!(graded.attempts, 0);
        assert_eq!(graded.test_results.len(), 2);
        assert_eq!(app.judge.calls(), 2);
    }

    #[tokio::test]
    async fn blind_submission_without_execution_awaits_grading() {
        let mut ex = exercise(1);
        ex.allow_blind_submission = true;
        ex.allow_execution = false;
        let app = TestGrader::new(ex, ScriptedJudge::interpreter()).await;

        let submitted = app
            .manager
            .submit(key(1), "echo", SubmitOptions::default(), EDIT)
            .await
            .unwrap();

        assert_eq!(submitted.status, SubmissionStatus::Submitted);
        assert!(submitted.test_results.is_empty());
        assert_eq!(submitted.code, "echo");
        assert_eq!(app.judge.calls(), 0);
    }
}

mod editing {
    use super::*;

    #[tokio::test]
    async fn draft_is_created_on_first_save() {
        let app = TestGrader::new(exercise(1), ScriptedJudge::interpreter()).await;

        let draft = app.manager.save_draft(key(1), "print()", EDIT).await.unwrap();
        assert_eq!(draft.status, SubmissionStatus::Draft);
        assert_eq!(draft.code, "print()");
        assert_eq!(draft.attempts, 0);
        assert_eq!(app.store.submission_count().await, 1);
    }

    #[tokio::test]
    async fn read_only_rejects_every_mutation() {
        let app = TestGrader::new(exercise(1), ScriptedJudge::interpreter()).await;
        let ro = AccessMode::ReadOnly;

        for err in [
            app.manager.save_draft(key(1), "x", ro).await.unwrap_err(),
            app.manager.run(key(1), "x", ro).await.unwrap_err(),
            app.manager
                .submit(key(1), "x", SubmitOptions::default(), ro)
                .await
                .unwrap_err(),
            app.manager.reset(key(1), ro).await.unwrap_err(),
            app.manager.resubmit(key(1), ro).await.unwrap_err(),
            app.manager.reveal_hint(key(1), "h1", ro).await.unwrap_err(),
        ] {
            assert!(matches!(err, GraderError::ReadOnly));
        }
        assert_eq!(app.store.submission_count().await, 0);
        assert_eq!(app.judge.calls(), 0);
    }

    #[tokio::test]
    async fn reset_restores_starter_code_and_keeps_history() {
        let mut ex = exercise(1);
        ex.hints = vec![crate::common::hint("h1", 1, 0)];
        let app = TestGrader::new(ex.clone(), ScriptedJudge::interpreter()).await;

        app.manager.run(key(1), "echo", EDIT).await.unwrap();
        app.manager.reveal_hint(key(1), "h1", EDIT).await.unwrap();
        let reset = app.manager.reset(key(1), EDIT).await.unwrap();

        assert_eq!(reset.code, ex.starter_code);
        assert!(reset.test_results.is_empty());
        assert_eq!(reset.score, 0);
        assert_eq!(reset.max_score, 0);
        assert_eq!(reset.attempts, 1);
        assert!(reset.hints_used.contains("h1"));

        // Results were discarded, so the old code has to be run again.
        let err = app
            .manager
            .submit(key(1), "echo", SubmitOptions::default(), EDIT)
            .await
            .unwrap_err();
        assert!(matches!(err, GraderError::SubmissionNotEvaluated));
    }
}

mod views {
    use super::*;

    #[tokio::test]
    async fn hidden_results_withheld_until_graded() {
        let mut ex = exercise(1);
        ex.test_cases[1].is_hidden = true;
        let app = TestGrader::new(ex, ScriptedJudge::interpreter()).await;

        app.manager.run(key(1), "echo", EDIT).await.unwrap();
        let view = app.manager.student_view(key(1)).await.unwrap().unwrap();
        assert_eq!(view.test_results.len(), 1);
        assert_eq!(view.test_results[0].test_case_id, "same");
        assert_eq!(view.hidden_results, 1);
        assert_eq!(view.max_score, 3);

        let exercise_view = app.manager.exercise_view(key(1)).await.unwrap();
        assert_eq!(exercise_view.test_cases.len(), 1);
        assert_eq!(exercise_view.solution_code, None);

        app.manager
            .submit(key(1), "echo", SubmitOptions::default(), EDIT)
            .await
            .unwrap();
        let view = app.manager.student_view(key(1)).await.unwrap().unwrap();
        assert_eq!(view.test_results.len(), 2);
        assert_eq!(view.hidden_results, 0);
    }

    #[tokio::test]
    async fn solution_disclosed_after_grading_when_enabled() {
        let mut ex = exercise(1);
        ex.show_solution_after_grading = true;
        let app = TestGrader::new(ex, ScriptedJudge::interpreter()).await;

        app.manager.run(key(1), "lower", EDIT).await.unwrap();
        assert_eq!(
            app.manager.exercise_view(key(1)).await.unwrap().solution_code,
            None
        );

        app.manager
            .submit(key(1), "lower", SubmitOptions::default(), EDIT)
            .await
            .unwrap();
        assert_eq!(
            app.manager
                .exercise_view(key(1))
                .await
                .unwrap()
                .solution_code
                .as_deref(),
            Some("echo")
        );
    }

    #[tokio::test]
    async fn no_view_before_first_interaction() {
        let app = TestGrader::new(exercise(1), ScriptedJudge::interpreter()).await;
        assert!(app.manager.student_view(key(1)).await.unwrap().is_none());
    }
}
