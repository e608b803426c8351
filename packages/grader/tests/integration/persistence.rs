use std::sync::Arc;

use ::common::config::ExerciseBounds;
use ::common::storage::FilesystemStore;
use ::common::{Exercise, SubmissionStatus};
use grader::{
    AccessMode, Evaluator, GraderError, SubmissionManager, SubmitOptions, ValidationError, validate,
};

use crate::common::{ScriptedJudge, exercise, judge_config, key};

const EDIT: AccessMode = AccessMode::Editable;

async fn manager_at(dir: &std::path::Path, judge: Arc<ScriptedJudge>) -> SubmissionManager {
    let store = FilesystemStore::new(dir.to_path_buf()).await.unwrap();
    store.put_exercise(&exercise(1)).await.unwrap();
    SubmissionManager::with_store(Arc::new(store), Evaluator::new(judge, judge_config()))
}

#[tokio::test]
async fn graded_record_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let judge = Arc::new(ScriptedJudge::interpreter());

    let manager = manager_at(dir.path(), judge.clone()).await;
    manager.run(key(1), "lower", EDIT).await.unwrap();
    let graded = manager
        .submit(key(1), "lower", SubmitOptions::default(), EDIT)
        .await
        .unwrap();
    drop(manager);

    let manager = manager_at(dir.path(), judge).await;
    let stored = manager.get_submission(key(1)).await.unwrap().unwrap();
    assert_eq!(stored, graded);
    assert_eq!(stored.status, SubmissionStatus::Failed);
    assert!(stored.is_evaluated_for("lower"));

    let err = manager
        .submit(key(1), "lower", SubmitOptions::default(), EDIT)
        .await
        .unwrap_err();
    assert!(matches!(err, GraderError::SubmissionLocked { .. }));
}

#[tokio::test]
async fn authored_json_is_validated_before_use() {
    let json = r#"{
        "id": 5,
        "title": "Shout",
        "language": "python",
        "test_cases": [
            {"id": "a", "input": "hi", "expected_output": "HI", "points": 2},
            {"id": "b", "input": "yo", "expected_output": "YO", "is_hidden": true}
        ],
        "hints": [{"id": "h", "content": "upper()", "order": 1, "reveal_after_attempts": 1}],
        "time_limit_secs": 10,
        "points": 5
    }"#;
    let parsed: Exercise = serde_json::from_str(json).unwrap();
    assert!(parsed.allow_execution);
    assert_eq!(parsed.test_cases[1].points, 1);

    let accepted = validate(parsed.clone(), &ExerciseBounds::default()).unwrap();
    assert_eq!(accepted.total_test_points(), 3);

    let mut too_slow = parsed;
    too_slow.time_limit_secs = Some(600);
    let err: GraderError = validate(too_slow, &ExerciseBounds::default())
        .unwrap_err()
        .into();
    assert!(matches!(
        err,
        GraderError::Validation(ValidationError::TimeLimitOutOfBounds { actual: 600, .. })
    ));
}
