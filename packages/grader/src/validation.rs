use std::collections::HashSet;

use common::Exercise;
use common::config::ExerciseBounds;

use crate::error::ValidationError;

/// Validate an exercise definition, returning it unchanged when accepted.
///
/// The first violated rule is reported. Limits are only checked against the
/// platform bounds when the exercise allows execution; absent limits fall back
/// to the judge defaults.
pub fn validate(exercise: Exercise, bounds: &ExerciseBounds) -> Result<Exercise, ValidationError> {
    validate_ref(&exercise, bounds)?;
    Ok(exercise)
}

pub fn validate_ref(exercise: &Exercise, bounds: &ExerciseBounds) -> Result<(), ValidationError> {
    if exercise.test_cases.is_empty() {
        return Err(ValidationError::NoTestCases);
    }

    let mut seen_test_cases = HashSet::with_capacity(exercise.test_cases.len());
    for (position, tc) in exercise.test_cases.iter().enumerate() {
        if tc.id.trim().is_empty() {
            return Err(ValidationError::EmptyTestCaseId(position));
        }
        if !seen_test_cases.insert(tc.id.as_str()) {
            return Err(ValidationError::DuplicateTestCaseId(tc.id.clone()));
        }
        if tc.expected_output.trim().is_empty() {
            return Err(ValidationError::MissingExpectedOutput(tc.id.clone()));
        }
    }

    let mut seen_hints = HashSet::with_capacity(exercise.hints.len());
    for (position, hint) in exercise.hints.iter().enumerate() {
        if hint.id.trim().is_empty() {
            return Err(ValidationError::EmptyHintId(position));
        }
        if !seen_hints.insert(hint.id.as_str()) {
            return Err(ValidationError::DuplicateHintId(hint.id.clone()));
        }
    }

    if exercise.points == 0 {
        return Err(ValidationError::NonPositivePoints);
    }
    if exercise.total_test_points() == 0 {
        return Err(ValidationError::NoScorableTestCases);
    }

    if exercise.allow_execution {
        validate_limits(exercise, bounds)?;
    }

    Ok(())
}

fn validate_limits(exercise: &Exercise, bounds: &ExerciseBounds) -> Result<(), ValidationError> {
    if let Some(time) = exercise.time_limit_secs
        && !(bounds.min_time_limit_secs..=bounds.max_time_limit_secs).contains(&time)
    {
        return Err(ValidationError::TimeLimitOutOfBounds {
            actual: time,
            min: bounds.min_time_limit_secs,
            max: bounds.max_time_limit_secs,
        });
    }
    if let Some(memory) = exercise.memory_limit_mb
        && !(bounds.min_memory_limit_mb..=bounds.max_memory_limit_mb).contains(&memory)
    {
        return Err(ValidationError::MemoryLimitOutOfBounds {
            actual: memory,
            min: bounds.min_memory_limit_mb,
            max: bounds.max_memory_limit_mb,
        });
    }
    Ok(())
}
