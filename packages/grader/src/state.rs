//! Submission lifecycle.
//!
//! ```text
//! DRAFT ──submit──▶ SUBMITTED ──grade──▶ GRADED ──conclude──▶ PASSED | FAILED
//!   ▲  save/run/reset                                              │
//!   └──────────────── resubmit (multiple submissions only) ◀───────┘
//! ```
//!
//! Every transition not listed is rejected with `SubmissionLocked` and the
//! status is left untouched.

use std::fmt;

use common::{Exercise, SubmissionStatus};

use crate::error::{GraderError, Result};
use crate::scoring::GradeVerdict;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionEvent {
    SaveDraft,
    Run,
    Reset,
    Submit,
    Grade,
    Conclude(GradeVerdict),
    Resubmit,
}

impl SubmissionEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SaveDraft => "save",
            Self::Run => "run",
            Self::Reset => "reset",
            Self::Submit => "submit",
            Self::Grade => "grade",
            Self::Conclude(_) => "conclude",
            Self::Resubmit => "resubmit",
        }
    }
}

impl fmt::Display for SubmissionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exercise settings that influence which transitions are legal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransitionPolicy {
    pub allow_multiple_submissions: bool,
}

impl From<&Exercise> for TransitionPolicy {
    fn from(exercise: &Exercise) -> Self {
        Self {
            allow_multiple_submissions: exercise.allow_multiple_submissions,
        }
    }
}

/// Compute the status after `event`, or reject the transition.
pub fn transition(
    from: SubmissionStatus,
    event: SubmissionEvent,
    policy: TransitionPolicy,
) -> Result<SubmissionStatus> {
    use SubmissionEvent as E;
    use SubmissionStatus as S;

    match (from, event) {
        (S::Draft, E::SaveDraft | E::Run | E::Reset) => Ok(S::Draft),
        (S::Draft, E::Submit) => Ok(S::Submitted),
        (S::Submitted, E::Grade) => Ok(S::Graded),
        (S::Graded, E::Conclude(verdict)) => Ok(verdict.status()),
        (S::Submitted | S::Graded | S::Passed | S::Failed, E::Resubmit)
            if policy.allow_multiple_submissions =>
        {
            Ok(S::Draft)
        }
        (status, event) => Err(GraderError::SubmissionLocked { status, event }),
    }
}

/// Bring a handed-in submission back to `DRAFT` so that `event` can proceed.
///
/// Drafts pass through unchanged. Handed-in submissions reopen only when the
/// exercise allows multiple submissions; otherwise `event` is rejected.
pub fn reopen_for(
    from: SubmissionStatus,
    event: SubmissionEvent,
    policy: TransitionPolicy,
) -> Result<SubmissionStatus> {
    if !from.is_handed_in() {
        return Ok(from);
    }
    transition(from, SubmissionEvent::Resubmit, policy)
        .map_err(|_| GraderError::SubmissionLocked { status: from, event })
}
