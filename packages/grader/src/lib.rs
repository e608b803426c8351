pub mod config;
pub mod error;
pub mod evaluation;
pub mod hints;
pub mod judge;
pub mod manager;
pub mod scoring;
pub mod state;
pub mod validation;
pub mod view;

pub use config::GraderAppConfig;
pub use error::{GraderError, Result, ValidationError};
pub use evaluation::Evaluator;
pub use judge::LocalProcessJudge;
pub use manager::{AccessMode, SubmissionManager, SubmitOptions};
pub use scoring::{GradeVerdict, ScoreSummary, score};
pub use state::{SubmissionEvent, TransitionPolicy};
pub use validation::validate;
pub use view::{ExerciseView, SubmissionView};
