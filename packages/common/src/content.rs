use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::exercise::Exercise;

/// A single quiz question with its accepted answer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_option: usize,
}

/// Course content item, keyed by content type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LessonContent {
    Video {
        url: String,
        duration_secs: u32,
    },
    Document {
        url: String,
        #[serde(default)]
        pages: Option<u32>,
    },
    Quiz {
        questions: Vec<QuizQuestion>,
        /// Minimum number of correct answers to pass.
        pass_mark: u32,
    },
    LiveSession {
        starts_at: DateTime<Utc>,
        meeting_url: String,
    },
    Assignment {
        instructions: String,
        max_points: u32,
        #[serde(default)]
        due_at: Option<DateTime<Utc>>,
    },
    InteractiveCode(Exercise),
}

impl LessonContent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Video { .. } => "video",
            Self::Document { .. } => "document",
            Self::Quiz { .. } => "quiz",
            Self::LiveSession { .. } => "live_session",
            Self::Assignment { .. } => "assignment",
            Self::InteractiveCode(_) => "interactive_code",
        }
    }

    /// The exercise carried by interactive-code content.
    pub fn as_exercise(&self) -> Option<&Exercise> {
        match self {
            Self::InteractiveCode(exercise) => Some(exercise),
            _ => None,
        }
    }
}
