use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type ExerciseId = i32;

/// Programming languages an exercise can be written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    JavaScript,
    Java,
    Cpp,
    C,
    Rust,
}

impl Language {
    pub const ALL: &'static [Language] = &[
        Self::Python,
        Self::JavaScript,
        Self::Java,
        Self::Cpp,
        Self::C,
        Self::Rust,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::Java => "java",
            Self::Cpp => "cpp",
            Self::C => "c",
            Self::Rust => "rust",
        }
    }

    /// Conventional source filename used when materializing code on disk.
    pub fn source_filename(&self) -> &'static str {
        match self {
            Self::Python => "main.py",
            Self::JavaScript => "main.js",
            Self::Java => "Main.java",
            Self::Cpp => "main.cpp",
            Self::C => "main.c",
            Self::Rust => "main.rs",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLanguageError {
    invalid: String,
}

impl fmt::Display for ParseLanguageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unsupported language '{}'. Valid values: {}",
            self.invalid,
            Language::ALL
                .iter()
                .map(|l| l.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseLanguageError {}

impl FromStr for Language {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Self::Python),
            "javascript" | "js" => Ok(Self::JavaScript),
            "java" => Ok(Self::Java),
            "cpp" | "c++" => Ok(Self::Cpp),
            "c" => Ok(Self::C),
            "rust" | "rs" => Ok(Self::Rust),
            _ => Err(ParseLanguageError {
                invalid: s.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// One input/expected-output pair of an exercise.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Unique within the owning exercise.
    pub id: String,
    pub input: String,
    pub expected_output: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Hidden cases are used for scoring only and never shown before grading.
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default = "default_points")]
    pub points: u32,
}

fn default_points() -> u32 {
    1
}

/// A hint that unlocks after a number of runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hint {
    pub id: String,
    pub content: String,
    /// Disclosure sequence. Need not be contiguous.
    pub order: i32,
    /// Number of runs required before the hint can be revealed. 0 means immediately.
    #[serde(default)]
    pub reveal_after_attempts: u32,
}

impl Hint {
    pub fn is_unlocked(&self, attempts: u32) -> bool {
        self.reveal_after_attempts <= attempts
    }
}

/// Immutable definition of a coding exercise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub title: String,
    #[serde(default)]
    pub prompt: String,
    pub language: Language,
    #[serde(default)]
    pub starter_code: String,
    /// Reference solution. Never shown to students unless disclosure is enabled.
    #[serde(default)]
    pub solution_code: Option<String>,
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub hints: Vec<Hint>,
    #[serde(default = "default_allow_execution")]
    pub allow_execution: bool,
    /// Per judge call wall-clock limit.
    #[serde(default)]
    pub time_limit_secs: Option<u32>,
    /// Per judge call memory limit.
    #[serde(default)]
    pub memory_limit_mb: Option<u32>,
    /// Total achievable score used for external reporting.
    pub points: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub allow_multiple_submissions: bool,
    /// Allow `submit` without a prior run of the same code.
    #[serde(default)]
    pub allow_blind_submission: bool,
    #[serde(default)]
    pub show_solution_after_grading: bool,
}

fn default_allow_execution() -> bool {
    true
}

impl Exercise {
    pub fn hint(&self, id: &str) -> Option<&Hint> {
        self.hints.iter().find(|h| h.id == id)
    }

    /// Sum of per-test-case points.
    pub fn total_test_points(&self) -> u64 {
        self.test_cases.iter().map(|tc| u64::from(tc.points)).sum()
    }

    pub fn visible_test_cases(&self) -> impl Iterator<Item = &TestCase> {
        self.test_cases.iter().filter(|tc| !tc.is_hidden)
    }
}
