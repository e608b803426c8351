use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use common::content::LessonContent;
use common::storage::FilesystemStore;
use common::{Exercise, StudentId, SubmissionKey};
use grader::{
    AccessMode, Evaluator, GraderAppConfig, LocalProcessJudge, SubmissionManager, SubmitOptions,
    validate,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Run and grade code exercises locally", long_about = None)]
struct Cli {
    /// Config file path, without extension
    #[arg(long, env = "GRADER_CONFIG")]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check an exercise definition
    Validate {
        /// Exercise definition (.json or .toml)
        exercise: PathBuf,
    },
    /// Run code against the exercise's test cases
    Run {
        exercise: PathBuf,
        /// Source file to evaluate
        code: PathBuf,
        #[arg(long, default_value_t = 1)]
        student: StudentId,
    },
    /// Submit code for grading
    Submit {
        exercise: PathBuf,
        code: PathBuf,
        #[arg(long, default_value_t = 1)]
        student: StudentId,
        /// Submission deadline (RFC 3339)
        #[arg(long)]
        deadline: Option<DateTime<Utc>>,
    },
    /// Show hint disclosure status
    Hints {
        exercise: PathBuf,
        #[arg(long, default_value_t = 1)]
        student: StudentId,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => GraderAppConfig::load_from(path),
        None => GraderAppConfig::load(),
    }
    .context("Failed to load config")?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_new(&config.log.level).context("Invalid log level filter")?,
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate { exercise } => {
            let exercise = load_exercise(&exercise, &config)?;
            info!(exercise_id = exercise.id, "Exercise is valid");
            print_json(&ExerciseSummary::from(&exercise))
        }
        Commands::Run {
            exercise,
            code,
            student,
        } => {
            let (manager, key) = setup(&exercise, student, &config).await?;
            let code = read_code(&code)?;
            manager.run(key, &code, AccessMode::Editable).await?;
            print_json(&manager.student_view(key).await?)
        }
        Commands::Submit {
            exercise,
            code,
            student,
            deadline,
        } => {
            let (manager, key) = setup(&exercise, student, &config).await?;
            let code = read_code(&code)?;
            let options = SubmitOptions {
                deadline,
                now: Utc::now(),
            };
            manager
                .submit(key, &code, options, AccessMode::Editable)
                .await?;
            print_json(&manager.student_view(key).await?)
        }
        Commands::Hints { exercise, student } => {
            let (manager, key) = setup(&exercise, student, &config).await?;
            print_json(&manager.hint_status(key).await?)
        }
    }
}

/// Validate the exercise, store it and build a manager over the data directory.
async fn setup(
    exercise_path: &Path,
    student: StudentId,
    config: &GraderAppConfig,
) -> anyhow::Result<(SubmissionManager, SubmissionKey)> {
    let exercise = load_exercise(exercise_path, config)?;

    let store = FilesystemStore::new(PathBuf::from(&config.storage.data_dir))
        .await
        .with_context(|| format!("Failed to open data dir {}", config.storage.data_dir))?;
    store
        .put_exercise(&exercise)
        .await
        .context("Failed to store exercise")?;

    let judge = Arc::new(LocalProcessJudge::default());
    let evaluator = Evaluator::new(judge, config.judge.clone());
    let manager = SubmissionManager::with_store(Arc::new(store), evaluator);

    Ok((manager, SubmissionKey::new(exercise.id, student)))
}

fn load_exercise(path: &Path, config: &GraderAppConfig) -> anyhow::Result<Exercise> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let document: ExerciseDocument = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", path.display()))?,
        Some("json") => serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", path.display()))?,
        _ => bail!("Unsupported exercise format: {}", path.display()),
    };

    let exercise = match document {
        ExerciseDocument::Exercise(exercise) => exercise,
        ExerciseDocument::Lesson(content) => match content {
            LessonContent::InteractiveCode(exercise) => exercise,
            other => bail!(
                "{} holds {} content, not an interactive code exercise",
                path.display(),
                other.kind()
            ),
        },
    };

    validate(exercise, &config.limits)
        .with_context(|| format!("Invalid exercise {}", path.display()))
}

/// A bare exercise, or lesson content wrapping one.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExerciseDocument {
    Lesson(LessonContent),
    Exercise(Exercise),
}

fn read_code(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

#[derive(Serialize)]
struct ExerciseSummary<'a> {
    id: i32,
    title: &'a str,
    language: common::Language,
    test_cases: usize,
    hidden_test_cases: usize,
    test_points: u64,
    hints: usize,
    allow_execution: bool,
}

impl<'a> From<&'a Exercise> for ExerciseSummary<'a> {
    fn from(exercise: &'a Exercise) -> Self {
        Self {
            id: exercise.id,
            title: &exercise.title,
            language: exercise.language,
            test_cases: exercise.test_cases.len(),
            hidden_test_cases: exercise.test_cases.iter().filter(|tc| tc.is_hidden).count(),
            test_points: exercise.total_test_points(),
            hints: exercise.hints.len(),
            allow_execution: exercise.allow_execution,
        }
    }
}
