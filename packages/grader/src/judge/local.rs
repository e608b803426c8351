//! Simple judge for development.
//!
//! Compiles and runs code using system toolchains (no sandbox). Compiled
//! artifacts are cached by code fingerprint so the test cases of one run
//! share a single compilation.
//!
//! Compilation happens in `prepare`, outside the per-call time limit, and is
//! bounded by its own timeout. Exercise limits cover only running the
//! program. If the build has to happen inside `execute` (the cache entry was
//! evicted or a judge-side fault dropped it) it counts against that call.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use common::judge::TestExecutionOutcome;
use common::{
    CodeFingerprint, ExecutionLimits, ExecutionReport, JudgeClient, JudgeFailure, JudgeRequest,
    Language,
};
use lru::LruCache;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use uuid::Uuid;

const COMPILE_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CACHE_CAPACITY: usize = 32;
const EXECUTABLE: &str = "solution";

type ArtifactKey = (Language, CodeFingerprint);
type ArtifactCell = Arc<OnceCell<Result<Arc<Artifact>, JudgeFailure>>>;

/// A working directory holding one program, removed on drop.
#[derive(Debug)]
struct Artifact {
    dir: PathBuf,
    language: Language,
}

impl Artifact {
    async fn create(work_dir: &Path, language: Language, code: &str) -> Result<Self, JudgeFailure> {
        let dir = work_dir.join(format!("grader-judge-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            JudgeFailure::InternalJudgeError(format!(
                "Failed to create temp dir {}: {e}",
                dir.display()
            ))
        })?;

        // Owned from here on so a failed write still cleans up.
        let artifact = Self { dir, language };
        let source = artifact.source_path();
        tokio::fs::write(&source, code).await.map_err(|e| {
            JudgeFailure::InternalJudgeError(format!(
                "Failed to write {}: {e}",
                source.display()
            ))
        })?;
        Ok(artifact)
    }

    fn source_path(&self) -> PathBuf {
        self.dir.join(self.language.source_filename())
    }

    /// Build step. Interpreted languages get a syntax check instead.
    fn compile_command(&self) -> (&'static str, Vec<String>) {
        let source = self.source_path().to_string_lossy().into_owned();
        let exe = self.dir.join(EXECUTABLE).to_string_lossy().into_owned();
        let args = |args: &[&str]| args.iter().map(|a| a.to_string()).collect::<Vec<_>>();

        match self.language {
            Language::Python => ("python3", args(&["-m", "py_compile", &source])),
            Language::JavaScript => ("node", args(&["--check", &source])),
            Language::Java => ("javac", args(&[&source])),
            Language::Cpp => ("g++", args(&["-O2", "-std=c++17", "-o", &exe, &source])),
            Language::C => ("gcc", args(&["-O2", "-std=c17", "-o", &exe, &source])),
            Language::Rust => ("rustc", args(&["-O", "-o", &exe, &source])),
        }
    }

    fn run_command(&self, limits: ExecutionLimits) -> Command {
        let source = self.source_path();
        let mut command = match self.language {
            Language::Python => {
                let mut c = Command::new("python3");
                c.arg(&source);
                c
            }
            Language::JavaScript => {
                let mut c = Command::new("node");
                c.arg(&source);
                c
            }
            Language::Java => {
                let mut c = Command::new("java");
                c.arg(format!("-Xmx{}m", limits.memory_limit_mb))
                    .arg("-cp")
                    .arg(&self.dir)
                    .arg("Main");
                c
            }
            Language::Cpp | Language::C | Language::Rust => Command::new(self.dir.join(EXECUTABLE)),
        };
        command.current_dir(&self.dir);
        command
    }

    async fn compile(&self) -> Result<(), JudgeFailure> {
        let (program, args) = self.compile_command();

        let output = tokio::time::timeout(
            COMPILE_TIMEOUT,
            Command::new(program)
                .args(&args)
                .current_dir(&self.dir)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| JudgeFailure::CompileError("Compilation timed out".into()))?
        .map_err(|e| JudgeFailure::InternalJudgeError(format!("{program} not found: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            return Err(JudgeFailure::CompileError(format!("{stderr}{stdout}")));
        }
        Ok(())
    }
}

impl Drop for Artifact {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(&self.dir) {
            debug!(dir = %self.dir.display(), error = %e, "Failed to remove judge temp dir");
        }
    }
}

/// Runs code as a local child process.
pub struct LocalProcessJudge {
    work_dir: PathBuf,
    artifacts: Mutex<LruCache<ArtifactKey, ArtifactCell>>,
}

impl LocalProcessJudge {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self::with_cache_capacity(work_dir, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(work_dir: impl Into<PathBuf>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            work_dir: work_dir.into(),
            artifacts: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn cache(&self) -> MutexGuard<'_, LruCache<ArtifactKey, ArtifactCell>> {
        match self.artifacts.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn artifact_cell(&self, key: ArtifactKey) -> ArtifactCell {
        let mut cache = self.cache();
        if let Some(cell) = cache.get(&key) {
            return cell.clone();
        }
        let cell = ArtifactCell::default();
        cache.put(key, cell.clone());
        cell
    }

    /// Compile once per (language, code); concurrent callers share the result.
    async fn artifact(&self, language: Language, code: &str) -> Result<Arc<Artifact>, JudgeFailure> {
        let fingerprint = CodeFingerprint::compute(code);
        let key = (language, fingerprint);
        let cell = self.artifact_cell(key);
        let artifact = cell
            .get_or_init(|| self.build(language, code, fingerprint))
            .await
            .clone();

        // Judge-side faults must not stick to the code.
        if let Err(failure) = &artifact
            && failure.is_retryable()
        {
            self.cache().pop(&key);
        }
        artifact
    }

    async fn build(
        &self,
        language: Language,
        code: &str,
        fingerprint: CodeFingerprint,
    ) -> Result<Arc<Artifact>, JudgeFailure> {
        debug!(%language, fingerprint = %fingerprint.short(), "Compiling");
        let artifact = Artifact::create(&self.work_dir, language, code).await?;
        artifact.compile().await?;
        Ok(Arc::new(artifact))
    }
}

impl Default for LocalProcessJudge {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

#[async_trait]
impl JudgeClient for LocalProcessJudge {
    async fn prepare(&self, code: &str, language: Language) -> Result<(), JudgeFailure> {
        self.artifact(language, code).await.map(|_| ())
    }

    async fn execute(&self, request: JudgeRequest) -> TestExecutionOutcome {
        let artifact = self.artifact(request.language, &request.code).await?;
        run_test_case(&artifact, &request.input, request.limits).await
    }
}

async fn run_test_case(
    artifact: &Artifact,
    input: &str,
    limits: ExecutionLimits,
) -> TestExecutionOutcome {
    let start = Instant::now();

    let mut child = artifact
        .run_command(limits)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| JudgeFailure::InternalJudgeError(format!("Failed to execute program: {e}")))?;

    if let Some(mut stdin) = child.stdin.take() {
        let input = input.as_bytes().to_vec();
        tokio::spawn(async move {
            // The program may exit without reading its input.
            let _ = stdin.write_all(&input).await;
        });
    }

    let output = match tokio::time::timeout(limits.time_limit(), child.wait_with_output()).await {
        Ok(output) => output.map_err(|e| {
            JudgeFailure::InternalJudgeError(format!("Failed to collect program output: {e}"))
        })?,
        Err(_) => return Err(JudgeFailure::TimeLimitExceeded),
    };
    let execution_time_ms = start.elapsed().as_millis() as u64;

    if !output.status.success() {
        debug!(exit_code = ?output.status.code(), "Program exited with non-zero status");
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
        let message = if stderr.is_empty() {
            match output.status.code() {
                Some(code) => format!("exited with code {code}"),
                None => "terminated by signal".to_string(),
            }
        } else {
            stderr
        };
        return Err(JudgeFailure::RuntimeError(message));
    }

    if !output.stderr.is_empty() {
        warn!(bytes = output.stderr.len(), "Program wrote to stderr");
    }

    Ok(ExecutionReport {
        actual_output: String::from_utf8_lossy(&output.stdout).into_owned(),
        execution_time_ms,
        // Not measured without a sandbox.
        memory_usage_bytes: 0,
    })
}
