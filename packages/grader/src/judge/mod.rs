//! Judge implementations shipped with the grader.
//!
//! Production deployments plug their own sandboxed `JudgeClient` into the
//! manager; the local judge is meant for development and the CLI.

pub mod local;

pub use local::LocalProcessJudge;
