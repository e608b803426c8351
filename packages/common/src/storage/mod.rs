mod error;
mod traits;

pub mod filesystem;
pub mod memory;

pub use error::StoreError;
pub use filesystem::FilesystemStore;
pub use memory::InMemoryStore;
pub use traits::{ExerciseStore, SubmissionStore};
