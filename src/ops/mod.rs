//! High-level operations.

pub mod generate;
pub mod write_manifest;

pub use generate::{generate_project_manifest, GenerateError, GenerateOptions, GenerateOutcome};
pub use write_manifest::{render_manifest, write_manifest, LOCK_FILES};
