//! Core data model: package manifests, workspace projects, and the
//! workspace itself.

pub mod manifest;
pub mod project;
pub mod workspace;

pub use manifest::{DependencySet, PackageManifest};
pub use project::{ProjectKind, ProjectNode};
pub use workspace::Workspace;
