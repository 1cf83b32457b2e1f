//! Stowage - dependency-closure and manifest generation for JS/TS monorepos
//!
//! This crate statically analyzes each workspace project's sources for module
//! references, decides which internal projects get inlined versus listed as
//! dependencies, resolves version strings through a layered precedence chain,
//! and emits a minimal deterministic `package.json` for each deployable
//! project's build output.

pub mod closure;
pub mod core;
pub mod ops;
pub mod scanner;
pub mod util;

pub use crate::core::{
    manifest::PackageManifest, project::ProjectKind, project::ProjectNode, workspace::Workspace,
};

pub use crate::closure::policy::{Directive, ExternalizationPolicy};
pub use crate::ops::generate::{generate_project_manifest, GenerateOptions};
