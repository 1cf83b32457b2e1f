//! Manifest generation for one deployable project.
//!
//! Ties the pieces together: compute the externalization policy, run the
//! closure calculator, resolve the output directory, and hand the result
//! to the writer. A failure here aborts this project's generation only;
//! callers generating several projects keep going.

use std::path::PathBuf;

use anyhow::Result;
use thiserror::Error;

use crate::closure::calculator::ClosureContext;
use crate::closure::policy::{Directive, ExternalizationPolicy};
use crate::core::workspace::Workspace;
use crate::ops::write_manifest::write_manifest;

/// Typed errors for manifest generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("no project named `{0}` in the workspace")]
    UnknownProject(String),
}

/// Options for one generation run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Externalization directive for workspace projects.
    pub workspace_projects: Directive,

    /// Externalization directive for registry packages.
    pub registry_packages: Directive,

    /// Output directory override; defaults to the project's configured
    /// output path.
    pub output_dir: Option<PathBuf>,
}

/// What a generation run did.
#[derive(Debug)]
pub struct GenerateOutcome {
    /// Where the manifest lives.
    pub output_dir: PathBuf,

    /// False when an existing manifest was left untouched.
    pub written: bool,
}

/// Generate the dependency-closure manifest for one project.
pub fn generate_project_manifest(
    workspace: &Workspace,
    project_name: &str,
    options: &GenerateOptions,
) -> Result<GenerateOutcome> {
    let project = workspace
        .project(project_name)
        .ok_or_else(|| GenerateError::UnknownProject(project_name.to_string()))?;

    let policy = ExternalizationPolicy::compute(
        workspace,
        &options.workspace_projects,
        &options.registry_packages,
    );

    let mut ctx = ClosureContext::new(workspace, &policy);
    let manifest = ctx.project_closure(project)?;

    let output_dir = options
        .output_dir
        .clone()
        .unwrap_or_else(|| workspace.output_dir(project));

    let written = write_manifest(workspace, &manifest, &output_dir)?;
    if written {
        tracing::info!(
            "generated {} for {}",
            output_dir.join("package.json").display(),
            project_name
        );
    } else {
        tracing::info!(
            "{} already exists for {}, left untouched",
            output_dir.join("package.json").display(),
            project_name
        );
    }

    Ok(GenerateOutcome {
        output_dir,
        written,
    })
}
