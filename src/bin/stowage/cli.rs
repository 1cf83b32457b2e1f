//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use stowage::Directive;

/// Stowage - deployable manifest generation for JS/TS monorepos
#[derive(Parser)]
#[command(name = "stowage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate the dependency-closure package.json for a project
    Generate(GenerateArgs),

    /// List the projects of the workspace
    Projects(ProjectsArgs),
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Project name as it appears in workspace.json
    pub project: String,

    /// Workspace-project externalization: all, none, or a comma-separated list
    #[arg(long, value_name = "DIRECTIVE", default_value = "none")]
    pub externalize_projects: Directive,

    /// Registry-package externalization: all, none, or a comma-separated list
    #[arg(long, value_name = "DIRECTIVE", default_value = "none")]
    pub externalize_packages: Directive,

    /// Output directory (defaults to the project's configured output path)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace_root: PathBuf,

    /// Module registry directory (defaults to node_modules under the root)
    #[arg(long)]
    pub registry_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct ProjectsArgs {
    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace_root: PathBuf,
}
