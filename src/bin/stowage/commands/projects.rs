//! `stowage projects` command

use anyhow::Result;

use crate::cli::ProjectsArgs;
use stowage::{ProjectKind, Workspace};

pub fn execute(args: ProjectsArgs) -> Result<()> {
    let workspace = Workspace::load(&args.workspace_root)?;

    for project in workspace.projects() {
        let kind = match project.kind {
            ProjectKind::Application => "application",
            ProjectKind::Library => "library",
        };
        println!(
            "{:<24} {:<12} {}  ({})",
            project.name,
            kind,
            project.canonical_id(workspace.scope()),
            project.root
        );
    }

    Ok(())
}
