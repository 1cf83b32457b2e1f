//! `stowage generate` command

use anyhow::Result;

use crate::cli::GenerateArgs;
use stowage::ops::generate::{generate_project_manifest, GenerateOptions};
use stowage::Workspace;

pub fn execute(args: GenerateArgs) -> Result<()> {
    let mut workspace = Workspace::load(&args.workspace_root)?;
    if let Some(registry_dir) = args.registry_dir {
        workspace = workspace.with_registry_dir(registry_dir);
    }

    let options = GenerateOptions {
        workspace_projects: args.externalize_projects,
        registry_packages: args.externalize_packages,
        output_dir: args.output,
    };

    let outcome = generate_project_manifest(&workspace, &args.project, &options)?;

    if outcome.written {
        println!(
            "Generated {}",
            outcome.output_dir.join("package.json").display()
        );
    } else {
        println!(
            "Up to date: {}",
            outcome.output_dir.join("package.json").display()
        );
    }

    Ok(())
}
