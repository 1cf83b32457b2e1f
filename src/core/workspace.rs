//! Workspace - central configuration hub.
//!
//! A Workspace holds the root path, the npm scope, the project table parsed
//! from `workspace.json`, the workspace root manifest, and the module
//! registry directory used for installed-package version lookups.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use walkdir::WalkDir;

use crate::core::manifest::PackageManifest;
use crate::core::project::{ProjectKind, ProjectNode};

/// Name of the workspace descriptor file.
pub const WORKSPACE_FILE: &str = "workspace.json";

/// Raw workspace descriptor as deserialized from JSON.
#[derive(Debug, Deserialize)]
struct WorkspaceConfig {
    #[serde(rename = "npmScope")]
    npm_scope: String,

    projects: BTreeMap<String, ProjectConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectConfig {
    root: String,

    #[serde(default)]
    source_root: Option<String>,

    #[serde(default)]
    project_type: ProjectKind,

    #[serde(default)]
    output_path: Option<String>,
}

/// A workspace: one multi-project source tree sharing one root
/// configuration and one module registry.
#[derive(Debug)]
pub struct Workspace {
    /// Workspace root directory
    root: PathBuf,

    /// npm scope without the leading `@`
    scope: String,

    /// Projects in stable (name-sorted) order
    projects: Vec<ProjectNode>,

    /// Workspace root package.json
    root_manifest: PackageManifest,

    /// Installed-package registry directory
    registry_dir: PathBuf,
}

impl Workspace {
    /// Load a workspace from its root directory.
    pub fn load(root: &Path) -> Result<Self> {
        let descriptor_path = root.join(WORKSPACE_FILE);
        let content = std::fs::read_to_string(&descriptor_path).with_context(|| {
            format!(
                "failed to read workspace descriptor: {}",
                descriptor_path.display()
            )
        })?;

        let config: WorkspaceConfig = serde_json::from_str(&content).with_context(|| {
            format!(
                "failed to parse workspace descriptor: {}",
                descriptor_path.display()
            )
        })?;

        let projects = config
            .projects
            .into_iter()
            .map(|(name, project)| {
                let source_root = project
                    .source_root
                    .unwrap_or_else(|| project.root.clone());
                ProjectNode {
                    name,
                    root: project.root,
                    source_root,
                    kind: project.project_type,
                    output_path: project.output_path,
                }
            })
            .collect();

        let root_manifest = PackageManifest::load_or_default(&root.join("package.json"))?;
        let registry_dir = root.join("node_modules");

        Ok(Workspace {
            root: root.to_path_buf(),
            scope: config.npm_scope,
            projects,
            root_manifest,
            registry_dir,
        })
    }

    /// Override the module registry directory.
    pub fn with_registry_dir(mut self, registry_dir: PathBuf) -> Self {
        self.registry_dir = registry_dir;
        self
    }

    /// Get the workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the npm scope (without the leading `@`).
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Get all projects in stable order.
    pub fn projects(&self) -> &[ProjectNode] {
        &self.projects
    }

    /// Look up a project by name.
    pub fn project(&self, name: &str) -> Option<&ProjectNode> {
        self.projects.iter().find(|p| p.name == name)
    }

    /// Get the workspace root manifest.
    pub fn root_manifest(&self) -> &PackageManifest {
        &self.root_manifest
    }

    /// Get the module registry directory.
    pub fn registry_dir(&self) -> &Path {
        &self.registry_dir
    }

    /// Path to a project's own manifest (which may not exist on disk).
    pub fn project_manifest_path(&self, project: &ProjectNode) -> PathBuf {
        self.root.join(&project.root).join("package.json")
    }

    /// Read a project's own manifest, defaulting to empty when absent.
    pub fn project_manifest(&self, project: &ProjectNode) -> Result<PackageManifest> {
        PackageManifest::load_or_default(&self.project_manifest_path(project))
    }

    /// Enumerate a project's source files, sorted for determinism.
    ///
    /// Test-file and extension filtering is the scanner's concern; this
    /// returns every regular file under the source root.
    pub fn source_files(&self, project: &ProjectNode) -> Vec<PathBuf> {
        let source_root = self.root.join(&project.source_root);

        let mut files: Vec<PathBuf> = WalkDir::new(&source_root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect();
        files.sort();
        files
    }

    /// Build output directory for a project.
    ///
    /// Uses the project's configured `outputPath` when present, otherwise
    /// `dist/{project root}` under the workspace root.
    pub fn output_dir(&self, project: &ProjectNode) -> PathBuf {
        match &project.output_path {
            Some(output) => self.root.join(output),
            None => self.root.join("dist").join(&project.root),
        }
    }
}
