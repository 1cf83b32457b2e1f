//! Workspace project records and canonical identifiers.
//!
//! A project is addressed from source code through its canonical scoped
//! identifier, `@{scope}/{normalized root}`. The normalized root drops the
//! leading grouping directory (`apps/` or `libs/`) from the project root.

use serde::Deserialize;

/// Project kind as declared in the workspace descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Application,
    #[default]
    Library,
}

/// One project of the workspace.
#[derive(Debug, Clone)]
pub struct ProjectNode {
    /// Project name as it appears in the workspace descriptor.
    pub name: String,

    /// Project root, relative to the workspace root (forward slashes).
    pub root: String,

    /// Source root, relative to the workspace root. Falls back to `root`
    /// when the descriptor omits it.
    pub source_root: String,

    /// Application or library.
    pub kind: ProjectKind,

    /// Build output directory override, relative to the workspace root.
    pub output_path: Option<String>,
}

impl ProjectNode {
    /// The project root with its leading grouping segment removed.
    ///
    /// `apps/api` becomes `api`, `libs/shared/util` becomes `shared/util`.
    /// A single-segment root is used as-is.
    pub fn normalized_root(&self) -> &str {
        match self.root.split_once('/') {
            Some((_, rest)) if !rest.is_empty() => rest,
            _ => &self.root,
        }
    }

    /// The canonical scoped identifier used to import this project.
    pub fn canonical_id(&self, scope: &str) -> String {
        format!("@{}/{}", scope, self.normalized_root())
    }

    /// Whether this project is a library.
    pub fn is_library(&self) -> bool {
        self.kind == ProjectKind::Library
    }
}
