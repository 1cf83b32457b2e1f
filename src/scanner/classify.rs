//! Classification of raw module specifiers.
//!
//! A specifier names either another workspace project (by canonical scoped
//! identifier or a sub-path of one), a relative file, or a registry package.

use crate::core::project::ProjectNode;

/// What a module specifier points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleRef {
    /// Another workspace project, identified by project name.
    WorkspaceProject(String),
    /// A relative path; carries no dependency meaning.
    Relative,
    /// A registry package.
    Registry(String),
}

/// Classify a specifier against the workspace's projects.
///
/// A specifier matches a project when it equals the project's canonical
/// identifier or is a `/`- or `#`-separated sub-path of it. Exact equality
/// wins over sub-path matches; among sub-path matches the first project in
/// stable order is used.
pub fn classify(specifier: &str, scope: &str, projects: &[ProjectNode]) -> ModuleRef {
    let exact = projects
        .iter()
        .find(|p| specifier == p.canonical_id(scope));
    let matched = exact.or_else(|| {
        projects.iter().find(|p| {
            let canonical = p.canonical_id(scope);
            specifier.starts_with(&format!("{canonical}/"))
                || specifier.starts_with(&format!("{canonical}#"))
        })
    });

    if let Some(project) = matched {
        return ModuleRef::WorkspaceProject(project.name.clone());
    }

    if specifier.starts_with('.') {
        return ModuleRef::Relative;
    }

    ModuleRef::Registry(specifier.to_string())
}
