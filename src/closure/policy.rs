//! Externalization policy.
//!
//! Two independent directives decide, per build, what ends up listed in the
//! emitted manifest rather than inlined into the bundle: one for workspace
//! projects and one for registry packages. Their defaults are deliberately
//! asymmetric (see `ExternalizationPolicy`).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::core::workspace::Workspace;

/// An externalization directive: `"all"`, `"none"` (or absent), or an
/// explicit list of identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Directive {
    #[default]
    None,
    All,
    List(Vec<String>),
}

impl Directive {
    pub fn is_none(&self) -> bool {
        matches!(self, Directive::None)
    }
}

impl<'de> Deserialize<'de> for Directive {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Word(String),
            List(Vec<String>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Word(word) if word == "all" => Ok(Directive::All),
            Raw::Word(word) if word == "none" => Ok(Directive::None),
            Raw::Word(word) => Err(serde::de::Error::custom(format!(
                "invalid directive '{word}'; expected 'all', 'none', or a list"
            ))),
            Raw::List(entries) => Ok(Directive::List(entries)),
        }
    }
}

impl FromStr for Directive {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "none" => Ok(Directive::None),
            "all" => Ok(Directive::All),
            list => Ok(Directive::List(
                list.split(',')
                    .map(|entry| entry.trim().to_string())
                    .filter(|entry| !entry.is_empty())
                    .collect(),
            )),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::None => write!(f, "none"),
            Directive::All => write!(f, "all"),
            Directive::List(entries) => write!(f, "{}", entries.join(",")),
        }
    }
}

/// The computed, per-build externalization table. Immutable once built.
///
/// Defaults are asymmetric by contract: an absent project directive means
/// every workspace project is inlined (externalize nothing), while an
/// absent package directive means registry dependencies are inlined and
/// therefore never listed in the manifest.
#[derive(Debug, Clone)]
pub struct ExternalizationPolicy {
    /// Canonical identifiers of externalized projects, plus any allow-list
    /// entries that could not be resolved (kept verbatim, best effort).
    externalized_projects: BTreeSet<String>,

    /// Listing directive for registry packages.
    registry_packages: Directive,
}

impl ExternalizationPolicy {
    /// Compute the policy for one build.
    pub fn compute(
        workspace: &Workspace,
        workspace_projects: &Directive,
        registry_packages: &Directive,
    ) -> Self {
        let mut externalized_projects = BTreeSet::new();

        match workspace_projects {
            Directive::None => {}
            Directive::All => {
                for project in workspace.projects() {
                    if project.is_library() {
                        externalized_projects.insert(project.canonical_id(workspace.scope()));
                    }
                }
            }
            Directive::List(entries) => {
                // Every spelling a directive entry may use, resolved to the
                // canonical identifier.
                let mut aliases: BTreeMap<String, String> = BTreeMap::new();
                for project in workspace.projects() {
                    if !project.is_library() {
                        continue;
                    }
                    let canonical = project.canonical_id(workspace.scope());
                    for alias in [
                        canonical.clone(),
                        project.name.clone(),
                        project.normalized_root().to_string(),
                        project.root.clone(),
                        project.source_root.clone(),
                    ] {
                        aliases.entry(alias).or_insert_with(|| canonical.clone());
                    }
                }

                for entry in entries {
                    match aliases.get(entry) {
                        Some(canonical) => {
                            externalized_projects.insert(canonical.clone());
                        }
                        None => {
                            // Unresolvable entries are kept verbatim; the
                            // project may have been deleted while the
                            // directive still names it.
                            externalized_projects.insert(entry.clone());
                        }
                    }
                }
            }
        }

        ExternalizationPolicy {
            externalized_projects,
            registry_packages: registry_packages.clone(),
        }
    }

    /// Whether a workspace project (by canonical id) is externalized.
    pub fn is_project_externalized(&self, canonical_id: &str) -> bool {
        self.externalized_projects.contains(canonical_id)
    }

    /// Whether a registry package should be listed in the manifest.
    pub fn lists_registry_package(&self, name: &str) -> bool {
        match &self.registry_packages {
            Directive::None => false,
            Directive::All => true,
            Directive::List(entries) => entries.iter().any(|entry| entry == name),
        }
    }
}
