//! `package.json` manifest parsing and schema.
//!
//! The manifest model keeps the four dependency sections typed and passes
//! every other field through untouched, so authored manifests survive a
//! read/augment/write cycle without losing metadata.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Package name to version string, as it appears in a dependency section.
pub type DependencySet = BTreeMap<String, String>;

/// Descriptive fields inherited from the workspace root manifest when a
/// project's own manifest does not set them.
pub const INHERITED_FIELDS: [&str; 6] = [
    "description",
    "author",
    "bugs",
    "homepage",
    "keywords",
    "repository",
];

/// A parsed `package.json`.
///
/// Fields outside the typed set (scripts, engines, arbitrary tool config)
/// are collected into `extra` and re-emitted verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: DependencySet,

    #[serde(
        default,
        rename = "devDependencies",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub dev_dependencies: DependencySet,

    #[serde(
        default,
        rename = "peerDependencies",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub peer_dependencies: DependencySet,

    #[serde(
        default,
        rename = "optionalDependencies",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub optional_dependencies: DependencySet,

    /// Everything else, preserved as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl PackageManifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Load a manifest, treating a missing file as an empty manifest.
    ///
    /// A project without its own `package.json` is not an error; all of
    /// its fields are filled from the workspace root at assembly time.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(PackageManifest::default());
        }
        Self::load(path)
    }

    /// Parse manifest content.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(content)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    /// Consolidate every dependency section of the given manifests into a
    /// single name-to-version map.
    ///
    /// Within one manifest the section precedence (lowest to highest) is
    /// devDependencies, optionalDependencies, peerDependencies,
    /// dependencies. Across manifests, later entries in the slice overwrite
    /// earlier ones for the same key.
    pub fn consolidate_versions(manifests: &[&PackageManifest]) -> DependencySet {
        let mut merged = DependencySet::new();
        for manifest in manifests {
            for section in [
                &manifest.dev_dependencies,
                &manifest.optional_dependencies,
                &manifest.peer_dependencies,
                &manifest.dependencies,
            ] {
                for (name, version) in section {
                    merged.insert(name.clone(), version.clone());
                }
            }
        }
        merged
    }

    /// Merge another manifest's dependency sections into this one.
    ///
    /// First writer wins: a key already present in a section here is never
    /// overwritten by the merged-in value.
    pub fn merge_missing_dependencies(&mut self, other: &PackageManifest) {
        for (base, merged) in [
            (&mut self.dependencies, &other.dependencies),
            (&mut self.dev_dependencies, &other.dev_dependencies),
            (&mut self.peer_dependencies, &other.peer_dependencies),
            (&mut self.optional_dependencies, &other.optional_dependencies),
        ] {
            for (name, version) in merged {
                base.entry(name.clone()).or_insert_with(|| version.clone());
            }
        }
    }

    /// Remove a package from every dependency section.
    pub fn remove_dependency(&mut self, name: &str) {
        self.dependencies.remove(name);
        self.dev_dependencies.remove(name);
        self.peer_dependencies.remove(name);
        self.optional_dependencies.remove(name);
    }

    /// Apply a rewrite to every dependency version string.
    pub fn rewrite_dependency_versions(&mut self, rewrite: impl Fn(&str) -> Option<String>) {
        for section in [
            &mut self.dependencies,
            &mut self.dev_dependencies,
            &mut self.peer_dependencies,
            &mut self.optional_dependencies,
        ] {
            for version in section.values_mut() {
                if let Some(rewritten) = rewrite(version) {
                    *version = rewritten;
                }
            }
        }
    }
}
