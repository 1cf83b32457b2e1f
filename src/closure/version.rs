//! Layered version resolution for registry packages.
//!
//! Resolution order is strict: the in-memory reference map built from the
//! workspace root manifest and the current project's manifest, then the
//! on-disk module registry, trying successively longer name prefixes. A
//! package that resolves nowhere is silently omitted.

use std::path::{Path, PathBuf};

use crate::core::manifest::{DependencySet, PackageManifest};

/// The wildcard version substituted for unresolvable externalized projects.
pub const WILDCARD: &str = "*";

/// `"0.0.0"` is a placeholder, never a real requirement; rewrite it to the
/// wildcard regardless of where it came from.
pub fn normalize_version(version: &str) -> String {
    if version == "0.0.0" {
        WILDCARD.to_string()
    } else {
        version.to_string()
    }
}

/// Resolves version strings for one project's references.
#[derive(Debug)]
pub struct VersionResolver {
    /// Consolidated name-to-version map; the project's own manifest
    /// overwrites the root manifest for the same key.
    reference: DependencySet,

    /// Installed-package registry directory.
    registry_dir: PathBuf,
}

impl VersionResolver {
    /// Build a resolver for a project.
    pub fn new(
        root_manifest: &PackageManifest,
        project_manifest: &PackageManifest,
        registry_dir: &Path,
    ) -> Self {
        VersionResolver {
            reference: PackageManifest::consolidate_versions(&[root_manifest, project_manifest]),
            registry_dir: registry_dir.to_path_buf(),
        }
    }

    /// Look up a name in the reference map only.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.reference.get(name).map(String::as_str)
    }

    /// Resolve a registry package reference.
    ///
    /// The specifier may name a sub-path of the installed package, so each
    /// successively longer `/`-prefix is tried (`@scope/a/b` tries
    /// `@scope/a` before `@scope/a/b`). The first prefix with a known
    /// version wins and becomes the dependency key. Returns `None` when no
    /// prefix resolves.
    pub fn resolve_registry_package(&self, name: &str) -> Option<(String, String)> {
        let segments: Vec<&str> = name.split('/').filter(|s| !s.is_empty()).collect();

        for end in 1..=segments.len() {
            let prefix = segments[..end].join("/");

            let version = self
                .lookup(&prefix)
                .map(str::to_string)
                .or_else(|| self.installed_version(&prefix));

            if let Some(version) = version {
                return Some((prefix, normalize_version(&version)));
            }
        }

        None
    }

    /// Read an installed package's own manifest version from the registry
    /// directory.
    fn installed_version(&self, name: &str) -> Option<String> {
        let manifest_path = self.registry_dir.join(name).join("package.json");
        if !manifest_path.exists() {
            return None;
        }

        match PackageManifest::load(&manifest_path) {
            Ok(manifest) => manifest.version,
            Err(err) => {
                tracing::debug!("unreadable installed manifest for {}: {}", name, err);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manifest(content: &str) -> PackageManifest {
        PackageManifest::parse(content, Path::new("package.json")).unwrap()
    }

    fn install(registry: &Path, name: &str, version: &str) {
        let dir = registry.join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("package.json"),
            format!(r#"{{ "name": "{name}", "version": "{version}" }}"#),
        )
        .unwrap();
    }

    #[test]
    fn test_reference_map_beats_registry() {
        let tmp = TempDir::new().unwrap();
        install(tmp.path(), "express", "9.9.9");

        let root = manifest(r#"{ "dependencies": { "express": "^4.18.0" } }"#);
        let resolver = VersionResolver::new(&root, &PackageManifest::default(), tmp.path());

        assert_eq!(
            resolver.resolve_registry_package("express"),
            Some(("express".to_string(), "^4.18.0".to_string()))
        );
    }

    #[test]
    fn test_registry_fallback() {
        let tmp = TempDir::new().unwrap();
        install(tmp.path(), "express", "4.18.2");

        let resolver = VersionResolver::new(
            &PackageManifest::default(),
            &PackageManifest::default(),
            tmp.path(),
        );

        assert_eq!(
            resolver.resolve_registry_package("express"),
            Some(("express".to_string(), "4.18.2".to_string()))
        );
    }

    #[test]
    fn test_prefix_fallback() {
        let tmp = TempDir::new().unwrap();
        install(tmp.path(), "@scope/sub", "4.5.6");

        let resolver = VersionResolver::new(
            &PackageManifest::default(),
            &PackageManifest::default(),
            tmp.path(),
        );

        // "@scope/sub/path" is unresolvable directly; the "@scope/sub"
        // prefix resolves and becomes the dependency key.
        assert_eq!(
            resolver.resolve_registry_package("@scope/sub/path"),
            Some(("@scope/sub".to_string(), "4.5.6".to_string()))
        );
    }

    #[test]
    fn test_project_manifest_overwrites_root() {
        let root = manifest(r#"{ "dependencies": { "lodash": "^4.0.0" } }"#);
        let project = manifest(r#"{ "dependencies": { "lodash": "^4.17.21" } }"#);
        let tmp = TempDir::new().unwrap();

        let resolver = VersionResolver::new(&root, &project, tmp.path());
        assert_eq!(resolver.lookup("lodash"), Some("^4.17.21"));
    }

    #[test]
    fn test_unresolvable_is_omitted() {
        let tmp = TempDir::new().unwrap();
        let resolver = VersionResolver::new(
            &PackageManifest::default(),
            &PackageManifest::default(),
            tmp.path(),
        );
        assert_eq!(resolver.resolve_registry_package("no-such-package"), None);
    }

    #[test]
    fn test_zero_version_normalized() {
        let tmp = TempDir::new().unwrap();
        install(tmp.path(), "placeholder", "0.0.0");

        let resolver = VersionResolver::new(
            &PackageManifest::default(),
            &PackageManifest::default(),
            tmp.path(),
        );
        assert_eq!(
            resolver.resolve_registry_package("placeholder"),
            Some(("placeholder".to_string(), "*".to_string()))
        );
        assert_eq!(normalize_version("1.2.3"), "1.2.3");
    }
}
