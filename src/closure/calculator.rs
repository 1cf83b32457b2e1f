//! The dependency-closure calculator.
//!
//! One `ClosureContext` lives for one top-level closure computation. It
//! owns the visited set shared by every recursive expansion, which is what
//! makes cyclic project references safe: a project root is registered
//! before its expansion begins, and an already-registered root is never
//! re-entered.

use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::Value;

use crate::closure::policy::ExternalizationPolicy;
use crate::closure::version::{normalize_version, VersionResolver, WILDCARD};
use crate::core::manifest::{PackageManifest, INHERITED_FIELDS};
use crate::core::project::ProjectNode;
use crate::core::workspace::Workspace;
use crate::scanner::{classify, scan_file, ModuleRef};
use crate::util::Diagnostic;

/// Provenance marker stamped onto every generated manifest.
const GENERATED_STAMP: &str =
    "This package.json was generated by stowage; do not edit it manually";

/// Traversal state of one project root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitState {
    Unvisited,
    Expanding,
    Closed,
}

/// Per-root record in the visited set: traversal state plus the project's
/// accumulating manifest.
#[derive(Debug)]
struct Node {
    state: VisitState,
    manifest: PackageManifest,
}

/// Shared state for one top-level closure computation.
pub struct ClosureContext<'a> {
    workspace: &'a Workspace,
    policy: &'a ExternalizationPolicy,

    /// Visited set, keyed by project root. Registration is idempotent.
    visited: BTreeMap<String, Node>,

    /// Versions already resolved for externalized projects, so sibling
    /// expansions don't re-read manifests or re-warn.
    resolved_projects: BTreeMap<String, String>,
}

impl<'a> ClosureContext<'a> {
    pub fn new(workspace: &'a Workspace, policy: &'a ExternalizationPolicy) -> Self {
        ClosureContext {
            workspace,
            policy,
            visited: BTreeMap::new(),
            resolved_projects: BTreeMap::new(),
        }
    }

    /// Compute the full dependency closure for a deployable project and
    /// assemble its output manifest.
    pub fn project_closure(&mut self, project: &ProjectNode) -> Result<PackageManifest> {
        self.expand(project)?;

        let mut manifest = match self.visited.get(&project.root) {
            Some(node) => node.manifest.clone(),
            None => PackageManifest::default(),
        };

        // Dependencies discovered inside inlined projects propagate upward
        // here. First writer wins: a directly-discovered version is never
        // overwritten by a transitively-merged one.
        for (root, node) in &self.visited {
            if *root != project.root {
                manifest.merge_missing_dependencies(&node.manifest);
            }
        }

        self.assemble(project, &mut manifest);
        Ok(manifest)
    }

    /// Traversal state for a project root.
    pub fn state(&self, root: &str) -> VisitState {
        self.visited
            .get(root)
            .map(|node| node.state)
            .unwrap_or(VisitState::Unvisited)
    }

    /// Expand one project: scan its sources, dispatch every reference, and
    /// record discovered dependencies in its node.
    fn expand(&mut self, project: &ProjectNode) -> Result<()> {
        if self.state(&project.root) != VisitState::Unvisited {
            return Ok(());
        }

        let workspace = self.workspace;
        let own_manifest = workspace.project_manifest(project)?;
        let resolver = VersionResolver::new(
            workspace.root_manifest(),
            &own_manifest,
            workspace.registry_dir(),
        );

        // Register before expanding; this is the cycle guard.
        self.visited.insert(
            project.root.clone(),
            Node {
                state: VisitState::Expanding,
                manifest: own_manifest,
            },
        );

        let canonical_self = project.canonical_id(workspace.scope());

        for file in workspace.source_files(project) {
            for reference in scan_file(&file) {
                match classify(&reference.specifier, workspace.scope(), workspace.projects()) {
                    ModuleRef::Relative => {}

                    ModuleRef::Registry(name) => {
                        if let Some((key, version)) = resolver.resolve_registry_package(&name) {
                            if self.policy.lists_registry_package(&key) {
                                self.add_dependency(&project.root, key, version);
                            }
                        }
                    }

                    ModuleRef::WorkspaceProject(target_name) => {
                        let Some(target) = workspace.project(&target_name) else {
                            continue;
                        };
                        let canonical = target.canonical_id(workspace.scope());
                        if canonical == canonical_self {
                            continue;
                        }

                        if self.policy.is_project_externalized(&canonical) {
                            let version = self.resolve_project_version(&resolver, target)?;
                            self.add_dependency(&project.root, canonical, version);
                        } else {
                            // Inlined into the bundle, so its references
                            // become our problem too.
                            self.expand(target)?;
                        }
                    }
                }
            }
        }

        if let Some(node) = self.visited.get_mut(&project.root) {
            node.state = VisitState::Closed;
        }
        Ok(())
    }

    fn add_dependency(&mut self, root: &str, name: String, version: String) {
        if let Some(node) = self.visited.get_mut(root) {
            node.manifest.dependencies.entry(name).or_insert(version);
        }
    }

    /// Resolve the version an externalized project gets listed at.
    fn resolve_project_version(
        &mut self,
        resolver: &VersionResolver,
        target: &ProjectNode,
    ) -> Result<String> {
        let canonical = target.canonical_id(self.workspace.scope());

        if let Some(version) = resolver.lookup(&canonical) {
            return Ok(normalize_version(version));
        }
        if let Some(version) = self.resolved_projects.get(&canonical) {
            return Ok(version.clone());
        }

        let version = match self.workspace.project_manifest(target)?.version {
            Some(version) => normalize_version(&version),
            None => {
                Diagnostic::warning(format!(
                    "cannot extract version from {}/package.json",
                    target.root
                ))
                .with_context(format!(
                    "the version is needed because {} is not bundled per the \
                     externalization directive",
                    target.root
                ))
                .with_context(format!("the version {WILDCARD} will be used instead"))
                .emit();

                WILDCARD.to_string()
            }
        };

        self.resolved_projects.insert(canonical, version.clone());
        Ok(version)
    }

    /// Fill the remaining manifest fields from the workspace root and
    /// enforce the output invariants.
    fn assemble(&self, project: &ProjectNode, manifest: &mut PackageManifest) {
        let root = self.workspace.root_manifest();
        let canonical = project.canonical_id(self.workspace.scope());

        if manifest.name.is_none() {
            manifest.name = Some(canonical.clone());
        }
        if manifest.version.is_none() {
            manifest.version = Some(root.version.clone().unwrap_or_else(|| "0.0.0".to_string()));
        }
        if manifest.license.is_none() {
            manifest.license = Some(
                root.license
                    .clone()
                    .unwrap_or_else(|| "UNLICENSED".to_string()),
            );
        }
        if manifest.private.is_none() {
            manifest.private = root.private;
        }

        for key in INHERITED_FIELDS {
            if !manifest.extra.contains_key(key) {
                if let Some(value) = root.extra.get(key) {
                    manifest.extra.insert(key.to_string(), value.clone());
                }
            }
        }

        manifest
            .extra
            .insert("_generated".to_string(), Value::String(GENERATED_STAMP.to_string()));

        // A manifest never lists its own canonical identifier, even when a
        // cycle or an authored dependent manifest reintroduces it.
        manifest.remove_dependency(&canonical);

        manifest.rewrite_dependency_versions(|version| {
            (version == "0.0.0").then(|| WILDCARD.to_string())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closure::policy::Directive;
    use std::path::Path;
    use tempfile::TempDir;

    /// Builds a tiny workspace on disk: projects `app` (application,
    /// apps/app) and `lib-a`/`lib-b` (libraries, libs/a and libs/b).
    struct Fixture {
        tmp: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            std::fs::write(
                tmp.path().join("workspace.json"),
                r#"{
  "npmScope": "acme",
  "projects": {
    "app": { "root": "apps/app", "sourceRoot": "apps/app/src", "projectType": "application" },
    "lib-a": { "root": "libs/a", "sourceRoot": "libs/a/src", "projectType": "library" },
    "lib-b": { "root": "libs/b", "sourceRoot": "libs/b/src", "projectType": "library" }
  }
}"#,
            )
            .unwrap();
            std::fs::write(
                tmp.path().join("package.json"),
                r#"{ "name": "acme", "version": "1.0.0", "license": "MIT",
     "description": "workspace root",
     "dependencies": { "pkg-x": "1.2.3", "express": "^4.18.0" } }"#,
            )
            .unwrap();
            Fixture { tmp }
        }

        fn root(&self) -> &Path {
            self.tmp.path()
        }

        fn write_source(&self, path: &str, content: &str) {
            let full = self.root().join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(full, content).unwrap();
        }

        fn write_manifest(&self, project_root: &str, content: &str) {
            let dir = self.root().join(project_root);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("package.json"), content).unwrap();
        }

        fn closure(
            &self,
            project: &str,
            projects_directive: Directive,
            packages_directive: Directive,
        ) -> PackageManifest {
            let ws = Workspace::load(self.root()).unwrap();
            let policy =
                ExternalizationPolicy::compute(&ws, &projects_directive, &packages_directive);
            let mut ctx = ClosureContext::new(&ws, &policy);
            let node = ws.project(project).unwrap();
            ctx.project_closure(node).unwrap()
        }
    }

    #[test]
    fn test_transitive_bundling() {
        let fx = Fixture::new();
        fx.write_source("apps/app/src/main.ts", r#"import a from "@acme/a";"#);
        fx.write_source("libs/a/src/index.ts", r#"import x from "pkg-x";"#);

        let manifest = fx.closure("app", Directive::None, Directive::All);

        // lib-a is inlined: its external dependency propagates upward,
        // and lib-a itself is never listed.
        assert_eq!(manifest.dependencies["pkg-x"], "1.2.3");
        assert!(!manifest.dependencies.contains_key("@acme/a"));
    }

    #[test]
    fn test_externalized_project_listed_not_expanded() {
        let fx = Fixture::new();
        fx.write_source("apps/app/src/main.ts", r#"import a from "@acme/a";"#);
        fx.write_source("libs/a/src/index.ts", r#"import x from "pkg-x";"#);
        fx.write_manifest("libs/a", r#"{ "name": "@acme/a", "version": "2.0.0" }"#);

        let manifest = fx.closure(
            "app",
            Directive::List(vec!["lib-a".to_string()]),
            Directive::All,
        );

        assert_eq!(manifest.dependencies["@acme/a"], "2.0.0");
        // lib-a was not expanded, so its own externals stay out.
        assert!(!manifest.dependencies.contains_key("pkg-x"));
    }

    #[test]
    fn test_externalized_without_version_warns_wildcard() {
        let fx = Fixture::new();
        fx.write_source("apps/app/src/main.ts", r#"import a from "@acme/a";"#);
        // lib-a has no manifest at all.

        let manifest = fx.closure(
            "app",
            Directive::List(vec!["lib-a".to_string()]),
            Directive::None,
        );
        assert_eq!(manifest.dependencies["@acme/a"], "*");
    }

    #[test]
    fn test_cycle_terminates_non_self_referential() {
        let fx = Fixture::new();
        fx.write_source("libs/a/src/index.ts", r#"import b from "@acme/b";"#);
        fx.write_source(
            "libs/b/src/index.ts",
            r#"import a from "@acme/a"; import x from "pkg-x";"#,
        );

        let manifest_a = fx.closure("lib-a", Directive::None, Directive::All);
        assert!(!manifest_a.dependencies.contains_key("@acme/a"));
        assert!(!manifest_a.dependencies.contains_key("@acme/b"));
        assert_eq!(manifest_a.dependencies["pkg-x"], "1.2.3");

        let manifest_b = fx.closure("lib-b", Directive::None, Directive::All);
        assert!(!manifest_b.dependencies.contains_key("@acme/b"));
        assert_eq!(manifest_b.dependencies["pkg-x"], "1.2.3");
    }

    #[test]
    fn test_self_import_never_listed() {
        let fx = Fixture::new();
        fx.write_source("libs/a/src/index.ts", r#"import self from "@acme/a";"#);

        let manifest = fx.closure(
            "lib-a",
            Directive::All, // even externalized, a project never lists itself
            Directive::None,
        );
        assert!(!manifest.dependencies.contains_key("@acme/a"));
    }

    #[test]
    fn test_reference_dedup_by_set_semantics() {
        let fx = Fixture::new();
        fx.write_source(
            "apps/app/src/main.ts",
            r#"
import x from "pkg-x";
const again = require("pkg-x");
require.ensure(["pkg-x"], () => {});
"#,
        );

        let manifest = fx.closure("app", Directive::None, Directive::All);
        assert_eq!(manifest.dependencies.len(), 1);
        assert_eq!(manifest.dependencies["pkg-x"], "1.2.3");
    }

    #[test]
    fn test_registry_default_inlines() {
        let fx = Fixture::new();
        fx.write_source("apps/app/src/main.ts", r#"import x from "pkg-x";"#);

        let manifest = fx.closure("app", Directive::None, Directive::None);
        assert!(manifest.dependencies.is_empty());
    }

    #[test]
    fn test_direct_discovery_beats_transitive_merge() {
        let fx = Fixture::new();
        fx.write_source(
            "apps/app/src/main.ts",
            r#"import x from "pkg-x"; import a from "@acme/a";"#,
        );
        fx.write_source("libs/a/src/index.ts", r#"import x from "pkg-x";"#);
        // lib-a pins pkg-x to a different version in its own manifest.
        fx.write_manifest("libs/a", r#"{ "dependencies": { "pkg-x": "9.9.9" } }"#);

        let manifest = fx.closure("app", Directive::None, Directive::All);
        // app's own reference map resolves pkg-x from the root manifest;
        // the transitively-merged 9.9.9 must not overwrite it.
        assert_eq!(manifest.dependencies["pkg-x"], "1.2.3");
    }

    #[test]
    fn test_assembled_defaults_and_stamp() {
        let fx = Fixture::new();
        fx.write_source("apps/app/src/main.ts", "const nothing = 1;");

        let manifest = fx.closure("app", Directive::None, Directive::None);
        assert_eq!(manifest.name.as_deref(), Some("@acme/app"));
        assert_eq!(manifest.version.as_deref(), Some("1.0.0"));
        assert_eq!(manifest.license.as_deref(), Some("MIT"));
        assert_eq!(
            manifest.extra["description"],
            Value::String("workspace root".to_string())
        );
        assert!(manifest.extra.contains_key("_generated"));
    }

    #[test]
    fn test_zero_versions_rewritten_in_output() {
        let fx = Fixture::new();
        fx.write_source("apps/app/src/main.ts", r#"import a from "@acme/a";"#);
        fx.write_source("libs/a/src/index.ts", "export const a = 1;");
        // Inlined lib-a's authored manifest carries a placeholder version.
        fx.write_manifest("libs/a", r#"{ "dependencies": { "pkg-y": "0.0.0" } }"#);

        let manifest = fx.closure("app", Directive::None, Directive::None);
        assert_eq!(manifest.dependencies["pkg-y"], "*");
    }

    #[test]
    fn test_test_files_do_not_contribute() {
        let fx = Fixture::new();
        fx.write_source("apps/app/src/main.spec.ts", r#"import x from "pkg-x";"#);
        fx.write_source(
            "apps/app/src/__tests__/helper.ts",
            r#"import e from "express";"#,
        );

        let manifest = fx.closure("app", Directive::None, Directive::All);
        assert!(manifest.dependencies.is_empty());
    }
}
