//! Deterministic manifest serialization and output writing.
//!
//! A manifest already present at the output path is treated as
//! authoritative and skipped wholesale, including the lock-file copy.
//! Serialization orders `name`, `version`, and `description` first, then
//! every remaining key in ascending lexicographic order.

use std::path::Path;

use anyhow::{bail, Result};
use serde_json::Value;

use crate::core::manifest::PackageManifest;
use crate::core::workspace::Workspace;
use crate::util::fs;

/// Recognized lock files, copied verbatim from the workspace root.
pub const LOCK_FILES: [&str; 2] = ["yarn.lock", "package-lock.json"];

/// Keys hoisted to the front of the serialized manifest, in order.
const HOISTED_KEYS: [&str; 3] = ["name", "version", "description"];

/// Write a generated manifest into `output_dir`.
///
/// Returns `false` when a manifest already exists there and nothing was
/// written. On a fresh write, any recognized lock file at the workspace
/// root is copied alongside.
pub fn write_manifest(
    workspace: &Workspace,
    manifest: &PackageManifest,
    output_dir: &Path,
) -> Result<bool> {
    fs::ensure_dir(output_dir)?;

    let manifest_path = output_dir.join("package.json");
    if manifest_path.exists() {
        tracing::debug!(
            "manifest already exists, skipping: {}",
            manifest_path.display()
        );
        return Ok(false);
    }

    fs::write_string(&manifest_path, &render_manifest(manifest)?)?;

    for lock in LOCK_FILES {
        let source = workspace.root().join(lock);
        if source.exists() {
            fs::copy_file(&source, &output_dir.join(lock))?;
        }
    }

    Ok(true)
}

/// Serialize a manifest with deterministic key ordering.
pub fn render_manifest(manifest: &PackageManifest) -> Result<String> {
    let value = serde_json::to_value(manifest)?;
    let Value::Object(map) = &value else {
        bail!("manifest did not serialize to an object");
    };

    let mut ordered: Vec<(&String, &Value)> = Vec::with_capacity(map.len());
    for key in HOISTED_KEYS {
        if let Some(entry) = map.get_key_value(key) {
            ordered.push(entry);
        }
    }
    // serde_json's map iterates in sorted key order already.
    for (key, entry) in map {
        if !HOISTED_KEYS.contains(&key.as_str()) {
            ordered.push((key, entry));
        }
    }

    let mut out = String::new();
    write_object(&mut out, &ordered, 1)?;
    out.push('\n');
    Ok(out)
}

fn write_object(out: &mut String, entries: &[(&String, &Value)], depth: usize) -> Result<()> {
    if entries.is_empty() {
        out.push_str("{}");
        return Ok(());
    }

    out.push_str("{\n");
    for (i, (key, value)) in entries.iter().enumerate() {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&serde_json::to_string(key)?);
        out.push_str(": ");
        write_value(out, value, depth)?;
        if i + 1 < entries.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str(&"  ".repeat(depth - 1));
    out.push('}');
    Ok(())
}

fn write_value(out: &mut String, value: &Value, depth: usize) -> Result<()> {
    match value {
        Value::Object(map) => {
            let entries: Vec<(&String, &Value)> = map.iter().collect();
            write_object(out, &entries, depth + 1)
        }
        Value::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return Ok(());
            }
            out.push_str("[\n");
            for (i, item) in items.iter().enumerate() {
                out.push_str(&"  ".repeat(depth + 1));
                write_value(out, item, depth + 1)?;
                if i + 1 < items.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            out.push_str(&"  ".repeat(depth));
            out.push(']');
            Ok(())
        }
        leaf => {
            out.push_str(&serde_json::to_string(leaf)?);
            Ok(())
        }
    }
}
