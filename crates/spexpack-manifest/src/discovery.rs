//! Locate manifest files on disk
//!
//! Upward search finds the manifest governing the current directory; the
//! tree walk finds every manifest below a root, for auditing a checkout
//! that carries several packages.

use crate::audit::{audit, AuditReport};
use crate::types::{ProjectManifest, MANIFEST_FILE_NAME};
use anyhow::{anyhow, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

// Directories that never contain a manifest worth auditing
const PRUNED_DIRS: &[&str] = &[
    ".git",
    ".tox",
    ".venv",
    "venv",
    "build",
    "dist",
    "target",
    "node_modules",
    "__pycache__",
];

/// Walk up from `start` to the nearest directory containing a manifest
pub fn locate_manifest(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        let candidate = dir.join(MANIFEST_FILE_NAME);
        if candidate.is_file() {
            debug!("Found manifest at {:?}", candidate);
            return Some(candidate);
        }
        current = dir.parent();
    }
    None
}

/// Find every manifest file under `root`, pruned and sorted
pub fn find_manifests(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(anyhow!("not a directory: {}", root.display()));
    }

    let mut manifests: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            !(entry.file_type().is_dir()
                && (PRUNED_DIRS.contains(&name.as_ref())
                    || (name.starts_with('.') && entry.depth() > 0)))
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file() && entry.file_name().to_string_lossy() == MANIFEST_FILE_NAME
        })
        .map(|entry| entry.into_path())
        .collect();

    manifests.sort();
    Ok(manifests)
}

/// Audit result for one discovered manifest
#[derive(Debug)]
pub struct TreeAudit {
    pub path: PathBuf,
    /// The audit report, or the load error that prevented one
    pub outcome: std::result::Result<AuditReport, String>,
}

/// Audit every manifest under `root` in parallel
pub fn audit_tree(root: &Path) -> Result<Vec<TreeAudit>> {
    let manifests = find_manifests(root)?;
    debug!("Auditing {} manifests under {:?}", manifests.len(), root);

    let mut audits: Vec<TreeAudit> = manifests
        .into_par_iter()
        .map(|path| {
            let outcome = ProjectManifest::load_from_path(&path)
                .map(|manifest| audit(&manifest))
                .map_err(|e| e.to_string());
            TreeAudit { path, outcome }
        })
        .collect();

    audits.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(audits)
}
