//! Dependency-set resolution for a concrete environment
//!
//! Each dependency entry whose marker is absent or true applies. For a name
//! declared as a split (multiple entries with predicates), exactly one entry
//! must apply: zero is a partition gap, two or more a partition overlap, and
//! both abort resolution. A lone conditioned entry that does not apply is
//! recorded as skipped.

use crate::errors::ResolveError;
use crate::marker::Environment;
use crate::types::ProjectManifest;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// One selected dependency constraint
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedDependency {
    pub name: Arc<str>,
    /// Selected constraint, empty when the entry pins nothing
    pub specifier: String,
    /// The raw manifest entry the constraint came from
    pub source: String,
}

/// A conditioned entry whose predicate excluded it from this environment
#[derive(Debug, Clone, Serialize)]
pub struct SkippedDependency {
    pub name: Arc<str>,
    pub marker: String,
}

/// The dependency set selected for one environment
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSet {
    pub python: String,
    pub platform: String,
    pub generated_at: String,
    pub dependencies: Vec<ResolvedDependency>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedDependency>,
}

impl ResolvedSet {
    /// Serialize this set to a JSON string
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Select exactly one constraint per distribution name for `env`
pub fn resolve(
    manifest: &ProjectManifest,
    env: &Environment,
) -> Result<ResolvedSet, ResolveError> {
    if let Some((index, message)) = manifest.parse_errors().first() {
        return Err(ResolveError::UnparsedEntry {
            index: *index,
            message: message.clone(),
        });
    }

    let python = env.python_version.to_string();
    let mut dependencies = Vec::new();
    let mut skipped = Vec::new();

    for name in manifest.dependency_names() {
        let entries = manifest.entries_for(name);
        let applicable: Vec<usize> = entries
            .iter()
            .copied()
            .filter(|&index| {
                manifest
                    .requirement_at(index)
                    .is_some_and(|requirement| requirement.applies_to(env))
            })
            .collect();

        match applicable.as_slice() {
            [index] => {
                if let Some(requirement) = manifest.requirement_at(*index) {
                    debug!("Selected entry {} for '{}'", index, name);
                    dependencies.push(ResolvedDependency {
                        name: requirement.name.clone(),
                        specifier: requirement.specifiers.to_string(),
                        source: manifest.project.dependencies[*index].to_string(),
                    });
                }
            }
            [] if entries.len() == 1 => {
                if let Some(requirement) = entries
                    .first()
                    .and_then(|&index| manifest.requirement_at(index))
                {
                    debug!("Entry for '{}' does not apply to python {}", name, python);
                    skipped.push(SkippedDependency {
                        name: requirement.name.clone(),
                        marker: requirement
                            .marker
                            .as_ref()
                            .map(|marker| marker.to_string())
                            .unwrap_or_default(),
                    });
                }
            }
            [] => {
                return Err(ResolveError::PartitionGap {
                    name: name.clone(),
                    python,
                });
            }
            multiple => {
                return Err(ResolveError::PartitionOverlap {
                    name: name.clone(),
                    python,
                    count: multiple.len(),
                });
            }
        }
    }

    Ok(ResolvedSet {
        python,
        platform: env.sys_platform.clone(),
        generated_at: chrono::Utc::now().to_rfc3339(),
        dependencies,
        skipped,
    })
}
