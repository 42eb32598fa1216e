//! Manifest operations - loading, saving, and record-level queries

use crate::errors::ManifestError;
use crate::requirement::{normalize_name, Requirement};
use crate::specifier::SpecifierSet;
use crate::types::ProjectManifest;
use crate::version::Version;
use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

static PYTHON_CLASSIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Programming Language :: Python :: (?P<version>[0-9]+\.[0-9]+)$")
        .expect("classifier pattern compiles")
});

impl ProjectManifest {
    /// Parse a manifest document and rebuild the runtime indexes
    pub fn from_toml_str(content: &str) -> Result<Self, ManifestError> {
        let mut manifest: ProjectManifest = toml::from_str(content)?;
        manifest.rebuild_indexes();
        Ok(manifest)
    }

    /// Load a manifest from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ManifestError> {
        debug!("Loading manifest from {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let manifest = Self::from_toml_str(&content)?;
        info!(
            "Loaded manifest for '{}' with {} dependency entries",
            manifest.project.name,
            manifest.project.dependencies.len()
        );
        Ok(manifest)
    }

    /// Save the manifest to a specific path with atomic write
    pub fn save_to_path(&self, path: &Path) -> Result<(), ManifestError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;

        // Atomic write: write to temp file then rename
        let temp_path = path.with_extension("toml.tmp");
        {
            let file = std::fs::File::create(&temp_path)?;
            let mut writer = std::io::BufWriter::with_capacity(64 * 1024, file);
            writer.write_all(content.as_bytes())?;
            writer.flush()?;
        }

        std::fs::rename(&temp_path, path)?;
        debug!("Saved manifest to {:?}", path);
        Ok(())
    }

    /// Re-parse the dependency strings and rebuild the name index.
    /// Entries that fail to parse land in `parse_errors` instead of aborting
    /// the load, so the audit can report them.
    pub fn rebuild_indexes(&mut self) {
        self.parsed.clear();
        self.parse_errors.clear();
        self.dep_index.clear();
        self.dep_order.clear();

        for (index, raw) in self.project.dependencies.iter().enumerate() {
            match Requirement::parse(raw) {
                Ok(requirement) => {
                    let key = requirement.normalized_name();
                    if !self.dep_index.contains_key(&key) {
                        self.dep_order.push(key.clone());
                    }
                    self.dep_index
                        .entry(key)
                        .or_insert_with(SmallVec::new)
                        .push(index);
                    self.parsed.push(Some(requirement));
                }
                Err(e) => {
                    self.parsed.push(None);
                    self.parse_errors.push((index, e.to_string()));
                }
            }
        }
    }

    /// Parsed entry for a raw dependency index, if it parsed
    pub fn requirement_at(&self, index: usize) -> Option<&Requirement> {
        self.parsed.get(index).and_then(|slot| slot.as_ref())
    }

    /// All parsed dependency entries in declaration order
    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.parsed.iter().filter_map(|slot| slot.as_ref())
    }

    /// Dependency strings that failed to parse: (index, reason)
    pub fn parse_errors(&self) -> &[(usize, String)] {
        &self.parse_errors
    }

    /// Normalized distribution names in first-seen order
    pub fn dependency_names(&self) -> &[String] {
        &self.dep_order
    }

    /// Entry indexes declared for a distribution name (normalized lookup)
    pub fn entries_for(&self, name: &str) -> &[usize] {
        self.dep_index
            .get(&normalize_name(name))
            .map_or(&[], |indexes| indexes.as_slice())
    }

    /// Interpreter versions named by `Programming Language :: Python :: X.Y`
    /// classifiers, in declaration order
    pub fn python_classifiers(&self) -> Vec<Version> {
        self.project
            .classifiers
            .iter()
            .filter_map(|classifier| {
                PYTHON_CLASSIFIER_RE
                    .captures(classifier)
                    .and_then(|caps| Version::parse(&caps["version"]).ok())
            })
            .collect()
    }

    /// The parsed `requires-python` bound, if declared
    pub fn requires_python(&self) -> Result<Option<SpecifierSet>, ManifestError> {
        self.project
            .requires_python
            .as_deref()
            .map(SpecifierSet::parse)
            .transpose()
    }

    /// Interpreter matrix the record claims to support: python classifiers
    /// filtered by the `requires-python` bound, sorted ascending
    pub fn supported_pythons(&self) -> Vec<Version> {
        let mut matrix = self.python_classifiers();
        if let Ok(Some(bound)) = self.requires_python() {
            matrix.retain(|version| bound.contains(version));
        }
        matrix.sort();
        matrix
    }

    /// Whether the version field is resolved at build time
    pub fn version_is_dynamic(&self) -> bool {
        self.project
            .dynamic
            .iter()
            .any(|field| field.as_ref() == "version")
    }

    /// Serialize this manifest to a JSON string
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::License;

    const SAMPLE: &str = r#"
[build-system]
requires = ["setuptools>=65", "setuptools-scm>=7"]
build-backend = "setuptools.build_meta"

[project]
name = "pyspex"
description = "Software to read and process SPEXone Level-0 and Level-1 data"
readme = "README.md"
license = { text = "BSD-3-Clause" }
authors = [{ name = "Instrument data team", email = "spexone-support@sron.nl" }]
classifiers = [
  "Intended Audience :: Science/Research",
  "License :: OSI Approved :: BSD License",
  "Programming Language :: Python :: 3.8",
  "Programming Language :: Python :: 3.9",
  "Programming Language :: Python :: 3.10",
  "Programming Language :: Python :: 3.11",
]
requires-python = ">=3.8"
dynamic = ["version"]
dependencies = [
  "h5py>=3.8; python_version!='3.9'",
  "h5py>=3.5,<3.8; python_version=='3.9'",
  "moniplot>=0.5",
  "netCDF4>=1.5",
  "numpy>=1.19",
  "xarray>=2022.3; python_version!='3.9'",
  "xarray>=0.20,<2022.3; python_version=='3.9'",
]

[project.urls]
Homepage = "https://github.com/rmvanhees/pyspex"
Documentation = "https://pyspex.readthedocs.io"

[tool.setuptools_scm]
write_to = "src/pyspex/_version.py"
"#;

    #[test]
    fn test_load_sample() {
        let manifest = ProjectManifest::from_toml_str(SAMPLE).unwrap();
        assert_eq!(manifest.project.name.as_ref(), "pyspex");
        assert!(manifest.version_is_dynamic());
        assert_eq!(manifest.project.dependencies.len(), 7);
        assert!(manifest.parse_errors().is_empty());
    }

    #[test]
    fn test_split_entries_indexed_together() {
        let manifest = ProjectManifest::from_toml_str(SAMPLE).unwrap();
        assert_eq!(manifest.entries_for("h5py").len(), 2);
        assert_eq!(manifest.entries_for("xarray").len(), 2);
        assert_eq!(manifest.entries_for("numpy").len(), 1);
        assert_eq!(manifest.entries_for("netcdf4").len(), 1);
        assert!(manifest.entries_for("absent").is_empty());
    }

    #[test]
    fn test_dependency_names_in_order() {
        let manifest = ProjectManifest::from_toml_str(SAMPLE).unwrap();
        assert_eq!(
            manifest.dependency_names(),
            &["h5py", "moniplot", "netcdf4", "numpy", "xarray"]
        );
    }

    #[test]
    fn test_supported_pythons() {
        let manifest = ProjectManifest::from_toml_str(SAMPLE).unwrap();
        let matrix: Vec<String> = manifest
            .supported_pythons()
            .iter()
            .map(|version| version.to_string())
            .collect();
        assert_eq!(matrix, ["3.8", "3.9", "3.10", "3.11"]);
    }

    #[test]
    fn test_requires_python_filters_matrix() {
        let bumped = SAMPLE.replace(">=3.8", ">=3.9");
        let manifest = ProjectManifest::from_toml_str(&bumped).unwrap();
        let matrix: Vec<String> = manifest
            .supported_pythons()
            .iter()
            .map(|version| version.to_string())
            .collect();
        assert_eq!(matrix, ["3.9", "3.10", "3.11"]);
    }

    #[test]
    fn test_license_table_form() {
        let manifest = ProjectManifest::from_toml_str(SAMPLE).unwrap();
        assert_eq!(
            manifest.project.license,
            Some(License::Text {
                text: "BSD-3-Clause".into()
            })
        );
    }

    #[test]
    fn test_bad_dependency_collected_not_fatal() {
        let broken = SAMPLE.replace("\"numpy>=1.19\",", "\"numpy >= =1.19\",");
        let manifest = ProjectManifest::from_toml_str(&broken).unwrap();
        assert_eq!(manifest.parse_errors().len(), 1);
        assert_eq!(manifest.requirements().count(), 6);
    }

    #[test]
    fn test_missing_project_table_is_parse_error() {
        assert!(ProjectManifest::from_toml_str("[build-system]\nrequires = []\n").is_err());
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("pyproject.toml");

        let manifest = ProjectManifest::from_toml_str(SAMPLE).unwrap();
        manifest.save_to_path(&path).unwrap();

        let reloaded = ProjectManifest::load_from_path(&path).unwrap();
        assert_eq!(reloaded.project.name.as_ref(), "pyspex");
        assert_eq!(reloaded.project.dependencies, manifest.project.dependencies);
        assert_eq!(reloaded.project.urls, manifest.project.urls);
        // tool tables survive the round trip
        assert!(reloaded.tool.is_some());
    }

    #[test]
    fn test_to_json_string() {
        let manifest = ProjectManifest::from_toml_str(SAMPLE).unwrap();
        let json = manifest.to_json_string();
        assert!(json.contains("\"pyspex\""));
        assert!(json.contains("requires-python"));
    }
}
