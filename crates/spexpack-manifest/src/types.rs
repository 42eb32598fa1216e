//! Typed model of a pyproject-layout packaging manifest
//!
//! The document is deserialized as declared; runtime-only indexes (parsed
//! requirements, name lookup) are rebuilt after load and never serialized.
//! Unknown tables such as `[tool.*]` round-trip untouched.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::requirement::Requirement;

/// Conventional manifest file name
pub const MANIFEST_FILE_NAME: &str = "pyproject.toml";

/// Top-level manifest document
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectManifest {
    #[serde(
        rename = "build-system",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub build_system: Option<BuildSystem>,

    pub project: Project,

    /// Backend-specific tables, e.g. `[tool.setuptools_scm]`; kept verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<toml::Value>,

    /// Runtime only - parsed dependency entries aligned with `project.dependencies`
    #[serde(skip)]
    pub(crate) parsed: Vec<Option<Requirement>>,

    /// Runtime only - dependency strings that failed to parse, with the reason
    #[serde(skip)]
    pub(crate) parse_errors: Vec<(usize, String)>,

    /// Runtime only - normalized name -> entry indexes, rebuilt on load
    #[serde(skip)]
    pub(crate) dep_index: AHashMap<String, SmallVec<[usize; 2]>>,

    /// Runtime only - normalized names in first-seen order
    #[serde(skip)]
    pub(crate) dep_order: Vec<String>,
}

/// The `[build-system]` table consumed by an external build tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BuildSystem {
    #[serde(default)]
    pub requires: Vec<Arc<str>>,

    #[serde(
        rename = "build-backend",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub build_backend: Option<Arc<str>>,
}

/// The `[project]` table: static metadata plus the dependency mapping
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Project {
    pub name: Arc<str>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Arc<str>>,

    /// Field names whose values are produced at build time (e.g. `version`)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dynamic: Vec<Arc<str>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Arc<str>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme: Option<Readme>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,

    #[serde(default, skip_serializing_if = "SmallVec::is_empty")]
    pub authors: SmallVec<[Author; 2]>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classifiers: Vec<Arc<str>>,

    #[serde(
        rename = "requires-python",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub requires_python: Option<Arc<str>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<Arc<str>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub urls: BTreeMap<String, String>,
}

/// Package author or maintainer entry
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<Arc<str>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Arc<str>>,
}

impl Author {
    pub fn is_empty(&self) -> bool {
        self.name.as_deref().map_or(true, str::is_empty)
            && self.email.as_deref().map_or(true, str::is_empty)
    }

    /// `Name <email>` form for display
    pub fn label(&self) -> String {
        match (self.name.as_deref(), self.email.as_deref()) {
            (Some(name), Some(email)) => format!("{} <{}>", name, email),
            (Some(name), None) => name.to_string(),
            (None, Some(email)) => email.to_string(),
            (None, None) => String::new(),
        }
    }
}

/// License declaration: SPDX string or `{text}`/`{file}` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum License {
    Spdx(Arc<str>),
    Text { text: Arc<str> },
    File { file: Arc<str> },
}

impl License {
    pub fn is_empty(&self) -> bool {
        match self {
            License::Spdx(value) | License::Text { text: value } | License::File { file: value } => {
                value.is_empty()
            }
        }
    }

    pub fn summary(&self) -> String {
        match self {
            License::Spdx(value) | License::Text { text: value } => value.to_string(),
            License::File { file } => format!("(from {})", file),
        }
    }
}

/// Readme pointer: path string or `{file}`/`{text}` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Readme {
    Path(Arc<str>),
    Table {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file: Option<Arc<str>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<Arc<str>>,
        #[serde(
            rename = "content-type",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        content_type: Option<Arc<str>>,
    },
}

impl Readme {
    pub fn summary(&self) -> String {
        match self {
            Readme::Path(path) => path.to_string(),
            Readme::Table { file: Some(file), .. } => file.to_string(),
            Readme::Table { .. } => "(inline)".to_string(),
        }
    }
}
