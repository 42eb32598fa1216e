//! Static validation of a manifest record
//!
//! The audit treats the manifest as data: every check inspects the declared
//! metadata, never the network or the filesystem. The partition checks run
//! the dependency predicates against the interpreter matrix the record
//! itself claims to support.

use crate::marker::Environment;
use crate::types::ProjectManifest;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://[^\s/]+(?:/\S*)?$").expect("url pattern compiles")
});

// Platform assumed when sweeping the interpreter matrix
const MATRIX_PLATFORM: &str = "linux";

/// Audit check identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    RequiredFields,
    DynamicVersion,
    RequiresPython,
    ClassifierPython,
    ProjectUrls,
    DependencySyntax,
    MarkerPartition,
    BuildSystem,
    PythonMatrix,
}

impl Check {
    pub fn id(self) -> &'static str {
        match self {
            Check::RequiredFields => "required-fields",
            Check::DynamicVersion => "dynamic-version",
            Check::RequiresPython => "requires-python",
            Check::ClassifierPython => "classifier-python",
            Check::ProjectUrls => "project-urls",
            Check::DependencySyntax => "dependency-syntax",
            Check::MarkerPartition => "marker-partition",
            Check::BuildSystem => "build-system",
            Check::PythonMatrix => "python-matrix",
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One audit result
#[derive(Debug, Clone)]
pub struct Finding {
    pub check: Check,
    pub severity: Severity,
    pub message: String,
}

/// All findings for one manifest
#[derive(Debug, Clone, Default)]
pub struct AuditReport {
    pub findings: Vec<Finding>,
}

impl AuditReport {
    fn push(&mut self, check: Check, severity: Severity, message: String) {
        self.findings.push(Finding {
            check,
            severity,
            message,
        });
    }

    fn error(&mut self, check: Check, message: String) {
        self.push(check, Severity::Error, message);
    }

    fn warning(&mut self, check: Check, message: String) {
        self.push(check, Severity::Warning, message);
    }

    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Run every check against the record
pub fn audit(manifest: &ProjectManifest) -> AuditReport {
    let mut report = AuditReport::default();

    check_required_fields(manifest, &mut report);
    check_dynamic_version(manifest, &mut report);
    check_requires_python(manifest, &mut report);
    check_classifier_python(manifest, &mut report);
    check_project_urls(manifest, &mut report);
    check_dependency_syntax(manifest, &mut report);
    check_marker_partition(manifest, &mut report);
    check_build_system(manifest, &mut report);

    report
}

fn check_required_fields(manifest: &ProjectManifest, report: &mut AuditReport) {
    let project = &manifest.project;

    if project.name.trim().is_empty() {
        report.error(Check::RequiredFields, "field 'name' is empty".to_string());
    }
    if project
        .description
        .as_deref()
        .map_or(true, |description| description.trim().is_empty())
    {
        report.error(
            Check::RequiredFields,
            "field 'description' is missing or empty".to_string(),
        );
    }
    if project.license.as_ref().map_or(true, |license| license.is_empty()) {
        report.error(
            Check::RequiredFields,
            "field 'license' is missing or empty".to_string(),
        );
    }
    if project.authors.iter().all(|author| author.is_empty()) {
        report.error(
            Check::RequiredFields,
            "field 'authors' is missing or empty".to_string(),
        );
    }
}

fn check_dynamic_version(manifest: &ProjectManifest, report: &mut AuditReport) {
    let static_version = manifest
        .project
        .version
        .as_deref()
        .is_some_and(|version| !version.trim().is_empty());

    match (static_version, manifest.version_is_dynamic()) {
        (true, true) => report.error(
            Check::DynamicVersion,
            "version is declared static and listed in 'dynamic'".to_string(),
        ),
        (false, false) => report.error(
            Check::DynamicVersion,
            "version is neither declared nor listed in 'dynamic'".to_string(),
        ),
        _ => {}
    }
}

fn check_requires_python(manifest: &ProjectManifest, report: &mut AuditReport) {
    match manifest.requires_python() {
        Ok(Some(_)) => {}
        Ok(None) => report.warning(
            Check::RequiresPython,
            "field 'requires-python' is not declared".to_string(),
        ),
        Err(e) => report.error(Check::RequiresPython, e.to_string()),
    }
}

fn check_classifier_python(manifest: &ProjectManifest, report: &mut AuditReport) {
    let Ok(Some(bound)) = manifest.requires_python() else {
        return;
    };

    for version in manifest.python_classifiers() {
        if !bound.contains(&version) {
            report.error(
                Check::ClassifierPython,
                format!(
                    "classifier for python {} violates requires-python {}",
                    version,
                    manifest.project.requires_python.as_deref().unwrap_or("")
                ),
            );
        }
    }
}

fn check_project_urls(manifest: &ProjectManifest, report: &mut AuditReport) {
    for (label, url) in &manifest.project.urls {
        if label.trim().is_empty() {
            report.error(Check::ProjectUrls, format!("URL '{}' has an empty label", url));
        }
        if !URL_RE.is_match(url) {
            report.error(
                Check::ProjectUrls,
                format!("'{}' is not an absolute URL ({})", url, label),
            );
        }
    }
}

fn check_dependency_syntax(manifest: &ProjectManifest, report: &mut AuditReport) {
    for (index, message) in manifest.parse_errors() {
        let raw = manifest
            .project
            .dependencies
            .get(*index)
            .map_or("", |entry| entry.as_ref());
        report.error(
            Check::DependencySyntax,
            format!("entry {} ('{}'): {}", index, raw, message),
        );
    }
}

fn check_marker_partition(manifest: &ProjectManifest, report: &mut AuditReport) {
    let matrix = manifest.supported_pythons();
    if matrix.is_empty() {
        report.warning(
            Check::PythonMatrix,
            "no python classifiers declared; partition check skipped".to_string(),
        );
        return;
    }

    let environments: Vec<(String, Environment)> = matrix
        .iter()
        .filter_map(|version| {
            let python = version.to_string();
            Environment::new(&python, MATRIX_PLATFORM)
                .ok()
                .map(|env| (python, env))
        })
        .collect();

    for name in manifest.dependency_names() {
        let entries = manifest.entries_for(name);
        let requirements: Vec<_> = entries
            .iter()
            .filter_map(|&index| manifest.requirement_at(index))
            .collect();
        if requirements.len() != entries.len() {
            // unparsed entries already reported by dependency-syntax
            continue;
        }

        if requirements.len() == 1 {
            let requirement = requirements[0];
            if !requirement.is_conditional() {
                continue;
            }
            // Constant across the matrix means the predicate is platform
            // bound, which a single entry may legitimately be. Varying with
            // the interpreter leaves uncovered pythons.
            let applied: Vec<bool> = environments
                .iter()
                .map(|(_, env)| requirement.applies_to(env))
                .collect();
            if applied.iter().any(|&a| a) && !applied.iter().all(|&a| a) {
                let uncovered: Vec<&str> = environments
                    .iter()
                    .zip(&applied)
                    .filter(|(_, &a)| !a)
                    .map(|((python, _), _)| python.as_str())
                    .collect();
                report.warning(
                    Check::MarkerPartition,
                    format!(
                        "'{}' has no entry for python {} (no alternative declared)",
                        name,
                        uncovered.join(", ")
                    ),
                );
            }
            continue;
        }

        for (python, env) in &environments {
            let applicable = requirements
                .iter()
                .filter(|requirement| requirement.applies_to(env))
                .count();
            if applicable == 0 {
                report.error(
                    Check::MarkerPartition,
                    format!("'{}' has no applicable entry for python {} (gap)", name, python),
                );
            } else if applicable > 1 {
                report.error(
                    Check::MarkerPartition,
                    format!(
                        "'{}' has {} applicable entries for python {} (overlap)",
                        name, applicable, python
                    ),
                );
            }
        }
    }
}

fn check_build_system(manifest: &ProjectManifest, report: &mut AuditReport) {
    match &manifest.build_system {
        None => report.warning(
            Check::BuildSystem,
            "no [build-system] table declared".to_string(),
        ),
        Some(build_system) => {
            if build_system.requires.is_empty() {
                report.warning(
                    Check::BuildSystem,
                    "[build-system] declares no requirements".to_string(),
                );
            }
            if build_system
                .build_backend
                .as_deref()
                .map_or(true, |backend| backend.trim().is_empty())
            {
                report.warning(
                    Check::BuildSystem,
                    "[build-system] declares no build-backend".to_string(),
                );
            }
        }
    }
}
