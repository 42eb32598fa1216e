use crate::logger;
use crate::GlobalOpts;
use colored::Colorize;
use spexpack_manifest::{audit, audit_tree, AuditReport, ProjectManifest, Severity};
use std::path::{Path, PathBuf};

pub fn handle_check(
    path: Option<PathBuf>,
    strict: bool,
    recursive: bool,
    opts: &GlobalOpts,
) -> Result<(), String> {
    if recursive {
        return check_tree(path, strict, opts);
    }

    let manifest_path = super::resolve_manifest_path(path)?;
    let manifest = ProjectManifest::load_from_path(&manifest_path)
        .map_err(|e| format!("Failed to load manifest: {}", e))?;

    let report = audit(&manifest);
    print_report(&manifest_path, &report);
    summarize(report.error_count(), report.warning_count(), 1, strict)
}

fn check_tree(path: Option<PathBuf>, strict: bool, _opts: &GlobalOpts) -> Result<(), String> {
    let root = match path {
        Some(path) => path,
        None => std::env::current_dir()
            .map_err(|e| format!("Failed to determine working directory: {}", e))?,
    };

    tracing::debug!("Auditing manifests under {:?}", root);
    logger::spinner_start(&format!("Auditing manifests under {}", root.display()));
    let audits = match audit_tree(&root) {
        Ok(audits) => audits,
        Err(e) => {
            logger::spinner_error("audit failed");
            return Err(format!("Failed to audit {}: {}", root.display(), e));
        }
    };
    if audits.is_empty() {
        logger::spinner_error("no manifests found");
        return Err(format!("no manifests found under {}", root.display()));
    }
    logger::spinner_success(&format!("Audited {} manifests", audits.len()));
    println!();

    let mut errors = 0;
    let mut warnings = 0;
    for audited in &audits {
        match &audited.outcome {
            Ok(report) => {
                print_report(&audited.path, report);
                errors += report.error_count();
                warnings += report.warning_count();
            }
            Err(message) => {
                println!("{}", audited.path.display().to_string().bold());
                println!("  {} {}", "✗".red().bold(), message);
                errors += 1;
            }
        }
        println!();
    }

    summarize(errors, warnings, audits.len(), strict)
}

fn print_report(path: &Path, report: &AuditReport) {
    if report.is_clean() {
        println!(
            "{} {} {}",
            "✔".green().bold(),
            path.display().to_string().bold(),
            "is clean".green()
        );
        return;
    }

    println!("{}", path.display().to_string().bold());
    for finding in &report.findings {
        match finding.severity {
            Severity::Error => println!(
                "  {} [{}] {}",
                "✗".red().bold(),
                finding.check.id().cyan(),
                finding.message
            ),
            Severity::Warning => println!(
                "  {} [{}] {}",
                "warning:".yellow().bold(),
                finding.check.id().cyan(),
                finding.message
            ),
        }
    }
}

fn summarize(errors: usize, warnings: usize, manifests: usize, strict: bool) -> Result<(), String> {
    if manifests > 1 {
        println!(
            "{}: {} manifests, {} errors, {} warnings",
            "Summary".bold(),
            manifests,
            errors,
            warnings
        );
    } else if errors > 0 || warnings > 0 {
        println!(
            "{}: {} errors, {} warnings",
            "Summary".bold(),
            errors,
            warnings
        );
    }

    if errors > 0 {
        Err(format!("{} error(s) found", errors))
    } else if strict && warnings > 0 {
        Err(format!("{} warning(s) found (strict mode)", warnings))
    } else {
        Ok(())
    }
}
