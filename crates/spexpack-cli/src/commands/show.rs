use crate::GlobalOpts;
use colored::Colorize;
use spexpack_manifest::ProjectManifest;
use std::path::PathBuf;

pub fn handle_show(path: Option<PathBuf>, json: bool, opts: &GlobalOpts) -> Result<(), String> {
    let manifest_path = super::resolve_manifest_path(path)?;
    let manifest = ProjectManifest::load_from_path(&manifest_path)
        .map_err(|e| format!("Failed to load manifest: {}", e))?;

    if json {
        println!("{}", manifest.to_json_string());
        return Ok(());
    }

    let project = &manifest.project;

    let mut header = format!("{} {}", "Package:".bold().green(), project.name.as_ref().bold().blue());
    if let Some(ref version) = project.version {
        header.push_str(&format!(" {}", format!("v{}", version).dimmed()));
    } else if manifest.version_is_dynamic() {
        header.push_str(&format!(" {}", "(version from VCS)".dimmed()));
    }
    println!("{}", header);

    if let Some(ref description) = project.description {
        println!("  {}: {}", "Description".dimmed(), description);
    }
    if let Some(ref license) = project.license {
        println!("  {}: {}", "License".dimmed(), license.summary());
    }
    if let Some(ref readme) = project.readme {
        println!("  {}: {}", "Readme".dimmed(), readme.summary());
    }
    if !project.authors.is_empty() {
        let authors: Vec<String> = project.authors.iter().map(|author| author.label()).collect();
        println!("  {}: {}", "Authors".dimmed(), authors.join(", "));
    }

    let matrix = manifest.supported_pythons();
    if let Some(ref bound) = project.requires_python {
        let mut line = format!("  {}: {}", "Python".dimmed(), bound);
        if !matrix.is_empty() {
            let versions: Vec<String> =
                matrix.iter().map(|version| version.to_string()).collect();
            line.push_str(&format!(" [{}]", versions.join(", ")));
        }
        println!("{}", line);
    }
    println!();

    if manifest.dependency_names().is_empty() {
        println!("No dependencies declared.");
    } else {
        println!("{}", "Dependencies:".bold().green());
        for name in manifest.dependency_names() {
            let entries = manifest.entries_for(name);
            if entries.len() == 1 {
                if let Some(requirement) = manifest.requirement_at(entries[0]) {
                    let mut line = format!("  {}", requirement.name.as_ref().bold().cyan());
                    if !requirement.specifiers.is_empty() {
                        line.push_str(&format!("  {}", requirement.specifiers));
                    }
                    if let Some(ref marker) = requirement.marker {
                        line.push_str(&format!("  {}", format!("; {}", marker).dimmed()));
                    }
                    println!("{}", line);
                }
            } else {
                // Split constraint: one branch per environment predicate
                let shown = manifest
                    .requirement_at(entries[0])
                    .map_or_else(|| name.clone(), |req| req.name.to_string());
                println!("  {}:", shown.bold().cyan());
                for &index in entries {
                    if let Some(requirement) = manifest.requirement_at(index) {
                        let marker = requirement
                            .marker
                            .as_ref()
                            .map(|marker| format!(" when {}", marker))
                            .unwrap_or_default();
                        println!("    - {}{}", requirement.specifiers, marker.dimmed());
                    }
                }
            }
        }
    }

    if !project.urls.is_empty() {
        println!();
        println!("{}", "URLs:".bold().green());
        for (label, url) in &project.urls {
            println!("  {}: {}", label.dimmed(), url);
        }
    }

    if opts.verbosity_level() > 0 {
        if let Some(ref build_system) = manifest.build_system {
            println!();
            println!("{}", "Build system:".bold().green());
            if let Some(ref backend) = build_system.build_backend {
                println!("  {}: {}", "Backend".dimmed(), backend);
            }
            for requirement in &build_system.requires {
                println!("    - {}", requirement);
            }
        }
    }

    Ok(())
}
