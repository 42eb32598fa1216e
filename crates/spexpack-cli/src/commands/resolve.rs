use crate::GlobalOpts;
use colored::Colorize;
use spexpack_config::Config;
use spexpack_manifest::{resolve, Environment, ProjectManifest};
use std::path::PathBuf;

pub fn handle_resolve(
    path: Option<PathBuf>,
    python: Option<String>,
    platform: Option<String>,
    json: bool,
    _opts: &GlobalOpts,
) -> Result<(), String> {
    let config = Config::load().unwrap_or_default();
    let python = python.unwrap_or_else(|| config.get_default_python());
    let platform = platform.unwrap_or_else(|| config.get_platform());

    let manifest_path = super::resolve_manifest_path(path)?;
    let manifest = ProjectManifest::load_from_path(&manifest_path)
        .map_err(|e| format!("Failed to load manifest: {}", e))?;

    let env = Environment::new(&python, &platform)
        .map_err(|e| format!("Invalid interpreter version '{}': {}", python, e))?;
    let set =
        resolve(&manifest, &env).map_err(|e| format!("Dependency resolution failed: {}", e))?;

    if json {
        println!("{}", set.to_json_string());
        return Ok(());
    }

    println!(
        "{} {} {}",
        "Dependency set for python".bold().green(),
        set.python.bold().blue(),
        format!("on {}", set.platform).dimmed()
    );
    for dependency in &set.dependencies {
        let mut line = format!("  {}", dependency.name.as_ref().bold().cyan());
        if !dependency.specifier.is_empty() {
            line.push_str(&format!("  {}", dependency.specifier));
        }
        println!("{}", line);
    }

    if !set.skipped.is_empty() {
        println!();
        for skipped in &set.skipped {
            println!(
                "  {} {} {}",
                "-".dimmed(),
                skipped.name.as_ref().dimmed(),
                format!("(skipped: {})", skipped.marker).dimmed()
            );
        }
    }

    println!();
    println!(
        "{}: {} selected, {} skipped",
        "Total".bold(),
        set.dependencies.len(),
        set.skipped.len()
    );

    Ok(())
}
