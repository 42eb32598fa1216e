use crate::logger;
use crate::GlobalOpts;
use spexpack_config::Config;
use spexpack_manifest::ProjectManifest;
use spexpack_scm::{resolve_version, short_version};
use std::path::PathBuf;

pub fn handle_version(path: Option<PathBuf>, full: bool, _opts: &GlobalOpts) -> Result<(), String> {
    let manifest_path = super::resolve_manifest_path(path)?;
    let manifest = ProjectManifest::load_from_path(&manifest_path)
        .map_err(|e| format!("Failed to load manifest: {}", e))?;

    // A statically declared version needs no repository
    if let Some(ref version) = manifest.project.version {
        println!("{}", version);
        return Ok(());
    }

    if !manifest.version_is_dynamic() {
        return Err("manifest declares no version, neither static nor dynamic".to_string());
    }

    let repo = manifest_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let config = Config::load().unwrap_or_default();
    logger::debug(&format!(
        "Resolving dynamic version from repository at {}",
        repo.display()
    ));

    let version = resolve_version(&repo, config.git_path.as_deref())
        .map_err(|e| format!("Version resolution failed: {}", e))?;

    if full {
        println!("{}", version);
    } else {
        println!("{}", short_version(&version));
    }

    Ok(())
}
