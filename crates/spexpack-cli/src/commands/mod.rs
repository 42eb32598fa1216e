//! Command handlers for the spexpack CLI

pub mod check;
pub mod config;
pub mod init;
pub mod resolve;
pub mod show;
pub mod version;

use spexpack_manifest::{locate_manifest, MANIFEST_FILE_NAME};
use std::path::PathBuf;

/// Resolve the manifest file to operate on: an explicit file or directory
/// argument, otherwise the nearest manifest above the working directory.
pub(crate) fn resolve_manifest_path(path: Option<PathBuf>) -> Result<PathBuf, String> {
    match path {
        Some(path) if path.is_dir() => {
            let candidate = path.join(MANIFEST_FILE_NAME);
            if candidate.is_file() {
                Ok(candidate)
            } else {
                Err(format!(
                    "no {} found in {}",
                    MANIFEST_FILE_NAME,
                    path.display()
                ))
            }
        }
        Some(path) if path.is_file() => Ok(path),
        Some(path) => Err(format!("manifest not found: {}", path.display())),
        None => {
            let cwd = std::env::current_dir()
                .map_err(|e| format!("Failed to determine working directory: {}", e))?;
            locate_manifest(&cwd).ok_or_else(|| {
                format!(
                    "no {} found here or in any parent directory",
                    MANIFEST_FILE_NAME
                )
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_explicit_file_accepted() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join(MANIFEST_FILE_NAME);
        fs::write(&file, "[project]\nname = \"x\"\n").unwrap();
        assert_eq!(resolve_manifest_path(Some(file.clone())).unwrap(), file);
    }

    #[test]
    fn test_directory_argument_appends_file_name() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join(MANIFEST_FILE_NAME);
        fs::write(&file, "[project]\nname = \"x\"\n").unwrap();
        assert_eq!(
            resolve_manifest_path(Some(temp_dir.path().to_path_buf())).unwrap(),
            file
        );
    }

    #[test]
    fn test_missing_manifest_is_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(resolve_manifest_path(Some(temp_dir.path().join("absent.toml"))).is_err());
        assert!(resolve_manifest_path(Some(temp_dir.path().to_path_buf())).is_err());
    }
}
