//! Tool configuration for the spexpack CLI
//!
//! Settings live in a TOML file under the platform config directory. The
//! `SPEXPACK_CONFIG` environment variable overrides the location for tests
//! and isolated runs.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use which::which;

/// Default interpreter version assumed when none is configured
pub const DEFAULT_PYTHON: &str = "3.11";

/// Default platform assumed when none is configured
pub const DEFAULT_PLATFORM: &str = "linux";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_python: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl Config {
    pub fn path() -> PathBuf {
        // Honor explicit override via SPEXPACK_CONFIG for tests / isolated runs.
        if let Ok(env_path) = std::env::var("SPEXPACK_CONFIG") {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return PathBuf::from(trimmed);
            }
        }

        #[cfg(not(target_os = "windows"))]
        {
            dirs::home_dir().map_or_else(
                || PathBuf::from(".config/spexpack/spexpack.toml"),
                |home| {
                    home.join(".config")
                        .join("spexpack")
                        .join("spexpack.toml")
                },
            )
        }

        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map_or_else(
                || PathBuf::from("spexpack\\spexpack.toml"),
                |config| config.join("spexpack").join("spexpack.toml"),
            )
        }
    }

    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_from_path(&Self::path())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to_path(&Self::path())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "git-path" => self.git_path.clone(),
            "default-python" => self.default_python.clone(),
            "platform" => self.platform.clone(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: String) {
        match key {
            "git-path" => self.git_path = Some(value),
            "default-python" => self.default_python = Some(value),
            "platform" => self.platform = Some(value),
            _ => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.git_path.is_none() && self.default_python.is_none() && self.platform.is_none()
    }

    pub fn values_iter(&self) -> Vec<(&str, String)> {
        let mut values = Vec::new();
        if let Some(ref val) = self.git_path {
            values.push(("git-path", val.clone()));
        }
        if let Some(ref val) = self.default_python {
            values.push(("default-python", val.clone()));
        }
        if let Some(ref val) = self.platform {
            values.push(("platform", val.clone()));
        }
        values
    }

    /// Interpreter version to resolve against when none is given
    pub fn get_default_python(&self) -> String {
        self.default_python
            .clone()
            .unwrap_or_else(|| DEFAULT_PYTHON.to_string())
    }

    /// Platform name to resolve against when none is given
    pub fn get_platform(&self) -> String {
        self.platform
            .clone()
            .unwrap_or_else(|| DEFAULT_PLATFORM.to_string())
    }

    /// Discover and persist the git executable path if not configured
    pub fn ensure_git_path(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.git_path.is_some() {
            return Ok(());
        }
        if let Ok(found) = which("git") {
            self.git_path = Some(found.to_string_lossy().to_string());
            self.save()?;
        }
        Ok(())
    }
}
