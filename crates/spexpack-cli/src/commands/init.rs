use crate::logger;
use crate::GlobalOpts;
use colored::Colorize;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

const DEFAULT_FILENAME: &str = "pyproject.toml";

const MANIFEST_TEMPLATE: &str = r#"[build-system]
requires = ["setuptools>=65", "setuptools-scm>=7"]
build-backend = "setuptools.build_meta"

[project]
name = "my-package"
description = "Describe what the package reads, processes or produces"
readme = "README.md"
license = { text = "BSD-3-Clause" }
authors = [
  { name = "Your Name", email = "you@example.org" },
]
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
  "numpy>=1.19",
]

[project.urls]
Homepage = "https://example.org/my-package"

[tool.setuptools_scm]
"#;

/// Initialize a new manifest file
pub fn handle_init(filename: Option<String>, _opts: GlobalOpts) {
    logger::debug("Handling init command");

    let target_filename = filename.unwrap_or_else(|| DEFAULT_FILENAME.to_string());
    let target_path = Path::new(&target_filename);

    logger::debug(&format!("Target file: {}", target_filename));

    if target_path.exists() {
        let should_skip = std::env::var("SPEXPACK_INIT_YES").is_ok();

        if !should_skip {
            print!(
                "{} File '{}' already exists. Overwrite? {} ",
                "?".bold().cyan(),
                target_filename,
                "[y/n] ›".dimmed()
            );
            let _ = io::stdout().flush();

            let mut response = String::new();
            if io::stdin().read_line(&mut response).is_ok() {
                let response = response.trim().to_lowercase();
                if response != "y" && response != "yes" {
                    logger::info("Operation cancelled by user");
                    println!("Operation cancelled.");
                    return;
                }
            } else {
                logger::error("Failed to read input");
                return;
            }
        } else {
            logger::debug("Skipping confirmation (SPEXPACK_INIT_YES set)");
        }
    }

    match fs::write(&target_filename, MANIFEST_TEMPLATE) {
        Ok(()) => {
            logger::success(&format!("Created manifest file: {}", target_filename));
            println!();
            println!("Next steps:");
            println!("  1. Edit {} with your package metadata", target_filename.bold());
            println!("  2. Validate it: spexpack check {}", target_filename);
            println!(
                "  3. Inspect the dependency set: spexpack resolve {} --python 3.11",
                target_filename
            );
        }
        Err(e) => {
            logger::error(&format!("Failed to create manifest file: {}", e));
        }
    }
}
