//! Subprocess plumbing around `git describe`

use crate::ScmError;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;
use which::which;

/// Parsed repository state relevant to versioning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitDescribe {
    /// Nearest reachable tag, None when the repository has no tags
    pub tag: Option<String>,
    /// Commits since the tag (or total commits when untagged)
    pub distance: u32,
    /// Abbreviated commit hash
    pub node: String,
    /// Uncommitted changes in the working tree
    pub dirty: bool,
}

/// Resolve the git executable: explicit configuration wins, then PATH
pub fn locate_git(configured: Option<&str>) -> Result<PathBuf, ScmError> {
    match configured {
        Some(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
        _ => which("git").map_err(|e| ScmError::GitNotFound(e.to_string())),
    }
}

fn run_git(git: &Path, repo: &Path, args: &[&str]) -> Result<Output, ScmError> {
    debug!("Running git {:?} in {:?}", args, repo);
    let output = Command::new(git).arg("-C").arg(repo).args(args).output()?;
    Ok(output)
}

fn stdout_line(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Inspect the repository containing `repo` and report its version state.
/// Fails when there is no git executable or no repository; an untagged
/// repository falls back to commit count plus node.
pub fn describe(repo: &Path, configured_git: Option<&str>) -> Result<GitDescribe, ScmError> {
    let git = locate_git(configured_git)?;

    let probe = run_git(&git, repo, &["rev-parse", "--is-inside-work-tree"])?;
    if !probe.status.success() {
        return Err(ScmError::NotARepository(repo.to_path_buf()));
    }

    let described = run_git(
        &git,
        repo,
        &["describe", "--tags", "--long", "--dirty", "--abbrev=7"],
    )?;
    if described.status.success() {
        return parse_describe(&stdout_line(&described));
    }

    // No reachable tag: derive distance from the commit count
    let count = run_git(&git, repo, &["rev-list", "--count", "HEAD"])?;
    if !count.status.success() {
        return Err(ScmError::DescribeFailed(
            String::from_utf8_lossy(&count.stderr).trim().to_string(),
        ));
    }
    let distance = stdout_line(&count)
        .parse::<u32>()
        .map_err(|_| ScmError::DescribeParse(stdout_line(&count)))?;

    let node_output = run_git(&git, repo, &["rev-parse", "--short=7", "HEAD"])?;
    if !node_output.status.success() {
        return Err(ScmError::DescribeFailed(
            String::from_utf8_lossy(&node_output.stderr).trim().to_string(),
        ));
    }

    let status = run_git(&git, repo, &["status", "--porcelain"])?;

    Ok(GitDescribe {
        tag: None,
        distance,
        node: stdout_line(&node_output),
        dirty: !status.stdout.is_empty(),
    })
}

/// Parse `git describe --tags --long [--dirty]` output,
/// e.g. `v1.2.3-5-g1a2b3c4` or `v1.2.3-0-g1a2b3c4-dirty`
pub fn parse_describe(text: &str) -> Result<GitDescribe, ScmError> {
    let parse_error = || ScmError::DescribeParse(text.to_string());

    let (body, dirty) = match text.strip_suffix("-dirty") {
        Some(body) => (body, true),
        None => (text, false),
    };

    let mut parts = body.rsplitn(3, '-');
    let node = parts
        .next()
        .and_then(|part| part.strip_prefix('g'))
        .filter(|node| !node.is_empty())
        .ok_or_else(parse_error)?;
    let distance = parts
        .next()
        .and_then(|part| part.parse::<u32>().ok())
        .ok_or_else(parse_error)?;
    let tag = parts.next().filter(|tag| !tag.is_empty()).ok_or_else(parse_error)?;

    Ok(GitDescribe {
        tag: Some(tag.to_string()),
        distance,
        node: node.to_string(),
        dirty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;

    #[test]
    fn test_parse_describe_exact_tag() {
        let described = parse_describe("v1.2.3-0-g1a2b3c4").unwrap();
        assert_eq!(described.tag.as_deref(), Some("v1.2.3"));
        assert_eq!(described.distance, 0);
        assert_eq!(described.node, "1a2b3c4");
        assert!(!described.dirty);
    }

    #[test]
    fn test_parse_describe_with_distance_and_dirty() {
        let described = parse_describe("v0.9-12-gdeadbee-dirty").unwrap();
        assert_eq!(described.tag.as_deref(), Some("v0.9"));
        assert_eq!(described.distance, 12);
        assert!(described.dirty);
    }

    #[test]
    fn test_parse_describe_tag_containing_dashes() {
        let described = parse_describe("release-1.2-3-gabc1234").unwrap();
        assert_eq!(described.tag.as_deref(), Some("release-1.2"));
        assert_eq!(described.distance, 3);
    }

    #[test]
    fn test_parse_describe_rejects_garbage() {
        assert!(parse_describe("").is_err());
        assert!(parse_describe("v1.2.3").is_err());
        assert!(parse_describe("v1.2.3-x-gabc").is_err());
        assert!(parse_describe("v1.2.3-4-abc1234").is_err());
    }

    fn git_available() -> bool {
        which("git").is_ok()
    }

    fn run(repo: &std::path::Path, args: &[&str]) {
        let status = StdCommand::new("git")
            .arg("-C")
            .arg(repo)
            .args([
                "-c",
                "user.email=test@example.com",
                "-c",
                "user.name=test",
            ])
            .args(args)
            .status()
            .unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    #[test]
    fn test_describe_tagged_repository() {
        if !git_available() {
            return;
        }
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = temp_dir.path();
        run(repo, &["init", "-q"]);
        run(repo, &["commit", "-q", "--allow-empty", "-m", "initial"]);
        run(repo, &["tag", "v0.2.0"]);

        let described = describe(repo, None).unwrap();
        assert_eq!(described.tag.as_deref(), Some("v0.2.0"));
        assert_eq!(described.distance, 0);
        assert!(!described.node.is_empty());
    }

    #[test]
    fn test_describe_untagged_repository_falls_back() {
        if !git_available() {
            return;
        }
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = temp_dir.path();
        run(repo, &["init", "-q"]);
        run(repo, &["commit", "-q", "--allow-empty", "-m", "one"]);
        run(repo, &["commit", "-q", "--allow-empty", "-m", "two"]);

        let described = describe(repo, None).unwrap();
        assert_eq!(described.tag, None);
        assert_eq!(described.distance, 2);
    }

    #[test]
    fn test_describe_counts_distance_past_tag() {
        if !git_available() {
            return;
        }
        let temp_dir = tempfile::tempdir().unwrap();
        let repo = temp_dir.path();
        run(repo, &["init", "-q"]);
        run(repo, &["commit", "-q", "--allow-empty", "-m", "initial"]);
        run(repo, &["tag", "v1.0.0"]);
        run(repo, &["commit", "-q", "--allow-empty", "-m", "later"]);

        let described = describe(repo, None).unwrap();
        assert_eq!(described.tag.as_deref(), Some("v1.0.0"));
        assert_eq!(described.distance, 1);
    }
}
