//! Version strings from repository state
//!
//! Scheme: an exact clean tag is the version itself. Commits past the tag
//! produce a dev pre-version of the next patch release with the node as
//! local tail (`1.2.3` + 5 commits -> `1.2.4.dev5+g<node>`). Untagged
//! repositories start the line at `0.1`. A dirty tree marks the local tail.

use crate::{GitDescribe, ScmError};
use spexpack_manifest::Version;

/// Format the version for a described repository
pub fn version_from_describe(described: &GitDescribe) -> Result<String, ScmError> {
    match &described.tag {
        Some(tag) => {
            let version = Version::parse(tag)
                .map_err(|_| ScmError::InvalidTag(tag.clone()))?;
            if described.distance == 0 {
                if described.dirty {
                    Ok(format!("{}+dirty", version))
                } else {
                    Ok(version.to_string())
                }
            } else {
                Ok(format!(
                    "{}.dev{}+{}",
                    version.bumped(),
                    described.distance,
                    local_tail(described)
                ))
            }
        }
        None => Ok(format!(
            "0.1.dev{}+{}",
            described.distance,
            local_tail(described)
        )),
    }
}

fn local_tail(described: &GitDescribe) -> String {
    if described.dirty {
        format!("g{}.dirty", described.node)
    } else {
        format!("g{}", described.node)
    }
}

/// Version with the local tail stripped, the form shown to users by default
pub fn short_version(full: &str) -> &str {
    full.split('+').next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn described(tag: Option<&str>, distance: u32, dirty: bool) -> GitDescribe {
        GitDescribe {
            tag: tag.map(String::from),
            distance,
            node: "1a2b3c4".to_string(),
            dirty,
        }
    }

    #[test]
    fn test_exact_clean_tag() {
        let version = version_from_describe(&described(Some("v1.2.3"), 0, false)).unwrap();
        assert_eq!(version, "1.2.3");
    }

    #[test]
    fn test_exact_dirty_tag() {
        let version = version_from_describe(&described(Some("v1.2.3"), 0, true)).unwrap();
        assert_eq!(version, "1.2.3+dirty");
    }

    #[test]
    fn test_distance_bumps_and_marks_dev() {
        let version = version_from_describe(&described(Some("v1.2.3"), 5, false)).unwrap();
        assert_eq!(version, "1.2.4.dev5+g1a2b3c4");
    }

    #[test]
    fn test_distance_dirty() {
        let version = version_from_describe(&described(Some("0.9"), 2, true)).unwrap();
        assert_eq!(version, "0.10.dev2+g1a2b3c4.dirty");
    }

    #[test]
    fn test_untagged_repository() {
        let version = version_from_describe(&described(None, 7, false)).unwrap();
        assert_eq!(version, "0.1.dev7+g1a2b3c4");
    }

    #[test]
    fn test_invalid_tag_rejected() {
        let err = version_from_describe(&described(Some("nightly"), 0, false)).unwrap_err();
        assert!(matches!(err, ScmError::InvalidTag(_)));
    }

    #[test]
    fn test_short_version_strips_local_tail() {
        assert_eq!(short_version("1.2.4.dev5+g1a2b3c4"), "1.2.4.dev5");
        assert_eq!(short_version("1.2.3"), "1.2.3");
    }

    #[test]
    fn test_dev_version_sorts_between_releases() {
        let dev = Version::parse(
            short_version(&version_from_describe(&described(Some("v1.2.3"), 5, false)).unwrap()),
        )
        .unwrap();
        assert!(Version::parse("1.2.3").unwrap() < dev);
        assert!(dev < Version::parse("1.2.4").unwrap());
    }
}
