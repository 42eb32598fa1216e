//! Dependency requirement strings: `name[extras]specifiers; marker`

use crate::errors::ManifestError;
use crate::marker::{Environment, Marker};
use crate::specifier::SpecifierSet;
use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<name>[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*")
        .expect("name pattern compiles")
});

/// One dependency declaration from a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: Arc<str>,
    pub extras: SmallVec<[Arc<str>; 2]>,
    pub specifiers: SpecifierSet,
    pub marker: Option<Marker>,
}

impl Requirement {
    /// Parse one requirement string, e.g. `h5py>=3.5,<3.8; python_version=='3.9'`
    pub fn parse(input: &str) -> Result<Self, ManifestError> {
        let invalid = |message: &str| {
            ManifestError::InvalidRequirement(input.to_string(), message.to_string())
        };

        let (spec_part, marker_part) = match input.split_once(';') {
            Some((left, right)) => (left, Some(right)),
            None => (input, None),
        };

        let caps = NAME_RE
            .captures(spec_part)
            .ok_or_else(|| invalid("missing distribution name"))?;
        let name: Arc<str> = Arc::from(&caps["name"]);
        let mut rest = &spec_part[caps.get(0).map_or(0, |m| m.end())..];

        let mut extras: SmallVec<[Arc<str>; 2]> = SmallVec::new();
        if let Some(after) = rest.trim_start().strip_prefix('[') {
            let close = after
                .find(']')
                .ok_or_else(|| invalid("unterminated extras list"))?;
            for extra in after[..close].split(',') {
                let extra = extra.trim();
                if extra.is_empty() {
                    return Err(invalid("empty extra name"));
                }
                extras.push(Arc::from(extra));
            }
            rest = &after[close + 1..];
        }

        let specifiers = SpecifierSet::parse(rest)
            .map_err(|e| ManifestError::InvalidRequirement(input.to_string(), e.to_string()))?;

        let marker = match marker_part {
            Some(text) if !text.trim().is_empty() => Some(
                Marker::parse(text).map_err(|e| {
                    ManifestError::InvalidRequirement(input.to_string(), e.to_string())
                })?,
            ),
            Some(_) => return Err(invalid("empty marker after ';'")),
            None => None,
        };

        Ok(Requirement {
            name,
            extras,
            specifiers,
            marker,
        })
    }

    /// Distribution name lowered with `-`/`_`/`.` runs collapsed to `-`
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    /// Whether this entry applies to the given environment
    pub fn applies_to(&self, env: &Environment) -> bool {
        self.marker.as_ref().map_or(true, |marker| marker.eval(env))
    }

    /// Whether this entry is gated by an environment predicate
    pub fn is_conditional(&self) -> bool {
        self.marker.is_some()
    }
}

/// Canonical distribution-name form used for index keys
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut last_was_sep = false;
    for ch in name.chars() {
        if matches!(ch, '-' | '_' | '.') {
            if !last_was_sep {
                normalized.push('-');
            }
            last_was_sep = true;
        } else {
            normalized.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        }
    }
    normalized
}

impl FromStr for Requirement {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Requirement::parse(s)
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.extras.is_empty() {
            let extras: Vec<&str> = self.extras.iter().map(|e| e.as_ref()).collect();
            write!(f, "[{}]", extras.join(","))?;
        }
        if !self.specifiers.is_empty() {
            write!(f, "{}", self.specifiers)?;
        }
        if let Some(ref marker) = self.marker {
            write!(f, "; {}", marker)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_name() {
        let req = Requirement::parse("numpy").unwrap();
        assert_eq!(req.name.as_ref(), "numpy");
        assert!(req.specifiers.is_empty());
        assert!(req.marker.is_none());
    }

    #[test]
    fn test_parse_with_specifiers() {
        let req = Requirement::parse("netCDF4>=1.5").unwrap();
        assert_eq!(req.name.as_ref(), "netCDF4");
        assert_eq!(req.specifiers.to_string(), ">=1.5");
    }

    #[test]
    fn test_parse_with_marker() {
        let req = Requirement::parse("h5py>=3.5,<3.8; python_version=='3.9'").unwrap();
        assert_eq!(req.name.as_ref(), "h5py");
        assert!(req.is_conditional());
        assert!(req.applies_to(&Environment::new("3.9", "linux").unwrap()));
        assert!(!req.applies_to(&Environment::new("3.10", "linux").unwrap()));
    }

    #[test]
    fn test_parse_with_extras() {
        let req = Requirement::parse("moniplot[draw]>=0.5").unwrap();
        assert_eq!(req.extras.len(), 1);
        assert_eq!(req.extras[0].as_ref(), "draw");
    }

    #[test]
    fn test_unconditional_applies_everywhere() {
        let req = Requirement::parse("xarray>=2022.3").unwrap();
        for python in ["3.8", "3.9", "3.10", "3.11"] {
            assert!(req.applies_to(&Environment::new(python, "linux").unwrap()));
        }
    }

    #[test]
    fn test_normalized_name() {
        assert_eq!(normalize_name("netCDF4"), "netcdf4");
        assert_eq!(normalize_name("ruamel.yaml"), "ruamel-yaml");
        assert_eq!(normalize_name("A__b--c"), "a-b-c");
    }

    #[test]
    fn test_parse_errors() {
        assert!(Requirement::parse("").is_err());
        assert!(Requirement::parse(">=1.0").is_err());
        assert!(Requirement::parse("h5py>=3.5;").is_err());
        assert!(Requirement::parse("pkg[").is_err());
        assert!(Requirement::parse("h5py>=3.5; python_version=3.9").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let inputs = [
            "numpy>=1.19",
            "h5py>=3.5,<3.8; python_version == '3.9'",
            "moniplot[draw]>=0.5",
        ];
        for input in inputs {
            let req = Requirement::parse(input).unwrap();
            let again = Requirement::parse(&req.to_string()).unwrap();
            assert_eq!(req, again);
        }
    }
}
