//! Version specifiers: single constraints and comma-separated sets

use crate::errors::ManifestError;
use crate::version::Version;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Comparison operator in a version specifier or environment marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Le,
    Ge,
    Lt,
    Gt,
    Compatible,
}

impl CompareOp {
    /// Operator token as written in requirement strings
    pub fn token(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Compatible => "~=",
        }
    }

    /// Split an operator prefix off a constraint string
    fn strip(input: &str) -> Option<(CompareOp, &str)> {
        for (token, op) in [
            ("~=", CompareOp::Compatible),
            ("==", CompareOp::Eq),
            ("!=", CompareOp::Ne),
            ("<=", CompareOp::Le),
            (">=", CompareOp::Ge),
            ("<", CompareOp::Lt),
            (">", CompareOp::Gt),
        ] {
            if let Some(rest) = input.strip_prefix(token) {
                return Some((op, rest));
            }
        }
        None
    }
}

impl FromStr for CompareOp {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match CompareOp::strip(s) {
            Some((op, "")) => Ok(op),
            _ => Err(ManifestError::InvalidSpecifier(s.to_string())),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// A single version constraint, e.g. `>=3.5` or `==3.9.*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    op: CompareOp,
    version: Version,
    wildcard: bool,
}

impl Specifier {
    pub fn new(op: CompareOp, version: Version) -> Self {
        Specifier {
            op,
            version,
            wildcard: false,
        }
    }

    /// Parse one constraint like `>=3.5` or `!=2022.3.*`
    pub fn parse(input: &str) -> Result<Self, ManifestError> {
        let trimmed = input.trim();
        let (op, rest) = CompareOp::strip(trimmed)
            .ok_or_else(|| ManifestError::InvalidSpecifier(input.to_string()))?;
        let rest = rest.trim();

        let (body, wildcard) = match rest.strip_suffix(".*") {
            Some(body) if matches!(op, CompareOp::Eq | CompareOp::Ne) => (body, true),
            Some(_) => return Err(ManifestError::InvalidSpecifier(input.to_string())),
            None => (rest, false),
        };

        let version = Version::parse(body)
            .map_err(|_| ManifestError::InvalidSpecifier(input.to_string()))?;
        if wildcard && (version.pre().is_some() || version.post().is_some() || version.dev().is_some())
        {
            return Err(ManifestError::InvalidSpecifier(input.to_string()));
        }

        Ok(Specifier {
            op,
            version,
            wildcard,
        })
    }

    /// Build one from an operator and an already-parsed version
    pub fn from_parts(op: CompareOp, value: &str) -> Result<Self, ManifestError> {
        Specifier::parse(&format!("{}{}", op.token(), value))
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Whether `candidate` satisfies this constraint
    pub fn contains(&self, candidate: &Version) -> bool {
        match self.op {
            CompareOp::Eq if self.wildcard => self.prefix_matches(candidate),
            CompareOp::Ne if self.wildcard => !self.prefix_matches(candidate),
            CompareOp::Eq => self.equals(candidate),
            CompareOp::Ne => !self.equals(candidate),
            CompareOp::Le => candidate <= &self.version,
            CompareOp::Ge => candidate >= &self.version,
            CompareOp::Lt => candidate < &self.version,
            CompareOp::Gt => candidate > &self.version,
            CompareOp::Compatible => self.compatible_with(candidate),
        }
    }

    // Equality ignores the candidate's local tail when the constraint has none
    fn equals(&self, candidate: &Version) -> bool {
        if self.version.local().is_none() {
            candidate.without_local() == self.version
        } else {
            candidate == &self.version
        }
    }

    fn prefix_matches(&self, candidate: &Version) -> bool {
        self.version
            .release()
            .iter()
            .enumerate()
            .all(|(i, seg)| candidate.segment(i) == *seg)
    }

    // `~=X.Y.Z` means `>=X.Y.Z, ==X.Y.*`
    fn compatible_with(&self, candidate: &Version) -> bool {
        if candidate < &self.version {
            return false;
        }
        let release = self.version.release();
        if release.len() < 2 {
            return true;
        }
        release[..release.len() - 1]
            .iter()
            .enumerate()
            .all(|(i, seg)| candidate.segment(i) == *seg)
    }
}

impl FromStr for Specifier {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Specifier::parse(s)
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)?;
        if self.wildcard {
            write!(f, ".*")?;
        }
        Ok(())
    }
}

/// Comma-separated conjunction of constraints; empty set matches everything
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecifierSet(SmallVec<[Specifier; 2]>);

impl SpecifierSet {
    /// Parse `>=3.5,<3.8` style strings; surrounding parentheses are allowed
    pub fn parse(input: &str) -> Result<Self, ManifestError> {
        let mut trimmed = input.trim();
        if let Some(inner) = trimmed
            .strip_prefix('(')
            .and_then(|rest| rest.strip_suffix(')'))
        {
            trimmed = inner.trim();
        }
        if trimmed.is_empty() {
            return Ok(SpecifierSet::default());
        }

        let specifiers = trimmed
            .split(',')
            .map(Specifier::parse)
            .collect::<Result<_, _>>()?;
        Ok(SpecifierSet(specifiers))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specifier> {
        self.0.iter()
    }

    /// Whether `candidate` satisfies every constraint in the set
    pub fn contains(&self, candidate: &Version) -> bool {
        self.0.iter().all(|spec| spec.contains(candidate))
    }
}

impl FromStr for SpecifierSet {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SpecifierSet::parse(s)
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|spec| spec.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_parse_operators() {
        for (input, op) in [
            (">=3.5", CompareOp::Ge),
            ("<=3.8", CompareOp::Le),
            ("==3.9", CompareOp::Eq),
            ("!=3.9", CompareOp::Ne),
            ("<2022.3", CompareOp::Lt),
            (">1.19", CompareOp::Gt),
            ("~=1.5.2", CompareOp::Compatible),
        ] {
            assert_eq!(Specifier::parse(input).unwrap().op(), op, "{}", input);
        }
    }

    #[test]
    fn test_parse_rejects_bare_version() {
        assert!(Specifier::parse("3.5").is_err());
        assert!(Specifier::parse(">=").is_err());
    }

    #[test]
    fn test_equality_with_padding() {
        let spec = Specifier::parse("==3.9").unwrap();
        assert!(spec.contains(&v("3.9")));
        assert!(spec.contains(&v("3.9.0")));
        assert!(!spec.contains(&v("3.9.1")));
    }

    #[test]
    fn test_equality_ignores_candidate_local() {
        let spec = Specifier::parse("==1.2.3").unwrap();
        assert!(spec.contains(&v("1.2.3+g1a2b3c4")));
    }

    #[test]
    fn test_wildcard() {
        let spec = Specifier::parse("==3.9.*").unwrap();
        assert!(spec.contains(&v("3.9")));
        assert!(spec.contains(&v("3.9.18")));
        assert!(!spec.contains(&v("3.10.0")));

        let not = Specifier::parse("!=3.9.*").unwrap();
        assert!(!not.contains(&v("3.9.4")));
        assert!(not.contains(&v("3.10")));
    }

    #[test]
    fn test_wildcard_only_for_equality_ops() {
        assert!(Specifier::parse(">=3.9.*").is_err());
    }

    #[test]
    fn test_compatible_release() {
        let spec = Specifier::parse("~=1.5.2").unwrap();
        assert!(spec.contains(&v("1.5.2")));
        assert!(spec.contains(&v("1.5.9")));
        assert!(!spec.contains(&v("1.6.0")));
        assert!(!spec.contains(&v("1.5.1")));
    }

    #[test]
    fn test_set_conjunction() {
        let set = SpecifierSet::parse(">=3.5,<3.8").unwrap();
        assert!(set.contains(&v("3.5")));
        assert!(set.contains(&v("3.7.2")));
        assert!(!set.contains(&v("3.8")));
        assert!(!set.contains(&v("3.4.9")));
    }

    #[test]
    fn test_empty_set_matches_all() {
        let set = SpecifierSet::parse("").unwrap();
        assert!(set.is_empty());
        assert!(set.contains(&v("0.0.1")));
    }

    #[test]
    fn test_parenthesized_set() {
        let set = SpecifierSet::parse("(>=1.19)").unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains(&v("1.21")));
    }

    #[test]
    fn test_requires_python_bound() {
        let set = SpecifierSet::parse(">=3.8").unwrap();
        for minor in ["3.8", "3.9", "3.10", "3.11"] {
            assert!(set.contains(&v(minor)), "{}", minor);
        }
        assert!(!set.contains(&v("3.7")));
    }

    #[test]
    fn test_display_round_trip() {
        for input in [">=3.5,<3.8", "==3.9.*", "~=1.5.2"] {
            assert_eq!(SpecifierSet::parse(input).unwrap().to_string(), input);
        }
    }
}
