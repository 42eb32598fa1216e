//! Version parsing and ordering for packaging metadata
//!
//! Implements the dotted-release version format used by Python packaging
//! metadata (release segments, pre/post/dev tags, local tail). Ordering
//! follows the canonical rules: dev releases sort before pre-releases,
//! pre-releases before the final release, post releases after it. Release
//! segments compare with zero padding, so `3.9` and `3.9.0` are equal.

use crate::errors::ManifestError;
use once_cell::sync::Lazy;
use regex::Regex;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?x)^
        v?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?:[._-]?(?P<pre_tag>a|b|c|rc|alpha|beta|pre|preview)[._-]?(?P<pre_n>[0-9]+)?)?
        (?:[._-]?post(?P<post>[0-9]+))?
        (?:[._-]?dev(?P<dev>[0-9]+))?
        (?:\+(?P<local>[A-Za-z0-9]+(?:[._-][A-Za-z0-9]+)*))?
        $",
    )
    .expect("version pattern compiles")
});

/// Pre-release phase tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PreTag {
    Alpha,
    Beta,
    Rc,
}

impl fmt::Display for PreTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreTag::Alpha => write!(f, "a"),
            PreTag::Beta => write!(f, "b"),
            PreTag::Rc => write!(f, "rc"),
        }
    }
}

/// A parsed package or interpreter version
#[derive(Debug, Clone)]
pub struct Version {
    release: SmallVec<[u32; 4]>,
    pre: Option<(PreTag, u32)>,
    post: Option<u32>,
    dev: Option<u32>,
    local: Option<String>,
}

impl Version {
    /// Parse a version string, accepting an optional leading `v`
    pub fn parse(input: &str) -> Result<Self, ManifestError> {
        let trimmed = input.trim().to_ascii_lowercase();
        let caps = VERSION_RE
            .captures(&trimmed)
            .ok_or_else(|| ManifestError::InvalidVersion(input.to_string()))?;

        let release: SmallVec<[u32; 4]> = caps["release"]
            .split('.')
            .map(|seg| {
                seg.parse::<u32>()
                    .map_err(|_| ManifestError::InvalidVersion(input.to_string()))
            })
            .collect::<Result<_, _>>()?;

        let pre = match caps.name("pre_tag") {
            Some(tag) => {
                let tag = match tag.as_str() {
                    "a" | "alpha" => PreTag::Alpha,
                    "b" | "beta" => PreTag::Beta,
                    _ => PreTag::Rc,
                };
                let n = caps
                    .name("pre_n")
                    .map(|m| m.as_str().parse::<u32>())
                    .transpose()
                    .map_err(|_| ManifestError::InvalidVersion(input.to_string()))?
                    .unwrap_or(0);
                Some((tag, n))
            }
            None => None,
        };

        let parse_num = |name: &str| -> Result<Option<u32>, ManifestError> {
            caps.name(name)
                .map(|m| m.as_str().parse::<u32>())
                .transpose()
                .map_err(|_| ManifestError::InvalidVersion(input.to_string()))
        };

        Ok(Version {
            release,
            pre,
            post: parse_num("post")?,
            dev: parse_num("dev")?,
            local: caps.name("local").map(|m| m.as_str().to_string()),
        })
    }

    /// Build a plain release version from segments
    pub fn from_release(segments: &[u32]) -> Self {
        Version {
            release: SmallVec::from_slice(segments),
            pre: None,
            post: None,
            dev: None,
            local: None,
        }
    }

    /// The release segments as declared
    pub fn release(&self) -> &[u32] {
        &self.release
    }

    /// Release segment at `index`, zero when absent
    pub fn segment(&self, index: usize) -> u32 {
        self.release.get(index).copied().unwrap_or(0)
    }

    pub fn pre(&self) -> Option<(PreTag, u32)> {
        self.pre
    }

    pub fn post(&self) -> Option<u32> {
        self.post
    }

    pub fn dev(&self) -> Option<u32> {
        self.dev
    }

    pub fn local(&self) -> Option<&str> {
        self.local.as_deref()
    }

    /// True for dev and pre-release versions
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    /// Copy with the local tail removed
    pub fn without_local(&self) -> Version {
        Version {
            local: None,
            ..self.clone()
        }
    }

    /// First `count` release segments, zero-padded (`3` -> `3.0` for count 2)
    pub fn truncated(&self, count: usize) -> Version {
        let mut release: SmallVec<[u32; 4]> = SmallVec::new();
        for i in 0..count {
            release.push(self.segment(i));
        }
        Version {
            release,
            pre: None,
            post: None,
            dev: None,
            local: None,
        }
    }

    /// Next release after this one, bumping the last declared segment
    pub fn bumped(&self) -> Version {
        let mut release = self.release.clone();
        if let Some(last) = release.last_mut() {
            *last += 1;
        } else {
            release.push(1);
        }
        Version {
            release,
            pre: None,
            post: None,
            dev: None,
            local: None,
        }
    }

    /// Release segments with trailing zeros removed, for padded comparison
    fn trimmed_release(&self) -> &[u32] {
        let mut len = self.release.len();
        while len > 1 && self.release[len - 1] == 0 {
            len -= 1;
        }
        &self.release[..len]
    }

    // Ordering classes: dev-only < pre < final, final < post
    fn pre_key(&self) -> (u8, u8, u32) {
        match self.pre {
            Some((tag, n)) => (1, tag as u8, n),
            None if self.post.is_none() && self.dev.is_some() => (0, 0, 0),
            None => (2, 0, 0),
        }
    }

    fn post_key(&self) -> (u8, u32) {
        match self.post {
            Some(n) => (1, n),
            None => (0, 0),
        }
    }

    fn dev_key(&self) -> (u8, u32) {
        match self.dev {
            Some(n) => (0, n),
            None => (1, 0),
        }
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.trimmed_release()
            .cmp(other.trimmed_release())
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post_key().cmp(&other.post_key()))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
            .then_with(|| self.local.cmp(&other.local))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::hash::Hash for Version {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.trimmed_release().hash(state);
        self.pre_key().hash(state);
        self.post_key().hash(state);
        self.dev_key().hash(state);
        self.local.hash(state);
    }
}

impl FromStr for Version {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let release: Vec<String> = self.release.iter().map(|seg| seg.to_string()).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((tag, n)) = self.pre {
            write!(f, "{}{}", tag, n)?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{}", n)?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{}", n)?;
        }
        if let Some(ref local) = self.local {
            write!(f, "+{}", local)?;
        }
        Ok(())
    }
}
