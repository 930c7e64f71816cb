//! Semantic version parsing and ordering for disk image `version` strings.
//!
//! Accepts `[v]MAJOR[.MINOR[.PATCH]][-PRERELEASE][+BUILD]`. A leading `v` is
//! optional, and `MAJOR` / `MAJOR.MINOR` shorthands mean the missing parts are
//! zero; pre-release and build suffixes are only accepted on a full triple.
//! Core components may carry leading zeros (`22.04`), numeric pre-release
//! identifiers may not.
//! Ordering follows SemVer 2.0 precedence, build metadata is ignored.
//!
//! [`compare`] is the permissive entry point used for catalog selection:
//! malformed strings order below every well-formed version and equal to each
//! other, so a single bad catalog entry never hides the good ones.

use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("empty version string")]
    Empty,
    #[error("invalid numeric component '{0}'")]
    InvalidNumber(String),
    #[error("numeric component '{0}' has a leading zero")]
    LeadingZero(String),
    #[error("invalid pre-release or build identifier '{0}'")]
    InvalidIdentifier(String),
    #[error("pre-release and build suffixes require MAJOR.MINOR.PATCH: '{0}'")]
    IncompleteCore(String),
}

/// A single dot-separated pre-release identifier. Numeric identifiers sort
/// before alphanumeric ones, which the variant order encodes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Identifier {
    Numeric(u64),
    AlphaNumeric(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(n) => write!(f, "{n}"),
            Identifier::AlphaNumeric(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Vec<Identifier>,
    pub build: Option<String>,
}

impl Version {
    pub fn parse(input: &str) -> Result<Self, VersionError> {
        let s = input.strip_prefix('v').unwrap_or(input);
        if s.is_empty() {
            return Err(VersionError::Empty);
        }

        let (rest, build) = match s.split_once('+') {
            Some((rest, build)) => {
                validate_identifiers(build)?;
                (rest, Some(build.to_owned()))
            }
            None => (s, None),
        };
        let (core, pre) = match rest.split_once('-') {
            Some((core, pre)) => (core, Some(pre)),
            None => (rest, None),
        };

        let parts: Vec<&str> = core.split('.').collect();
        if parts.len() > 3 {
            return Err(VersionError::InvalidNumber(core.to_owned()));
        }
        if parts.len() < 3 && (pre.is_some() || build.is_some()) {
            return Err(VersionError::IncompleteCore(input.to_owned()));
        }
        let major = parse_core(parts[0])?;
        let minor = parts.get(1).map_or(Ok(0), |p| parse_core(p))?;
        let patch = parts.get(2).map_or(Ok(0), |p| parse_core(p))?;

        let pre = match pre {
            Some(pre) => {
                validate_identifiers(pre)?;
                pre.split('.')
                    .map(parse_pre_identifier)
                    .collect::<Result<Vec<_>, _>>()?
            }
            None => Vec::new(),
        };

        Ok(Self {
            major,
            minor,
            patch,
            pre,
            build,
        })
    }

    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.pre.cmp(&other.pre),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_empty() {
            let pre: Vec<String> = self.pre.iter().map(ToString::to_string).collect();
            write!(f, "-{}", pre.join("."))?;
        }
        if let Some(ref build) = self.build {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Compare two version strings, tolerating malformed input.
pub fn compare(a: &str, b: &str) -> Ordering {
    match (Version::parse(a), Version::parse(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => Ordering::Equal,
    }
}

/// Whether `s` parses as a version under the rules above.
pub fn is_valid(s: &str) -> bool {
    Version::parse(s).is_ok()
}

fn parse_core(part: &str) -> Result<u64, VersionError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VersionError::InvalidNumber(part.to_owned()));
    }
    part.parse()
        .map_err(|_| VersionError::InvalidNumber(part.to_owned()))
}

fn validate_identifiers(s: &str) -> Result<(), VersionError> {
    for ident in s.split('.') {
        if ident.is_empty()
            || !ident
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-')
        {
            return Err(VersionError::InvalidIdentifier(s.to_owned()));
        }
    }
    Ok(())
}

fn parse_pre_identifier(ident: &str) -> Result<Identifier, VersionError> {
    if ident.bytes().all(|b| b.is_ascii_digit()) {
        if ident.len() > 1 && ident.starts_with('0') {
            return Err(VersionError::LeadingZero(ident.to_owned()));
        }
        parse_core(ident).map(Identifier::Numeric)
    } else {
        Ok(Identifier::AlphaNumeric(ident.to_owned()))
    }
}
