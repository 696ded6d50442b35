//! Semantic versioning for module compatibility

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use void_reflect::{Descriptor, Reflect};

/// Semantic version for compatibility checking
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl Version {
    /// Create a new version
    #[inline]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self { major, minor, patch }
    }

    /// Version 0.0.0
    pub const ZERO: Version = Version::new(0, 0, 0);

    /// Check whether this version can stand in where `required` is asked for
    ///
    /// Before 1.0 the minor version must match exactly. From 1.0 on the
    /// major version must match and this version must not be older.
    pub fn is_compatible_with(&self, required: &Version) -> bool {
        if self.major == 0 && required.major == 0 {
            self.minor == required.minor && self.patch >= required.patch
        } else {
            self.major == required.major && *self >= *required
        }
    }

    /// Parse from "major.minor.patch"; "major.minor" implies patch 0
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = match parts.next() {
            Some(patch) => patch.parse().ok()?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self { major, minor, patch })
    }

    /// Pack into a single u64 that orders like the version
    #[inline]
    pub const fn to_u64(&self) -> u64 {
        (self.major as u64) << 32 | (self.minor as u64) << 16 | self.patch as u64
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_u64().cmp(&other.to_u64())
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl fmt::Debug for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Version({})", self)
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::new(0, 1, 0)
    }
}

/// Error from parsing a malformed version string
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid version '{0}', expected major.minor.patch")]
pub struct ParseVersionError(String);

impl FromStr for Version {
    type Err = ParseVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ParseVersionError(s.to_string()))
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl Reflect for Version {
    fn describe(d: &mut Descriptor<Self>) {
        d.name("void_core::Version")
            .copyable()
            .comparable()
            .ordered()
            .debuggable()
            .default_constructible()
            .constructor(Version::new)
            .conversion(|v: &Version| v.to_string())
            .field(|v: &Version| &v.major, |v: &mut Version| &mut v.major)
            .field(|v: &Version| &v.minor, |v: &mut Version| &mut v.minor)
            .field(|v: &Version| &v.patch, |v: &mut Version| &mut v.patch);
    }
}

/// Macro for creating versions at compile time: `version!(1, 4, 0)` or `version!(1, 4)`
#[macro_export]
macro_rules! version {
    ($major:expr, $minor:expr, $patch:expr $(,)?) => {
        $crate::Version::new($major, $minor, $patch)
    };
    ($major:expr, $minor:expr $(,)?) => {
        $crate::Version::new($major, $minor, 0)
    };
}
