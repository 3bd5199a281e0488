// Path: crates/types/src/version.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A published revision of a plugin's setup contract inside its repository.
///
/// Ordering is lexicographic: release first, then build. Field order matters for
/// the derived `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionTag {
    /// Release number (`uint8` on-chain).
    pub release: u8,
    /// Build number within the release (`uint16` on-chain).
    pub build: u16,
}

impl VersionTag {
    pub const fn new(release: u8, build: u16) -> Self {
        Self { release, build }
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.release, self.build)
    }
}

impl FromStr for VersionTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (release, build) = s
            .split_once('.')
            .ok_or_else(|| format!("expected <release>.<build>, got '{s}'"))?;
        let release = release
            .trim()
            .parse::<u8>()
            .map_err(|e| format!("invalid release '{release}': {e}"))?;
        let build = build
            .trim()
            .parse::<u16>()
            .map_err(|e| format!("invalid build '{build}': {e}"))?;
        Ok(Self { release, build })
    }
}
