//! Versioned build document for exporting and re-importing a player's build.
//!
//! A snapshot is a plain JSON document: a header identifying the format and
//! version, followed by the budget, keystone levels, and per-skill levels.
//! It carries no catalog data; importing it requires the same catalog to be
//! loaded (see `SkillPlanner::restore`).

use crate::id::SkillId;
use crate::keystone::KeystoneLevels;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Format tag identifying a skilltree build document.
pub const SNAPSHOT_FORMAT: &str = "skilltree-build";

/// Current format version. Increment when breaking the document shape.
pub const FORMAT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while encoding or decoding a build document.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("build document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not a build document: expected format '{expected}', got '{0}'", expected = SNAPSHOT_FORMAT)]
    InvalidFormat(String),
    #[error("unsupported build document version: expected {expected}, got {0}", expected = FORMAT_VERSION)]
    UnsupportedVersion(u32),
    #[error("build document from future version {0} (this build supports up to {max})", max = FORMAT_VERSION)]
    FutureVersion(u32),
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Header at the top of every build document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub format: String,
    pub version: u32,
}

impl SnapshotHeader {
    pub fn new() -> Self {
        Self {
            format: SNAPSHOT_FORMAT.to_string(),
            version: FORMAT_VERSION,
        }
    }

    /// Validate the header. Returns `Ok(())` if this build can read it.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.format != SNAPSHOT_FORMAT {
            return Err(SnapshotError::InvalidFormat(self.format.clone()));
        }
        if self.version > FORMAT_VERSION {
            return Err(SnapshotError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// An exported build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSnapshot {
    pub header: SnapshotHeader,
    pub available_points: u32,
    pub keystone_points: KeystoneLevels,
    /// Skills holding at least one level. Sorted by id for stable output.
    pub allocated_points: BTreeMap<SkillId, u32>,
}

impl BuildSnapshot {
    pub fn new(
        available_points: u32,
        keystone_points: KeystoneLevels,
        allocated_points: BTreeMap<SkillId, u32>,
    ) -> Self {
        Self {
            header: SnapshotHeader::new(),
            available_points,
            keystone_points,
            allocated_points,
        }
    }

    /// Level recorded for `id`, 0 if absent.
    pub fn level_of(&self, id: &str) -> u32 {
        self.allocated_points.get(id).copied().unwrap_or(0)
    }

    /// Encode as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON and validate the header.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: BuildSnapshot = serde_json::from_str(json)?;
        snapshot.header.validate()?;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BuildSnapshot {
        let mut allocated = BTreeMap::new();
        allocated.insert(SkillId::from("A"), 1);
        allocated.insert(SkillId::from("B"), 1);
        BuildSnapshot::new(3, KeystoneLevels::new(5, 0, 0), allocated)
    }

    #[test]
    fn json_round_trip_preserves_build() {
        let json = sample().to_json().unwrap();
        let back = BuildSnapshot::from_json(&json).unwrap();
        assert_eq!(back, sample());
        assert_eq!(back.level_of("B"), 1);
        assert_eq!(back.level_of("C"), 0);
    }

    #[test]
    fn document_shape() {
        let json = sample().to_json().unwrap();
        assert!(json.contains("\"format\": \"skilltree-build\""));
        assert!(json.contains("\"availablePoints\": 3"));
        assert!(json.contains("\"keystonePoints\""));
    }

    #[test]
    fn rejects_foreign_format() {
        let mut snap = sample();
        snap.header.format = "something-else".to_string();
        let json = serde_json::to_string(&snap).unwrap();
        assert!(matches!(
            BuildSnapshot::from_json(&json),
            Err(SnapshotError::InvalidFormat(ref f)) if f == "something-else"
        ));
    }

    #[test]
    fn rejects_other_versions() {
        let mut snap = sample();
        snap.header.version = FORMAT_VERSION + 1;
        let json = serde_json::to_string(&snap).unwrap();
        assert!(matches!(
            BuildSnapshot::from_json(&json),
            Err(SnapshotError::FutureVersion(_))
        ));

        snap.header.version = 0;
        let json = serde_json::to_string(&snap).unwrap();
        assert!(matches!(
            BuildSnapshot::from_json(&json),
            Err(SnapshotError::UnsupportedVersion(0))
        ));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            BuildSnapshot::from_json("{not json"),
            Err(SnapshotError::Json(_))
        ));
    }
}
