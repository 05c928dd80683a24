use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Identifies a skill in the catalog. Stable across loads; the string is
/// authored in the catalog document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(pub String);

impl SkillId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SkillId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SkillId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SkillId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for SkillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the three foundation attribute pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeystoneId {
    Body,
    Tech,
    Hardware,
}

impl KeystoneId {
    /// All keystones, in canonical order.
    pub const ALL: [KeystoneId; 3] = [KeystoneId::Body, KeystoneId::Tech, KeystoneId::Hardware];

    pub fn as_str(self) -> &'static str {
        match self {
            KeystoneId::Body => "body",
            KeystoneId::Tech => "tech",
            KeystoneId::Hardware => "hardware",
        }
    }
}

impl fmt::Display for KeystoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized keystone name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown keystone '{0}' (expected body, tech or hardware)")]
pub struct UnknownKeystone(pub String);

impl FromStr for KeystoneId {
    type Err = UnknownKeystone;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "body" => Ok(KeystoneId::Body),
            "tech" => Ok(KeystoneId::Tech),
            "hardware" => Ok(KeystoneId::Hardware),
            other => Err(UnknownKeystone(other.to_string())),
        }
    }
}
