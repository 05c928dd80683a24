//! Per-keystone point triples.
//!
//! The same shape serves two roles: the minimum levels a skill requires
//! ([`Requirements`]) and the levels currently bought by the player.

use crate::id::KeystoneId;
use serde::{Deserialize, Serialize};

/// Highest level any single keystone can reach.
pub const MAX_KEYSTONE_POINTS: u32 = 50;

/// A (body, tech, hardware) triple of keystone levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeystoneLevels {
    pub body: u32,
    pub tech: u32,
    pub hardware: u32,
}

/// Minimum keystone levels a skill needs before any of its levels can be bought.
pub type Requirements = KeystoneLevels;

impl KeystoneLevels {
    pub const ZERO: KeystoneLevels = KeystoneLevels {
        body: 0,
        tech: 0,
        hardware: 0,
    };

    pub const fn new(body: u32, tech: u32, hardware: u32) -> Self {
        Self {
            body,
            tech,
            hardware,
        }
    }

    pub fn get(&self, keystone: KeystoneId) -> u32 {
        match keystone {
            KeystoneId::Body => self.body,
            KeystoneId::Tech => self.tech,
            KeystoneId::Hardware => self.hardware,
        }
    }

    pub fn set(&mut self, keystone: KeystoneId, points: u32) {
        match keystone {
            KeystoneId::Body => self.body = points,
            KeystoneId::Tech => self.tech = points,
            KeystoneId::Hardware => self.hardware = points,
        }
    }

    /// Copy of `self` with one keystone replaced.
    pub fn with(mut self, keystone: KeystoneId, points: u32) -> Self {
        self.set(keystone, points);
        self
    }

    /// Sum of all three levels.
    pub fn total(&self) -> u32 {
        self.body
            .saturating_add(self.tech)
            .saturating_add(self.hardware)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// True when every keystone is at or above the required level.
    pub fn satisfies(&self, required: &Requirements) -> bool {
        KeystoneId::ALL
            .iter()
            .all(|&k| self.get(k) >= required.get(k))
    }

    /// Points still missing per keystone to reach `required`.
    pub fn deficit(&self, required: &Requirements) -> KeystoneLevels {
        let mut missing = KeystoneLevels::ZERO;
        for k in KeystoneId::ALL {
            missing.set(k, required.get(k).saturating_sub(self.get(k)));
        }
        missing
    }

    /// Component-wise maximum of two triples.
    pub fn max(&self, other: &KeystoneLevels) -> KeystoneLevels {
        KeystoneLevels {
            body: self.body.max(other.body),
            tech: self.tech.max(other.tech),
            hardware: self.hardware.max(other.hardware),
        }
    }

    /// Iterate `(keystone, level)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (KeystoneId, u32)> + '_ {
        KeystoneId::ALL.iter().map(move |&k| (k, self.get(k)))
    }
}
