//! Foundation perk scaling for the skilltree planner.
//!
//! Each keystone unlocks a fixed set of passive perks as its level rises.
//! Perks come in three kinds:
//!
//! - **Threshold**: full value once the keystone reaches 25, zero before.
//! - **Scaled**: zero through 25, then a linear ramp `max * (p - 25) / 24`
//!   across 26..=49, and full value from 50.
//! - **Unlock**: a boolean that turns on at 50.
//!
//! Magnitudes are computed in [`Fixed64`] so identical keystone levels always
//! yield bit-identical values.
//!
//! # Usage
//!
//! ```ignore
//! let perks = FoundationPerks::from_levels(&keystone_levels);
//! let accel = perks.body.magnitude("acceleration");
//! ```

use skilltree_core::fixed::{Fixed64, fixed64_to_f64, ratio};
use skilltree_core::id::KeystoneId;
use skilltree_core::keystone::{KeystoneLevels, MAX_KEYSTONE_POINTS};
use std::fmt;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Level at which threshold perks switch on.
pub const THRESHOLD_POINTS: u32 = 25;

/// Width of the linear ramp for scaled perks. The ramp is anchored at
/// [`THRESHOLD_POINTS`], so level 26 is the first step.
pub const SCALE_BAND: u32 = 24;

/// Level at which scaled perks are pinned to full value and unlock perks
/// switch on.
pub const FULL_POINTS: u32 = MAX_KEYSTONE_POINTS;

// ---------------------------------------------------------------------------
// Perk table
// ---------------------------------------------------------------------------

/// How a perk's value derives from its keystone level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerkKind {
    Threshold,
    Scaled,
    Unlock,
}

/// A static perk definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerkDef {
    /// Stable key, as used in exported builds.
    pub key: &'static str,
    pub kind: PerkKind,
    /// Full magnitude. Ignored for [`PerkKind::Unlock`].
    pub max_value: u32,
}

const fn perk(key: &'static str, kind: PerkKind, max_value: u32) -> PerkDef {
    PerkDef {
        key,
        kind,
        max_value,
    }
}

pub const BODY_PERKS: &[PerkDef] = &[
    perk("weaponHandlingPenalty", PerkKind::Threshold, 25),
    perk("acceleration", PerkKind::Scaled, 10),
    perk("maxVitalsDefenseReduction", PerkKind::Scaled, 10),
    perk("backupHeavyDamageReduction", PerkKind::Scaled, 5),
    perk("aerialManeuver", PerkKind::Unlock, 0),
    perk("bleedFireDamageReduction", PerkKind::Scaled, 25),
];

pub const TECH_PERKS: &[PerkDef] = &[
    perk("nanoWireRange", PerkKind::Threshold, 50),
    perk("coreDamageReduction", PerkKind::Scaled, 20),
    perk("scanAugmentCooldown", PerkKind::Scaled, 20),
    perk("baseDefenseRegen", PerkKind::Scaled, 20),
    perk("debuffDefenseDamage", PerkKind::Scaled, 5),
    perk("coreActivationCost", PerkKind::Scaled, 25),
];

pub const HARDWARE_PERKS: &[PerkDef] = &[
    perk("reserveAmmo", PerkKind::Threshold, 100),
    perk("loadoutSpeedPenalty", PerkKind::Scaled, 25),
    perk("primaryStimCooldown", PerkKind::Scaled, 50),
    perk("explosiveDamageResistance", PerkKind::Scaled, 25),
    perk("extraWeaponModSlot", PerkKind::Unlock, 0),
    perk("deviceCooldowns", PerkKind::Scaled, 25),
];

/// The perk table for one keystone.
pub fn perk_table(keystone: KeystoneId) -> &'static [PerkDef] {
    match keystone {
        KeystoneId::Body => BODY_PERKS,
        KeystoneId::Tech => TECH_PERKS,
        KeystoneId::Hardware => HARDWARE_PERKS,
    }
}

// ---------------------------------------------------------------------------
// Scaling functions
// ---------------------------------------------------------------------------

/// Threshold perk: `max_value` from 25 on, else zero.
pub fn threshold_value(points: u32, max_value: u32) -> Fixed64 {
    if points >= THRESHOLD_POINTS {
        Fixed64::from_num(max_value)
    } else {
        Fixed64::ZERO
    }
}

/// Scaled perk: zero below 26, `max_value` from 50, linear in between.
pub fn scaled_value(points: u32, max_value: u32) -> Fixed64 {
    if points <= THRESHOLD_POINTS {
        return Fixed64::ZERO;
    }
    if points >= FULL_POINTS {
        return Fixed64::from_num(max_value);
    }
    let steps = points - THRESHOLD_POINTS;
    ratio(max_value.saturating_mul(steps), SCALE_BAND)
}

/// Unlock perk: active from 50.
pub fn unlock_value(points: u32) -> bool {
    points >= FULL_POINTS
}

// ---------------------------------------------------------------------------
// Computed perks
// ---------------------------------------------------------------------------

/// The value of one perk at a given keystone level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerkValue {
    Magnitude(Fixed64),
    Unlocked(bool),
}

impl PerkValue {
    pub fn magnitude(self) -> Option<Fixed64> {
        match self {
            PerkValue::Magnitude(v) => Some(v),
            PerkValue::Unlocked(_) => None,
        }
    }

    pub fn is_active(self) -> bool {
        match self {
            PerkValue::Magnitude(v) => v > Fixed64::ZERO,
            PerkValue::Unlocked(on) => on,
        }
    }
}

impl fmt::Display for PerkValue {
    /// Magnitudes render as percentages with one decimal below 1 and none
    /// otherwise; unlocks render as `active` / `inactive`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerkValue::Magnitude(v) => {
                let value = fixed64_to_f64(*v);
                if value < 1.0 {
                    write!(f, "{value:.1}%")
                } else {
                    write!(f, "{value:.0}%")
                }
            }
            PerkValue::Unlocked(true) => f.write_str("active"),
            PerkValue::Unlocked(false) => f.write_str("inactive"),
        }
    }
}

/// Evaluate one perk definition at `points`.
pub fn evaluate(def: &PerkDef, points: u32) -> PerkValue {
    match def.kind {
        PerkKind::Threshold => PerkValue::Magnitude(threshold_value(points, def.max_value)),
        PerkKind::Scaled => PerkValue::Magnitude(scaled_value(points, def.max_value)),
        PerkKind::Unlock => PerkValue::Unlocked(unlock_value(points)),
    }
}

/// A perk definition paired with its current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerkReading {
    pub def: &'static PerkDef,
    pub value: PerkValue,
}

/// All perks of one keystone at its current level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeystonePerks {
    pub keystone: KeystoneId,
    pub points: u32,
    pub perks: Vec<PerkReading>,
}

impl KeystonePerks {
    pub fn compute(keystone: KeystoneId, points: u32) -> Self {
        let perks = perk_table(keystone)
            .iter()
            .map(|def| PerkReading {
                def,
                value: evaluate(def, points),
            })
            .collect();
        Self {
            keystone,
            points,
            perks,
        }
    }

    pub fn get(&self, key: &str) -> Option<PerkValue> {
        self.perks
            .iter()
            .find(|r| r.def.key == key)
            .map(|r| r.value)
    }

    /// Magnitude of a threshold or scaled perk. `None` for unknown keys and
    /// unlock perks.
    pub fn magnitude(&self, key: &str) -> Option<Fixed64> {
        self.get(key).and_then(PerkValue::magnitude)
    }

    /// State of an unlock perk. `None` for unknown keys and magnitude perks.
    pub fn unlocked(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            PerkValue::Unlocked(on) => Some(on),
            PerkValue::Magnitude(_) => None,
        }
    }

    /// Perks currently granting something.
    pub fn active(&self) -> impl Iterator<Item = &PerkReading> {
        self.perks.iter().filter(|r| r.value.is_active())
    }
}

/// Derived, read-only perk view for all three keystones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundationPerks {
    pub body: KeystonePerks,
    pub tech: KeystonePerks,
    pub hardware: KeystonePerks,
}

impl FoundationPerks {
    pub fn from_levels(levels: &KeystoneLevels) -> Self {
        Self {
            body: KeystonePerks::compute(KeystoneId::Body, levels.body),
            tech: KeystonePerks::compute(KeystoneId::Tech, levels.tech),
            hardware: KeystonePerks::compute(KeystoneId::Hardware, levels.hardware),
        }
    }

    pub fn for_keystone(&self, keystone: KeystoneId) -> &KeystonePerks {
        match keystone {
            KeystoneId::Body => &self.body,
            KeystoneId::Tech => &self.tech,
            KeystoneId::Hardware => &self.hardware,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
