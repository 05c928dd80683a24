//! Skilltree Core -- shared types for the skill tree build planner.
//!
//! This crate holds the vocabulary every other skilltree crate speaks:
//! identifiers, keystone point triples, the catalog document and its index,
//! deterministic fixed-point math, and the exported build document.
//!
//! # Key Types
//!
//! - [`id::SkillId`] / [`id::KeystoneId`] -- skill and keystone identifiers.
//! - [`keystone::KeystoneLevels`] -- a (body, tech, hardware) triple, used both
//!   for skill requirements and for the player's bought keystone levels.
//! - [`catalog::SkillSystem`] -- a typed catalog document.
//! - [`catalog::Catalog`] -- indexed, read-only view of a loaded catalog.
//! - [`snapshot::BuildSnapshot`] -- versioned export of a player's build.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point type for perk magnitudes.

pub mod catalog;
pub mod fixed;
pub mod id;
pub mod keystone;
pub mod snapshot;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
