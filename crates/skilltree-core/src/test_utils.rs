//! Shared catalog builders for unit and integration tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::catalog::{KeystoneDef, Skill, SkillLevel, SkillSystem};
use crate::id::{KeystoneId, SkillId};
use crate::keystone::Requirements;

/// Category assigned by [`skill`] and [`free_skill`].
pub const TEST_CATEGORY: &str = "Test";

// ===========================================================================
// Keystones
// ===========================================================================

pub fn standard_keystones() -> Vec<KeystoneDef> {
    KeystoneId::ALL
        .iter()
        .map(|&id| KeystoneDef {
            id,
            name: id.as_str().to_uppercase(),
            description: format!("{id} keystone"),
        })
        .collect()
}

// ===========================================================================
// Skills
// ===========================================================================

/// Build a skill with one level per entry in `costs`.
pub fn skill(id: &str, requirements: Requirements, prerequisites: &[&str], costs: &[u32]) -> Skill {
    Skill {
        id: SkillId::from(id),
        name: id.to_string(),
        description: format!("{id} description"),
        category: TEST_CATEGORY.to_string(),
        sort_order: 0,
        prerequisite_skills: prerequisites.iter().map(|&p| SkillId::from(p)).collect(),
        requirements,
        levels: costs
            .iter()
            .enumerate()
            .map(|(i, &cost)| SkillLevel {
                level: u32::try_from(i + 1).unwrap_or(u32::MAX),
                points_required: cost,
                description: format!("{id} level {}", i + 1),
                rewards: vec![],
            })
            .collect(),
    }
}

/// Build a skill with all-zero requirements and no prerequisites.
pub fn free_skill(id: &str, costs: &[u32]) -> Skill {
    skill(id, Requirements::ZERO, &[], costs)
}

// ===========================================================================
// Systems
// ===========================================================================

pub fn system(available_points: u32, skills: Vec<Skill>) -> SkillSystem {
    SkillSystem {
        available_points,
        keystones: standard_keystones(),
        skills,
    }
}

/// Skill `A` (free, one level costing 0) and skill `B` (body >= 5,
/// prerequisite `A`, one level costing 2) with a budget of 10.
pub fn example_system() -> SkillSystem {
    system(
        10,
        vec![
            free_skill("A", &[0]),
            skill("B", Requirements::new(5, 0, 0), &["A"], &[2]),
        ],
    )
}

/// A small branching tree used by property tests:
///
/// ```text
/// root (free, 3 levels) ─┬─ blade (body 5)  ── edge (body 10, tech 5)
///                        └─ relay (tech 5)  ── uplink (tech 15, hardware 10)
/// rig (hardware 20, no prerequisites)
/// ```
pub fn branching_system(available_points: u32) -> SkillSystem {
    system(
        available_points,
        vec![
            free_skill("root", &[1, 2, 3]),
            skill("blade", Requirements::new(5, 0, 0), &["root"], &[1, 1, 2]),
            skill("edge", Requirements::new(10, 5, 0), &["blade"], &[2, 3]),
            skill("relay", Requirements::new(0, 5, 0), &["root"], &[1, 2]),
            skill("uplink", Requirements::new(0, 15, 10), &["relay"], &[3]),
            skill("rig", Requirements::new(0, 0, 20), &[], &[2, 2, 2]),
        ],
    )
}
