//! Catalog document types and the indexed, read-only catalog the planner
//! queries.
//!
//! [`SkillSystem`] is the typed form of a catalog document (already
//! validated by the loader, or built in code). [`Catalog`] indexes its skills
//! by id and by reverse prerequisite edge so the planner's dependency checks
//! do not scan the whole skill list.

use crate::id::{KeystoneId, SkillId};
use crate::keystone::Requirements;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

/// One purchasable level of a skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillLevel {
    /// 1-based level number as authored. Display only; purchase order is
    /// the position in [`Skill::levels`].
    pub level: u32,
    pub points_required: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rewards: Vec<String>,
}

/// A catalog entry with sequentially purchasable levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub description: String,
    /// Display grouping. Not used by allocation rules.
    pub category: String,
    #[serde(default)]
    pub sort_order: i32,
    /// Skills that must hold at least one level before this skill's first
    /// level can be bought.
    #[serde(default)]
    pub prerequisite_skills: Vec<SkillId>,
    pub requirements: Requirements,
    pub levels: Vec<SkillLevel>,
}

impl Skill {
    /// A free skill has all-zero requirements. Its first level is granted at
    /// load time without charge and can never be removed.
    pub fn is_free(&self) -> bool {
        self.requirements.is_zero()
    }

    /// Number of purchasable levels.
    pub fn max_level(&self) -> u32 {
        u32::try_from(self.levels.len()).unwrap_or(u32::MAX)
    }

    /// The level bought next when the skill currently holds `current` levels.
    pub fn next_level(&self, current: u32) -> Option<&SkillLevel> {
        self.levels.get(current as usize)
    }

    /// The most recently bought level when the skill holds `current` levels.
    pub fn owned_level(&self, current: u32) -> Option<&SkillLevel> {
        let idx = current.checked_sub(1)?;
        self.levels.get(idx as usize)
    }

    /// Points actually charged for holding `level` levels. A free skill's
    /// first level was granted, not bought, so it is never counted.
    pub fn spent_for(&self, level: u32) -> u32 {
        let owned = (level as usize).min(self.levels.len());
        let first_paid = usize::from(self.is_free());
        self.levels
            .iter()
            .take(owned)
            .skip(first_paid)
            .fold(0u32, |sum, l| sum.saturating_add(l.points_required))
    }

    /// Sum of the requirement triple. Used for display ordering.
    pub fn requirement_total(&self) -> u32 {
        self.requirements.total()
    }
}

/// Display metadata for one keystone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeystoneDef {
    pub id: KeystoneId,
    pub name: String,
    pub description: String,
}

/// A complete catalog document: keystones, skills, and the starting budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillSystem {
    pub available_points: u32,
    pub keystones: Vec<KeystoneDef>,
    pub skills: Vec<Skill>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Indexed view over a loaded skill list. Immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    skills: Vec<Skill>,
    keystones: Vec<KeystoneDef>,
    /// Skill id -> position in `skills`.
    index: HashMap<SkillId, usize>,
    /// Prerequisite id -> positions of the skills that list it.
    dependents: HashMap<SkillId, Vec<usize>>,
}

impl Catalog {
    /// Build a catalog. If two skills share an id the first one wins and
    /// later duplicates are dropped.
    pub fn new(keystones: Vec<KeystoneDef>, skills: Vec<Skill>) -> Self {
        let mut kept: Vec<Skill> = Vec::with_capacity(skills.len());
        let mut index = HashMap::with_capacity(skills.len());

        for skill in skills {
            if index.contains_key(&skill.id) {
                continue;
            }
            index.insert(skill.id.clone(), kept.len());
            kept.push(skill);
        }

        let mut dependents: HashMap<SkillId, Vec<usize>> = HashMap::new();
        for (pos, skill) in kept.iter().enumerate() {
            for prereq in &skill.prerequisite_skills {
                let entry = dependents.entry(prereq.clone()).or_default();
                if !entry.contains(&pos) {
                    entry.push(pos);
                }
            }
        }

        Self {
            skills: kept,
            keystones,
            index,
            dependents,
        }
    }

    pub fn skill(&self, id: &str) -> Option<&Skill> {
        self.index.get(id).and_then(|&pos| self.skills.get(pos))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// All skills in document order.
    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    pub fn keystones(&self) -> &[KeystoneDef] {
        &self.keystones
    }

    pub fn keystone(&self, id: KeystoneId) -> Option<&KeystoneDef> {
        self.keystones.iter().find(|k| k.id == id)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Skills that list `id` as a prerequisite.
    pub fn dependents_of<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Skill> + use<'a> {
        self.dependents
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|&pos| self.skills.get(pos))
    }

    /// Skills whose first level is granted for free.
    pub fn free_skills(&self) -> impl Iterator<Item = &Skill> {
        self.skills.iter().filter(|s| s.is_free())
    }

    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.skills.iter().map(|s| s.category.as_str()).collect();
        set.into_iter().collect()
    }

    /// Category of the first skill in document order.
    pub fn first_category(&self) -> Option<&str> {
        self.skills.first().map(|s| s.category.as_str())
    }

    /// Skills in `category`, ordered by total requirement points, then by
    /// `sort_order`.
    pub fn skills_in_category(&self, category: &str) -> Vec<&Skill> {
        let mut skills: Vec<&Skill> = self
            .skills
            .iter()
            .filter(|s| s.category == category)
            .collect();
        skills.sort_by_key(|s| (s.requirement_total(), s.sort_order));
        skills
    }
}

impl From<SkillSystem> for Catalog {
    fn from(system: SkillSystem) -> Self {
        Catalog::new(system.keystones, system.skills)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
