//! Checks a raw [`SkillSystemData`] document and turns it into a
//! [`SkillSystem`] the planner can load.
//!
//! Structural checks run first (required fields, numeric ranges, known
//! keystone ids), then cross-reference checks over the whole skill list.
//! The first problem found is returned.

use skilltree_core::catalog::{KeystoneDef, Skill, SkillLevel, SkillSystem};
use skilltree_core::id::{KeystoneId, SkillId};
use skilltree_core::keystone::Requirements;
use std::collections::{HashMap, HashSet};

use crate::schema::{KeystoneData, RequirementsData, SkillData, SkillLevelData, SkillSystemData};

// ===========================================================================
// Errors
// ===========================================================================

/// A catalog document that is well-formed but not loadable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    /// A top-level field is absent.
    #[error("document must contain '{0}'")]
    MissingSection(&'static str),

    /// A required field of a keystone or skill is absent or empty.
    #[error("{owner}: '{field}' is missing or empty")]
    MissingField { owner: String, field: &'static str },

    /// A numeric field is negative, fractional, or out of range.
    #[error("{owner}: '{field}' must be a whole number >= 0, got {value}")]
    InvalidNumber {
        owner: String,
        field: &'static str,
        value: f64,
    },

    #[error("unknown keystone id '{0}' (expected body, tech or hardware)")]
    UnknownKeystone(String),

    #[error("keystone '{0}' is defined more than once")]
    DuplicateKeystone(KeystoneId),

    #[error("skill '{0}' is defined more than once")]
    DuplicateSkill(String),

    #[error("skill '{0}' lists itself as a prerequisite")]
    SelfPrerequisite(String),

    #[error("skill '{skill}' requires unknown skill '{prerequisite}'")]
    UnknownPrerequisite { skill: String, prerequisite: String },

    /// Free skills are granted at load time, so everything they depend on
    /// must be granted too: free, with at least one level.
    #[error("free skill '{skill}' requires '{prerequisite}', which is not granted at load")]
    FreeSkillPrerequisite { skill: String, prerequisite: String },
}

// ===========================================================================
// Validation
// ===========================================================================

/// Validate a raw document.
pub fn validate(data: SkillSystemData) -> Result<SkillSystem, CatalogError> {
    let available_points = whole_number(
        data.available_points
            .ok_or(CatalogError::MissingSection("availablePoints"))?,
        "document",
        "availablePoints",
    )?;
    let raw_keystones = data
        .keystones
        .ok_or(CatalogError::MissingSection("keystones"))?;
    let raw_skills = data.skills.ok_or(CatalogError::MissingSection("skills"))?;

    let mut keystones = Vec::with_capacity(raw_keystones.len());
    for (idx, raw) in raw_keystones.into_iter().enumerate() {
        let keystone = convert_keystone(idx, raw)?;
        if keystones.iter().any(|k: &KeystoneDef| k.id == keystone.id) {
            return Err(CatalogError::DuplicateKeystone(keystone.id));
        }
        keystones.push(keystone);
    }

    let skills = raw_skills
        .into_iter()
        .enumerate()
        .map(|(idx, raw)| convert_skill(idx, raw))
        .collect::<Result<Vec<_>, _>>()?;
    check_references(&skills)?;

    Ok(SkillSystem {
        available_points,
        keystones,
        skills,
    })
}

fn convert_keystone(idx: usize, raw: KeystoneData) -> Result<KeystoneDef, CatalogError> {
    let owner = format!("keystones[{idx}]");
    let id_text = raw.id.ok_or_else(|| CatalogError::MissingField {
        owner: owner.clone(),
        field: "id",
    })?;
    let id = id_text
        .parse::<KeystoneId>()
        .map_err(|_| CatalogError::UnknownKeystone(id_text.clone()))?;
    let owner = format!("keystone '{id}'");
    Ok(KeystoneDef {
        id,
        name: raw.name.ok_or_else(|| CatalogError::MissingField {
            owner: owner.clone(),
            field: "name",
        })?,
        description: raw.description.ok_or_else(|| CatalogError::MissingField {
            owner,
            field: "description",
        })?,
    })
}

fn convert_skill(idx: usize, raw: SkillData) -> Result<Skill, CatalogError> {
    let id = non_empty(raw.id, &format!("skills[{idx}]"), "id")?;
    let owner = format!("skill '{id}'");
    let name = non_empty(raw.name, &owner, "name")?;
    let description = non_empty(raw.description, &owner, "description")?;
    let category = non_empty(raw.category, &owner, "category")?;
    let requirements = convert_requirements(
        raw.requirements.ok_or_else(|| CatalogError::MissingField {
            owner: owner.clone(),
            field: "requirements",
        })?,
        &owner,
    )?;
    let levels = raw
        .levels
        .ok_or_else(|| CatalogError::MissingField {
            owner: owner.clone(),
            field: "levels",
        })?
        .into_iter()
        .enumerate()
        .map(|(pos, level)| convert_level(pos, level, &owner))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Skill {
        id: SkillId::new(id),
        name,
        description,
        category,
        sort_order: raw.sort_order,
        prerequisite_skills: raw.prerequisite_skills.into_iter().map(SkillId::from).collect(),
        requirements,
        levels,
    })
}

fn convert_requirements(raw: RequirementsData, owner: &str) -> Result<Requirements, CatalogError> {
    let field = |value: Option<f64>, name: &'static str| {
        value
            .ok_or_else(|| CatalogError::MissingField {
                owner: owner.to_string(),
                field: name,
            })
            .and_then(|v| whole_number(v, owner, name))
    };
    Ok(Requirements::new(
        field(raw.body, "requirements.body")?,
        field(raw.tech, "requirements.tech")?,
        field(raw.hardware, "requirements.hardware")?,
    ))
}

fn convert_level(pos: usize, raw: SkillLevelData, owner: &str) -> Result<SkillLevel, CatalogError> {
    let level_owner = format!("{owner} level {}", pos + 1);
    let cost = raw.points_required.ok_or_else(|| CatalogError::MissingField {
        owner: level_owner.clone(),
        field: "pointsRequired",
    })?;
    Ok(SkillLevel {
        level: raw
            .level
            .unwrap_or_else(|| u32::try_from(pos + 1).unwrap_or(u32::MAX)),
        points_required: whole_number(cost, &level_owner, "pointsRequired")?,
        description: raw.description,
        rewards: raw.rewards,
    })
}

/// Duplicate ids, self references, dangling prerequisites, and free skills
/// that depend on anything not granted at load.
fn check_references(skills: &[Skill]) -> Result<(), CatalogError> {
    let mut by_id: HashMap<&str, &Skill> = HashMap::with_capacity(skills.len());
    for skill in skills {
        if by_id.insert(skill.id.as_str(), skill).is_some() {
            return Err(CatalogError::DuplicateSkill(skill.id.to_string()));
        }
    }

    for skill in skills {
        let mut seen = HashSet::new();
        for prereq in &skill.prerequisite_skills {
            if !seen.insert(prereq.as_str()) {
                continue;
            }
            if prereq == &skill.id {
                return Err(CatalogError::SelfPrerequisite(skill.id.to_string()));
            }
            let Some(target) = by_id.get(prereq.as_str()) else {
                return Err(CatalogError::UnknownPrerequisite {
                    skill: skill.id.to_string(),
                    prerequisite: prereq.to_string(),
                });
            };
            if skill.is_free() && (!target.is_free() || target.levels.is_empty()) {
                return Err(CatalogError::FreeSkillPrerequisite {
                    skill: skill.id.to_string(),
                    prerequisite: prereq.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn non_empty(value: Option<String>, owner: &str, field: &'static str) -> Result<String, CatalogError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CatalogError::MissingField {
            owner: owner.to_string(),
            field,
        }),
    }
}

fn whole_number(value: f64, owner: &str, field: &'static str) -> Result<u32, CatalogError> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX) {
        Ok(value as u32)
    } else {
        Err(CatalogError::InvalidNumber {
            owner: owner.to_string(),
            field,
            value,
        })
    }
}

// ===========================================================================
// Tests
// ===========================================================================
