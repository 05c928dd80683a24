//! Serde structs for catalog documents as they appear on disk.
//!
//! Every field the validator checks is optional here, so a missing or
//! malformed entry is reported by [`crate::validate`] with the skill or
//! keystone it belongs to instead of a bare serde message. Numeric fields
//! are read as `f64` so any number is accepted and range-checked later.

use serde::Deserialize;

// ===========================================================================
// Document
// ===========================================================================

/// Top-level catalog document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillSystemData {
    pub available_points: Option<f64>,
    pub keystones: Option<Vec<KeystoneData>>,
    pub skills: Option<Vec<SkillData>>,
}

// ===========================================================================
// Keystones
// ===========================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeystoneData {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

// ===========================================================================
// Skills
// ===========================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillData {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub prerequisite_skills: Vec<String>,
    pub requirements: Option<RequirementsData>,
    pub levels: Option<Vec<SkillLevelData>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequirementsData {
    pub body: Option<f64>,
    pub tech: Option<f64>,
    pub hardware: Option<f64>,
}

/// One purchasable level. `level` is informational; levels are bought in
/// array order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillLevelData {
    pub level: Option<u32>,
    pub points_required: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rewards: Vec<String>,
}
