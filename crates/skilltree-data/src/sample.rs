//! Bundled sample catalog.
//!
//! A trimmed game catalog: five shells, the core augments, and a handful of
//! weapons, devices and attachments.

use skilltree_core::catalog::SkillSystem;
use std::path::Path;
use tracing::info;

use crate::loader::{DataLoadError, Format, parse_skill_system};

/// Raw JSON of the bundled sample catalog.
pub const SAMPLE_SYSTEM_JSON: &str = include_str!("../data/sample_system.json");

/// The sample catalog, validated.
pub fn sample_system() -> Result<SkillSystem, DataLoadError> {
    parse_skill_system(SAMPLE_SYSTEM_JSON, Format::Json)
}

/// Write the sample catalog to `path` as JSON, ready to edit and load back.
pub fn write_sample(path: &Path) -> Result<(), DataLoadError> {
    std::fs::write(path, SAMPLE_SYSTEM_JSON)?;
    info!(file = %path.display(), "sample skill system written");
    Ok(())
}
