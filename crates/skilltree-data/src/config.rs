//! Planner configuration files.
//!
//! A config is a [`PlannerConfig`] in any supported format. Every field is
//! optional, so `{}` (or an empty TOML file) yields the defaults.

use skilltree_planner::PlannerConfig;
use std::path::Path;
use tracing::info;

use crate::loader::{DataLoadError, deserialize_file, find_data_file};

/// Base name looked up by [`discover_planner_config`].
pub const CONFIG_BASE_NAME: &str = "planner";

/// Load a planner config from `path`.
pub fn load_planner_config(path: &Path) -> Result<PlannerConfig, DataLoadError> {
    let config: PlannerConfig = deserialize_file(path)?;
    info!(
        file = %path.display(),
        policy = ?config.allocation_policy,
        budget = ?config.budget_source,
        "planner config loaded"
    );
    Ok(config)
}

/// Load `planner.{ron,toml,json}` from `dir`, or the defaults if none exists.
pub fn discover_planner_config(dir: &Path) -> Result<PlannerConfig, DataLoadError> {
    match find_data_file(dir, CONFIG_BASE_NAME)? {
        Some(path) => load_planner_config(&path),
        None => Ok(PlannerConfig::default()),
    }
}
