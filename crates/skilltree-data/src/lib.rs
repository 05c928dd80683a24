//! Catalog and config loading for the skilltree planner.
//!
//! Documents are read from RON, JSON, or TOML (picked by file extension),
//! deserialized into the lenient structs in [`schema`], and checked by
//! [`validate`] before the engine ever sees them.

pub mod config;
pub mod loader;
pub mod sample;
pub mod schema;
pub mod validate;

pub use config::{discover_planner_config, load_planner_config};
pub use loader::{DataLoadError, Format, load_into, load_skill_system, parse_skill_system};
pub use sample::{sample_system, write_sample};
pub use validate::CatalogError;
