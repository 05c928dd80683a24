//! Reads catalog documents from disk or memory and hands validated systems
//! to the planner.
//!
//! Format is detected from the file extension (RON/JSON/TOML); every format
//! shares the same document shape.

use ron::extensions::Extensions;
use serde::de::DeserializeOwned;
use skilltree_core::catalog::SkillSystem;
use skilltree_planner::SkillPlanner;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::schema::SkillSystemData;
use crate::validate::{CatalogError, validate};

/// Origin reported for documents parsed from memory.
const INLINE_ORIGIN: &str = "<inline>";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading a catalog or config document.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The document parsed but is not a loadable catalog.
    #[error("invalid skill system in {file}: {source}")]
    Invalid {
        file: PathBuf,
        source: CatalogError,
    },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    pub const EXTENSIONS: [&'static str; 3] = ["ron", "toml", "json"];
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    let format = match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Format::Ron,
        Some("toml") => Format::Toml,
        Some("json") => Format::Json,
        _ => {
            return Err(DataLoadError::UnsupportedFormat {
                file: path.to_path_buf(),
            });
        }
    };
    debug!(file = %path.display(), ?format, "detected document format");
    Ok(format)
}

/// Scan `dir` for `{base_name}.ron`, `{base_name}.toml` or
/// `{base_name}.json`. More than one match is an error.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in Format::EXTENSIONS {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize `content` in the given format. `origin` only labels errors.
///
/// RON documents may omit `Some(..)` around optional fields.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    origin: &Path,
) -> Result<T, DataLoadError> {
    let parse_error = |detail: String| DataLoadError::Parse {
        file: origin.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(content)
            .map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

// ===========================================================================
// Skill systems
// ===========================================================================

/// Load and validate a catalog document from disk.
pub fn load_skill_system(path: &Path) -> Result<SkillSystem, DataLoadError> {
    let raw: SkillSystemData = deserialize_file(path)?;
    let system = validate(raw).map_err(|source| DataLoadError::Invalid {
        file: path.to_path_buf(),
        source,
    })?;
    info!(
        file = %path.display(),
        skills = system.skills.len(),
        available_points = system.available_points,
        "skill system document loaded"
    );
    Ok(system)
}

/// Parse and validate a catalog document held in memory (pasted text).
pub fn parse_skill_system(content: &str, format: Format) -> Result<SkillSystem, DataLoadError> {
    let origin = Path::new(INLINE_ORIGIN);
    let raw: SkillSystemData = deserialize_str(content, format, origin)?;
    validate(raw).map_err(|source| DataLoadError::Invalid {
        file: origin.to_path_buf(),
        source,
    })
}

/// Load a catalog from disk straight into `planner`. On error the planner
/// is left untouched.
pub fn load_into(planner: &mut SkillPlanner, path: &Path) -> Result<(), DataLoadError> {
    let system = load_skill_system(path)?;
    planner.load_skill_system(system);
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
