//! Plant definition loading and saving
//!
//! Uses RON (Rusty Object Notation) for human-readable plant files.
//! Supports both compressed (brotli) and uncompressed RON files.
//! - Reading: Auto-detects format by checking for valid RON start
//! - Writing: Always uses brotli compression
//!
//! The definition is read-only startup input: boundary polygon, per-group
//! panel positions, shared panel geometry and tilt. Edits made in the editor
//! stay in memory for the session and are not written back here.

use std::fs;
use std::io::Cursor;
use std::path::Path;
use serde::{Serialize, Deserialize};

use crate::math::{Vec2, Vec3};
use crate::snap::SnapConfig;

/// Validation limits to prevent resource exhaustion from malicious files
pub mod limits {
    /// Maximum number of groups in a plant
    pub const MAX_GROUPS: usize = 1024;
    /// Maximum number of panels across all groups
    pub const MAX_PANELS: usize = 100_000;
    /// Maximum number of boundary polygon points
    pub const MAX_POLYGON_POINTS: usize = 10_000;
    /// Maximum string length for group names and ids
    pub const MAX_STRING_LEN: usize = 256;
    /// Maximum coordinate value (prevents overflow issues)
    pub const MAX_COORD: f32 = 1_000_000.0;
}

/// Error type for plant definition loading
#[derive(Debug)]
pub enum DefinitionError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
    ValidationError(String),
}

impl From<std::io::Error> for DefinitionError {
    fn from(e: std::io::Error) -> Self {
        DefinitionError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for DefinitionError {
    fn from(e: ron::error::SpannedError) -> Self {
        DefinitionError::ParseError(e)
    }
}

impl From<ron::Error> for DefinitionError {
    fn from(e: ron::Error) -> Self {
        DefinitionError::SerializeError(e)
    }
}

impl std::fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefinitionError::IoError(e) => write!(f, "IO error: {}", e),
            DefinitionError::ParseError(e) => write!(f, "Parse error: {}", e),
            DefinitionError::SerializeError(e) => write!(f, "Serialize error: {}", e),
            DefinitionError::ValidationError(e) => write!(f, "Validation error: {}", e),
        }
    }
}

impl std::error::Error for DefinitionError {}

/// One group of panels in the definition file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupDefinition {
    pub id: String,
    pub name: String,
    #[serde(default = "default_group_color")]
    pub color: [f32; 3],
    /// Initial panel positions, one panel per point
    pub panels: Vec<Vec3>,
}

fn default_group_color() -> [f32; 3] {
    [0.2, 0.55, 0.85]
}

/// A plant as loaded from disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantDefinition {
    /// Boundary polygon, insertion order = ring order, closed implicitly
    pub boundary: Vec<Vec2>,
    pub groups: Vec<GroupDefinition>,
    /// Shared panel geometry (plant-wide, not per panel)
    pub panel_length: f32,
    pub panel_width: f32,
    /// Rack tilt in degrees; carried for the renderer, unused by snapping
    #[serde(default)]
    pub tilt_angle: f32,
    /// Lattice spacing overrides. The defaults match the reference plant's
    /// as-built layout; plants with different rack geometry set their own.
    #[serde(default)]
    pub step_x: Option<f32>,
    #[serde(default)]
    pub step_y: Option<f32>,
}

impl PlantDefinition {
    /// Snap configuration for this plant, with file overrides applied
    pub fn snap_config(&self) -> SnapConfig {
        let defaults = SnapConfig::default();
        SnapConfig {
            step_x: self.step_x.unwrap_or(defaults.step_x),
            step_y: self.step_y.unwrap_or(defaults.step_y),
            ..defaults
        }
    }
}

/// Check if a float is valid (not NaN or Inf, within coordinate limits)
fn is_valid_float(f: f32) -> bool {
    f.is_finite() && f.abs() <= limits::MAX_COORD
}

fn validate_group(group: &GroupDefinition, idx: usize) -> Result<(), String> {
    let context = format!("group[{}]", idx);
    if group.id.is_empty() || group.id.len() > limits::MAX_STRING_LEN {
        return Err(format!("{}: bad id length {}", context, group.id.len()));
    }
    if group.name.len() > limits::MAX_STRING_LEN {
        return Err(format!("{}: name too long ({} > {})",
            context, group.name.len(), limits::MAX_STRING_LEN));
    }
    for (i, p) in group.panels.iter().enumerate() {
        if !is_valid_float(p.x) || !is_valid_float(p.y) || !is_valid_float(p.z) {
            return Err(format!("{} panel[{}]: invalid position ({}, {}, {})",
                context, i, p.x, p.y, p.z));
        }
    }
    for c in group.color {
        if !(0.0..=1.0).contains(&c) {
            return Err(format!("{}: color component out of range: {}", context, c));
        }
    }
    Ok(())
}

/// Validate an entire plant definition
pub fn validate_definition(def: &PlantDefinition) -> Result<(), DefinitionError> {
    if def.boundary.len() < 3 {
        return Err(DefinitionError::ValidationError(format!(
            "boundary needs at least 3 points, got {}", def.boundary.len()
        )));
    }
    if def.boundary.len() > limits::MAX_POLYGON_POINTS {
        return Err(DefinitionError::ValidationError(format!(
            "too many boundary points ({} > {})",
            def.boundary.len(), limits::MAX_POLYGON_POINTS
        )));
    }
    for (i, p) in def.boundary.iter().enumerate() {
        if !is_valid_float(p.x) || !is_valid_float(p.y) {
            return Err(DefinitionError::ValidationError(format!(
                "boundary[{}]: invalid point ({}, {})", i, p.x, p.y
            )));
        }
    }

    if def.groups.len() > limits::MAX_GROUPS {
        return Err(DefinitionError::ValidationError(format!(
            "too many groups ({} > {})", def.groups.len(), limits::MAX_GROUPS
        )));
    }
    let panel_total: usize = def.groups.iter().map(|g| g.panels.len()).sum();
    if panel_total > limits::MAX_PANELS {
        return Err(DefinitionError::ValidationError(format!(
            "too many panels ({} > {})", panel_total, limits::MAX_PANELS
        )));
    }
    for (i, group) in def.groups.iter().enumerate() {
        validate_group(group, i).map_err(DefinitionError::ValidationError)?;
        for other in &def.groups[..i] {
            if other.id == group.id {
                return Err(DefinitionError::ValidationError(format!(
                    "duplicate group id: {}", group.id
                )));
            }
        }
    }

    if !(def.panel_length > 0.0 && is_valid_float(def.panel_length)) {
        return Err(DefinitionError::ValidationError(format!(
            "invalid panel_length: {}", def.panel_length
        )));
    }
    if !(def.panel_width > 0.0 && is_valid_float(def.panel_width)) {
        return Err(DefinitionError::ValidationError(format!(
            "invalid panel_width: {}", def.panel_width
        )));
    }
    if !def.tilt_angle.is_finite() {
        return Err(DefinitionError::ValidationError(format!(
            "invalid tilt_angle: {}", def.tilt_angle
        )));
    }
    for step in [def.step_x, def.step_y].into_iter().flatten() {
        if !(step > 0.0 && is_valid_float(step)) {
            return Err(DefinitionError::ValidationError(format!(
                "invalid lattice step: {}", step
            )));
        }
    }

    Ok(())
}

/// Load a plant definition from a RON file (compressed or uncompressed)
pub fn load_definition<P: AsRef<Path>>(path: P) -> Result<PlantDefinition, DefinitionError> {
    let bytes = fs::read(path.as_ref())?;

    // Detect format: RON files start with '(' or whitespace, brotli is binary
    let is_plain_ron = bytes
        .first()
        .map(|&b| b == b'(' || b == b' ' || b == b'\n' || b == b'\r' || b == b'\t')
        .unwrap_or(false);

    let contents = if is_plain_ron {
        String::from_utf8(bytes).map_err(|e| {
            DefinitionError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid UTF-8: {}", e),
            ))
        })?
    } else {
        let mut decompressed = Vec::new();
        brotli::BrotliDecompress(&mut Cursor::new(&bytes), &mut decompressed).map_err(|e| {
            DefinitionError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("brotli decompression failed: {}", e),
            ))
        })?;
        String::from_utf8(decompressed).map_err(|e| {
            DefinitionError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid UTF-8 after decompression: {}", e),
            ))
        })?
    };

    let def: PlantDefinition = ron::from_str(&contents)?;
    validate_definition(&def)?;
    Ok(def)
}

/// Save a plant definition as brotli-compressed RON
pub fn save_definition<P: AsRef<Path>>(def: &PlantDefinition, path: P) -> Result<(), DefinitionError> {
    validate_definition(def)?;
    let contents = ron::ser::to_string_pretty(def, ron::ser::PrettyConfig::default())?;

    // Quality 6, window 22 - good balance of speed/ratio
    let mut compressed = Vec::new();
    brotli::BrotliCompress(
        &mut Cursor::new(contents.as_bytes()),
        &mut compressed,
        &brotli::enc::BrotliEncoderParams {
            quality: 6,
            lgwin: 22,
            ..Default::default()
        },
    )
    .map_err(DefinitionError::IoError)?;

    fs::write(path.as_ref(), compressed)?;
    Ok(())
}
