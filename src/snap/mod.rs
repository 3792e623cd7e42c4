//! Snapping system for panel placement
//!
//! Two cooperating snappers run on every drag frame:
//! - Row/gap snap ([`rows`]): detects the existing row structure and offers
//!   placements at row-internal gaps and row-end extensions. When the pointer
//!   is close enough to a row's Y-line the result is *forced* and wins outright.
//! - Grid/neighbor snap ([`grid`]): generic lattice alignment off the nearest
//!   placed panel, used when no row claims the point.
//!
//! Priority between the two lives in the drag session, not here; each snapper
//! just reports whether (and where) it would place the point.

mod grid;
mod rows;

pub use grid::*;
pub use rows::*;

/// Tuning constants for the snapping system.
///
/// `step_x`/`step_y` are the plant-wide lattice spacing. They come from the
/// reference plant's as-built layout, not from panel dimensions; plants with
/// different rack geometry supply their own values.
#[derive(Debug, Clone, Copy)]
pub struct SnapConfig {
    /// Lattice spacing along a row (east-west), world units
    pub step_x: f32,
    /// Lattice spacing across rows (north-south), world units
    pub step_y: f32,
    /// Max distance between a lattice candidate and the pointer for grid snap
    pub snap_tolerance: f32,
    /// Max X-distance between a row candidate and the pointer for row snap,
    /// and max Y-distance for a row to be considered at all
    pub row_snap_tolerance: f32,
    /// Y-distance under which a row snap is forced and grid snap is skipped
    pub force_threshold: f32,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            step_x: 13.98,
            step_y: 9.0,
            snap_tolerance: 8.0,
            row_snap_tolerance: 15.0,
            force_threshold: 8.0,
        }
    }
}
