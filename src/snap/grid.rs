//! Neighbor-relative grid snapping
//!
//! Panels are expected to form a regular rectangular lattice. Each placed
//! panel near the pointer proposes four lattice positions (one step away on
//! each axis); the proposal closest to the pointer wins if it falls inside
//! the snap tolerance.

use crate::math::Vec2;
use super::SnapConfig;

/// Fraction of a lattice step used as the snap window around each candidate
const SNAP_WINDOW_FACTOR: f32 = 0.8;

/// Result of a grid snap attempt
#[derive(Debug, Clone, Copy)]
pub struct GridSnap {
    /// Corrected position (the input point when `snapped` is false)
    pub position: Vec2,
    pub snapped: bool,
}

impl GridSnap {
    fn miss(point: Vec2) -> Self {
        Self { position: point, snapped: false }
    }
}

/// Snap a candidate point to the lattice implied by nearby panels.
///
/// Neighbors within one lattice step plus the snap window can contribute
/// candidates; anything further away cannot produce a candidate inside the
/// tolerance, so it is skipped. The best (smallest) candidate distance seen
/// so far is tracked, which makes the result independent of neighbor
/// iteration order.
pub fn apply_snapping(point: Vec2, other_panels: &[Vec2], config: &SnapConfig) -> GridSnap {
    let step = config.step_x.max(config.step_y);
    let reach = step * (1.0 + SNAP_WINDOW_FACTOR);

    let mut best: Option<(f32, Vec2)> = None;
    for other in other_panels {
        let dist = point.distance(*other);
        if dist <= 0.0 || dist > reach {
            // dist == 0 means the dragged panel itself
            continue;
        }

        let candidates = [
            Vec2::new(other.x + config.step_x, other.y),
            Vec2::new(other.x - config.step_x, other.y),
            Vec2::new(other.x, other.y + config.step_y),
            Vec2::new(other.x, other.y - config.step_y),
        ];
        for candidate in candidates {
            let d = point.distance(candidate);
            if d >= config.snap_tolerance {
                continue;
            }
            match best {
                Some((best_d, _)) if d >= best_d => {}
                _ => best = Some((d, candidate)),
            }
        }
    }

    match best {
        Some((_, position)) => GridSnap { position, snapped: true },
        None => GridSnap::miss(point),
    }
}
