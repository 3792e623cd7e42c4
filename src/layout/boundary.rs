//! Boundary enforcement for dragged panels
//!
//! Two layers, applied at different points of the drag pipeline:
//! - [`apply_boundary_resistance`] is the soft layer: points pulled outside the
//!   polygon are eased back toward the edge, harder the further out they go.
//!   The pull never reaches 100%, so a determined drag can still leave the
//!   boundary entirely (and the drag then reads as invalid).
//! - [`clamp_to_polygon`] is the hard layer: any remaining outside point is
//!   projected onto the nearest boundary edge before commit.

use crate::math::{Vec2, Vec3};
use super::Polygon;

/// Width of the elastic zone outside the boundary, in world units
pub const RESISTANCE_ZONE: f32 = 50.0;

/// Maximum fraction of the outward offset removed by resistance
const MAX_RESISTANCE: f32 = 0.8;

/// Vertical extent panels may occupy, for Z clamping during drags
#[derive(Debug, Clone, Copy)]
pub struct ZBounds {
    pub min: f32,
    pub max: f32,
}

impl ZBounds {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, z: f32) -> f32 {
        z.clamp(self.min, self.max)
    }
}

/// Hard-clamp a point into the polygon, with Z limited to the given bounds.
///
/// Inside points pass through untouched (apart from the Z clamp); outside
/// points land on the nearest boundary edge. Idempotent. An empty polygon
/// passes everything through.
pub fn clamp_to_polygon(point: Vec3, polygon: &Polygon, z_bounds: ZBounds) -> Vec3 {
    let z = z_bounds.clamp(point.z);
    if polygon.contains(point.xy()) {
        return Vec3::new(point.x, point.y, z);
    }
    match polygon.nearest_boundary_point(point.xy()) {
        Some(edge) => edge.with_z(z),
        None => Vec3::new(point.x, point.y, z),
    }
}

/// Ease an out-of-bounds point back toward the boundary.
///
/// The resistance factor ramps from 0 at the edge to 1 at the outer rim of
/// [`RESISTANCE_ZONE`]; the outward offset is scaled by
/// `1 - factor * MAX_RESISTANCE`, so pushback strengthens with distance but
/// tops out at 80% — the operator always keeps some outward travel.
pub fn apply_boundary_resistance(point: Vec2, polygon: &Polygon) -> Vec2 {
    if polygon.contains(point) {
        return point;
    }
    let closest = match polygon.nearest_boundary_point(point) {
        Some(p) => p,
        None => return point,
    };
    let distance_to_edge = point.distance(closest);
    let resistance = (distance_to_edge / RESISTANCE_ZONE).min(1.0);
    closest + (point - closest) * (1.0 - resistance * MAX_RESISTANCE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f32) -> Polygon {
        Polygon::new(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(size, 0.0),
            Vec2::new(size, size),
            Vec2::new(0.0, size),
        ])
    }

    #[test]
    fn test_clamp_passes_inside_point_through() {
        let poly = square(100.0);
        let p = Vec3::new(40.0, 60.0, 1.5);
        let clamped = clamp_to_polygon(p, &poly, ZBounds::new(0.0, 10.0));
        assert!((clamped.x - 40.0).abs() < 0.001);
        assert!((clamped.y - 60.0).abs() < 0.001);
        assert!((clamped.z - 1.5).abs() < 0.001);
    }

    #[test]
    fn test_clamp_projects_outside_point_to_edge() {
        let poly = square(100.0);
        let clamped = clamp_to_polygon(Vec3::new(130.0, 50.0, 0.0), &poly, ZBounds::new(0.0, 10.0));
        assert!((clamped.x - 100.0).abs() < 0.001);
        assert!((clamped.y - 50.0).abs() < 0.001);
    }

    #[test]
    fn test_clamp_is_idempotent() {
        let poly = square(100.0);
        let zb = ZBounds::new(0.0, 10.0);
        let once = clamp_to_polygon(Vec3::new(200.0, -30.0, 25.0), &poly, zb);
        let twice = clamp_to_polygon(once, &poly, zb);
        assert!(once.distance_xy(twice) < 0.001);
        assert!((once.z - twice.z).abs() < 0.001);
    }

    #[test]
    fn test_clamp_limits_z() {
        let poly = square(100.0);
        let clamped = clamp_to_polygon(Vec3::new(50.0, 50.0, 99.0), &poly, ZBounds::new(0.0, 10.0));
        assert!((clamped.z - 10.0).abs() < 0.001);
    }

    #[test]
    fn test_resistance_inside_is_identity() {
        let poly = square(100.0);
        let p = Vec2::new(50.0, 50.0);
        assert!(apply_boundary_resistance(p, &poly).distance(p) < 0.001);
    }

    #[test]
    fn test_resistance_strengthens_with_distance() {
        let poly = square(100.0);
        // Drag straight out past the right edge at increasing distances;
        // the fraction of outward travel removed must not decrease.
        let mut last_removed_fraction = -1.0f32;
        for d in [5.0f32, 15.0, 30.0, 49.0] {
            let p = Vec2::new(100.0 + d, 50.0);
            let resisted = apply_boundary_resistance(p, &poly);
            let removed = (p.x - resisted.x) / d;
            assert!(removed >= last_removed_fraction - 0.001);
            last_removed_fraction = removed;
        }
    }

    #[test]
    fn test_resistance_saturates_below_full_stop() {
        let poly = square(100.0);
        // Far past the zone: factor saturates at 1, pull reduction at 80%
        let p = Vec2::new(100.0 + 500.0, 50.0);
        let resisted = apply_boundary_resistance(p, &poly);
        let remaining = resisted.x - 100.0;
        assert!((remaining - 500.0 * 0.2).abs() < 0.1);
        // Never a full stop: some outward offset always survives
        assert!(remaining > 0.0);
    }

    #[test]
    fn test_resistance_empty_polygon_passthrough() {
        let p = Vec2::new(12.0, 34.0);
        assert!(apply_boundary_resistance(p, &Polygon::default()).distance(p) < 0.001);
    }
}
