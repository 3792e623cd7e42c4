//! Point-in-polygon and nearest-boundary-point tests

use serde::{Serialize, Deserialize};
use crate::math::{Vec2, Aabb2};

/// The plant boundary: an ordered ring of ground-plane points.
///
/// The ring is closed implicitly (last point connects back to the first) and
/// must be simple (non-self-intersecting). Winding order does not matter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Vec2>,
}

impl Polygon {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Bounding box of the ring. Zero box for an empty polygon.
    pub fn bounds(&self) -> Aabb2 {
        let mut iter = self.points.iter();
        let first = match iter.next() {
            Some(p) => *p,
            None => return Aabb2::default(),
        };
        let mut bb = Aabb2::new(first, first);
        for p in iter {
            bb.expand(*p);
        }
        bb
    }

    /// Ray-casting point-in-polygon test.
    ///
    /// Casts a horizontal ray from the query point and counts edge crossings.
    /// A degenerate polygon (fewer than 3 points) contains nothing.
    pub fn contains(&self, point: Vec2) -> bool {
        let pts = &self.points;
        if pts.len() < 3 {
            return false;
        }

        let mut inside = false;
        let mut j = pts.len() - 1;
        for i in 0..pts.len() {
            let pi = pts[i];
            let pj = pts[j];
            // Exclusive comparison on one end keeps vertices from double-counting
            if (pi.y > point.y) != (pj.y > point.y) {
                let x_intersection = (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x;
                if point.x < x_intersection {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Closest point on the boundary ring to the query point.
    ///
    /// Projects the query onto every edge segment (parametric t clamped to
    /// [0, 1]) and keeps the nearest projection. Returns None for a polygon
    /// with no edges.
    pub fn nearest_boundary_point(&self, point: Vec2) -> Option<Vec2> {
        let pts = &self.points;
        if pts.len() < 2 {
            return pts.first().copied();
        }

        let mut best: Option<(f32, Vec2)> = None;
        for i in 0..pts.len() {
            let a = pts[i];
            let b = pts[(i + 1) % pts.len()];
            let projected = project_onto_segment(point, a, b);
            let dist = point.distance(projected);
            match best {
                Some((best_dist, _)) if dist >= best_dist => {}
                _ => best = Some((dist, projected)),
            }
        }
        best.map(|(_, p)| p)
    }

    /// Distance from a point to the boundary ring (0 exactly on an edge)
    pub fn distance_to_boundary(&self, point: Vec2) -> f32 {
        match self.nearest_boundary_point(point) {
            Some(p) => point.distance(p),
            None => 0.0,
        }
    }
}

/// Project a point onto the segment [a, b], clamped to the segment ends
pub fn project_onto_segment(point: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.dot(ab);
    if len_sq <= f32::EPSILON {
        return a;  // Zero-length edge
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Perpendicular distance from a point to the segment [a, b]
pub fn distance_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    point.distance(project_onto_segment(point, a, b))
}
