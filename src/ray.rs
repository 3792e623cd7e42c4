//! Ray utilities for projecting pointer rays onto the drag plane
//!
//! The editor's camera/raycaster is an external collaborator: it turns a
//! screen-space pointer event into a world-space [`Ray`]. This module supplies
//! the other half — intersecting that ray with the horizontal plane a drag
//! gesture is constrained to.

use crate::math::Vec3;

/// A 3D ray with origin and direction
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,  // Normalized
}

impl Ray {
    /// Create a new ray, normalizing the direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get point at distance t along ray
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Find the parameter t where a ray crosses a plane.
///
/// Returns None if the ray is parallel to the plane or the intersection
/// lies behind the ray origin.
pub fn ray_plane_intersection(
    ray: &Ray,
    plane_point: Vec3,
    plane_normal: Vec3,
) -> Option<f32> {
    let denom = ray.direction.dot(plane_normal);
    if denom.abs() < 0.0001 {
        return None;  // Ray parallel to plane
    }

    let t = (plane_point - ray.origin).dot(plane_normal) / denom;
    if t < 0.0 {
        return None;  // Intersection behind ray origin
    }

    Some(t)
}

/// Project a pointer ray onto the horizontal plane at the given height.
///
/// Drags stay on a fixed-Z plane through the panel's original position, so
/// terrain undulation does not perturb the gesture.
pub fn project_to_drag_plane(ray: &Ray, plane_z: f32) -> Option<Vec3> {
    let t = ray_plane_intersection(
        ray,
        Vec3::new(0.0, 0.0, plane_z),
        Vec3::new(0.0, 0.0, 1.0),
    )?;
    Some(ray.at(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_intersection_straight_down() {
        let ray = Ray::new(Vec3::new(4.0, 7.0, 100.0), Vec3::new(0.0, 0.0, -1.0));
        let hit = project_to_drag_plane(&ray, 2.0).unwrap();
        assert!((hit.x - 4.0).abs() < 0.001);
        assert!((hit.y - 7.0).abs() < 0.001);
        assert!((hit.z - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_plane_intersection_parallel_ray() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(project_to_drag_plane(&ray, 0.0).is_none());
    }

    #[test]
    fn test_plane_intersection_behind_origin() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(project_to_drag_plane(&ray, 0.0).is_none());
    }

    #[test]
    fn test_oblique_ray_lands_on_plane() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::new(1.0, 1.0, -1.0));
        let hit = project_to_drag_plane(&ray, 0.0).unwrap();
        assert!((hit.x - 10.0).abs() < 0.01);
        assert!((hit.y - 10.0).abs() < 0.01);
        assert!(hit.z.abs() < 0.01);
    }
}
