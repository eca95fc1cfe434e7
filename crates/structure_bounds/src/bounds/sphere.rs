//! A single structure bound
//!
//! Spheres are authored in object space. `center_local` is authoritative and
//! `center` is derived from it whenever the model's world placement changes.

use crate::collision::BoundingSphere;
use crate::foundation::math::{transform_position, Mat4, Vec3};

/// One bounding sphere of a structure, in object and world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructureSphere {
    /// Center in world space, derived from `center_local`
    pub center: Vec3,
    /// Center in object space
    pub center_local: Vec3,
    /// Radius, never negative
    pub radius: f32,
}

impl StructureSphere {
    /// Create in object space; call [`Self::move_to_world`] afterwards to place it
    pub fn new(center_local: Vec3, radius: f32) -> Self {
        Self {
            center: center_local,
            center_local,
            radius: radius.max(0.0),
        }
    }

    /// Create from an object-space sphere
    pub fn from_local(sphere: &BoundingSphere) -> Self {
        Self::new(sphere.center, sphere.radius)
    }

    /// Follow the model: `center = transform · center_local`
    pub fn move_to_world(&mut self, transform: &Mat4) {
        self.center = transform_position(transform, &self.center_local);
    }

    /// Put the world center back on the object-space center
    pub fn move_to_object_space(&mut self) {
        self.center = self.center_local;
    }

    /// True when the horizontal plane at `level` cuts through the sphere
    pub fn is_at_level(&self, level: f32) -> bool {
        level >= self.center.y - self.radius && level <= self.center.y + self.radius
    }

    /// Height of the bottom of the sphere
    pub fn lowest_point(&self) -> f32 {
        self.center.y - self.radius
    }

    /// Replace position and size with a recomputed sphere
    ///
    /// Both centers take the new value, so the sphere is left in object space
    /// until it is next moved.
    pub fn reposition_from(&mut self, bound: &BoundingSphere) {
        self.center_local = bound.center;
        self.center = bound.center;
        self.radius = bound.radius.max(0.0);
    }

    /// World-space sphere
    pub fn sphere(&self) -> BoundingSphere {
        BoundingSphere::new(self.center, self.radius)
    }

    /// Object-space sphere
    pub fn local_sphere(&self) -> BoundingSphere {
        BoundingSphere::new(self.center_local, self.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform;
    use approx::assert_relative_eq;

    #[test]
    fn test_move_to_world_and_back() {
        let mut sphere = StructureSphere::new(Vec3::new(1.0, 2.0, 3.0), 0.5);
        let placement = Transform::from_position(Vec3::new(10.0, 0.0, -5.0)).to_matrix();

        sphere.move_to_world(&placement);
        assert_relative_eq!(sphere.center, Vec3::new(11.0, 2.0, -2.0), epsilon = 1e-5);
        assert_eq!(sphere.center_local, Vec3::new(1.0, 2.0, 3.0));

        sphere.move_to_object_space();
        assert_eq!(sphere.center, sphere.center_local);
    }

    #[test]
    fn test_is_at_level() {
        let sphere = StructureSphere::new(Vec3::new(0.0, 1.0, 0.0), 0.5);

        assert!(sphere.is_at_level(1.0));
        assert!(sphere.is_at_level(0.5));
        assert!(sphere.is_at_level(1.5));
        assert!(!sphere.is_at_level(0.49));
        assert!(!sphere.is_at_level(1.51));
    }

    #[test]
    fn test_lowest_point() {
        let sphere = StructureSphere::new(Vec3::new(0.0, 1.0, 0.0), 0.25);
        assert_relative_eq!(sphere.lowest_point(), 0.75);
    }

    #[test]
    fn test_reposition_from() {
        let mut sphere = StructureSphere::new(Vec3::zeros(), 1.0);
        sphere.move_to_world(&Transform::from_position(Vec3::new(0.0, 5.0, 0.0)).to_matrix());

        sphere.reposition_from(&BoundingSphere::new(Vec3::new(2.0, 0.0, 0.0), 3.0));

        assert_eq!(sphere.center_local, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(sphere.center, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(sphere.radius, 3.0);
    }

    #[test]
    fn test_negative_radius_clamped() {
        assert_eq!(StructureSphere::new(Vec3::zeros(), -1.0).radius, 0.0);
    }
}
