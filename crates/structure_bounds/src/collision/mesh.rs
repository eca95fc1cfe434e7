//! Mesh geometry supplied by the host
//!
//! Triangles are stored in MODEL SPACE and are never modified by the bounds
//! core. A model may consist of several parts, each with its own local
//! bounding sphere.

use super::primitives::{Aabb, BoundingSphere, Triangle};
use crate::foundation::math::Vec3;

/// One part of a model (a sub-mesh) in model space
#[derive(Debug, Clone, Default)]
pub struct MeshPart {
    /// Triangles in MODEL SPACE
    pub triangles: Vec<Triangle>,
}

impl MeshPart {
    /// Build a part from model-space vertices and a triangle index list
    ///
    /// Trailing indices that do not form a full triangle are ignored, as are
    /// triangles referring to vertices that do not exist.
    pub fn from_vertices(vertices: &[Vec3], indices: &[u32]) -> Self {
        let mut triangles = Vec::with_capacity(indices.len() / 3);
        let mut skipped = 0usize;

        for chunk in indices.chunks_exact(3) {
            let corners = (
                vertices.get(chunk[0] as usize),
                vertices.get(chunk[1] as usize),
                vertices.get(chunk[2] as usize),
            );
            match corners {
                (Some(v0), Some(v1), Some(v2)) => triangles.push(Triangle::new(*v0, *v1, *v2)),
                _ => skipped += 1,
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {} triangles with out-of-range vertex indices", skipped);
        }

        Self { triangles }
    }

    /// Every vertex of every triangle
    pub fn vertices(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.triangles.iter().flat_map(|t| [t.v0, t.v1, t.v2])
    }

    /// Local bounding sphere of this part, `None` when it has no triangles
    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        let points: Vec<Vec3> = self.vertices().collect();
        BoundingSphere::from_points(&points)
    }
}

/// Complete model geometry as handed over by the model loader
#[derive(Debug, Clone, Default)]
pub struct MeshGeometry {
    /// The parts making up the model
    pub parts: Vec<MeshPart>,
}

impl MeshGeometry {
    /// Geometry made of a single part
    pub fn single(part: MeshPart) -> Self {
        Self { parts: vec![part] }
    }

    /// Geometry from a flat triangle list
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        Self::single(MeshPart { triangles })
    }

    /// Total triangle count over all parts
    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(|p| p.triangles.len()).sum()
    }

    /// True when there is no triangle in any part
    pub fn is_empty(&self) -> bool {
        self.triangle_count() == 0
    }

    /// All triangles of all parts
    pub fn triangles(&self) -> impl Iterator<Item = &Triangle> + '_ {
        self.parts.iter().flat_map(|p| p.triangles.iter())
    }

    /// Axis-aligned box around all geometry
    pub fn aabb(&self) -> Option<Aabb> {
        let points: Vec<Vec3> = self.parts.iter().flat_map(|p| p.vertices()).collect();
        Aabb::from_points(&points)
    }

    /// Overall bounding sphere: the merge of every part's sphere
    pub fn overall_bounds(&self) -> Option<BoundingSphere> {
        self.parts
            .iter()
            .filter_map(MeshPart::bounding_sphere)
            .reduce(|acc, sphere| acc.merged(&sphere))
    }

    /// Axis-aligned cube centred on `center` with edge length `size`
    ///
    /// Twelve triangles; handy for tests and tool demos.
    pub fn cube(center: Vec3, size: f32) -> Self {
        let h = size * 0.5;
        let corners: Vec<Vec3> = (0..8)
            .map(|i| {
                let x = if i & 1 != 0 { h } else { -h };
                let y = if i & 2 != 0 { h } else { -h };
                let z = if i & 4 != 0 { h } else { -h };
                center + Vec3::new(x, y, z)
            })
            .collect();

        #[rustfmt::skip]
        let indices: [u32; 36] = [
            0, 2, 1,  1, 2, 3, // -Z
            4, 5, 6,  5, 7, 6, // +Z
            0, 1, 4,  1, 5, 4, // -Y
            2, 6, 3,  3, 6, 7, // +Y
            0, 4, 2,  2, 4, 6, // -X
            1, 3, 5,  3, 7, 5, // +X
        ];

        Self::single(MeshPart::from_vertices(&corners, &indices))
    }
}
