//! Collision geometry
//!
//! # Module Organization
//!
//! - [`primitives`] - Basic geometric primitives (spheres, boxes, triangles)
//! - [`mesh`] - Model-space mesh geometry handed over by the model loader
//!
//! Geometry is stored in model space; world placement is applied to the bound
//! spheres only, never to the mesh.

pub mod mesh;
pub mod primitives;

// Re-export commonly used types
pub use mesh::{MeshGeometry, MeshPart};
pub use primitives::{Aabb, BoundingSphere, Triangle};
