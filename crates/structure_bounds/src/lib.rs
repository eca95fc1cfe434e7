//! # Structure Bounds
//!
//! Two-level bounding-sphere collision bounds for static structure models.
//!
//! ## Features
//!
//! - **Fitting**: Coarse and fine spheres fitted to model geometry
//! - **Editing**: Cursor navigation and deletion with stable renumbering
//! - **Optimization**: Containment repair and pruning before saving
//! - **Settings Records**: Line-based text format for storing bounds
//! - **Configuration**: TOML and RON configuration files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use structure_bounds::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mesh = MeshGeometry::cube(Vec3::zeros(), 2.0);
//!     let mut session = EditSession::new(AssetKind::Structure);
//!     session.create_bounds(&mesh, &FittingConfig::default())?;
//!
//!     session.select_fine(0);
//!     session.delete_selected_fine();
//!     session.optimize();
//!
//!     println!("{}", session.settings_records());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod asset;
pub mod bounds;
pub mod collision;
pub mod config;
pub mod debug;
pub mod error;
pub mod foundation;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::asset::AssetKind;
    pub use crate::bounds::{
        fit_from_geometry, optimize, validate, BoundSet, Cursor, EditSession, OptimizeReport, Step,
        StructureSphere,
    };
    pub use crate::collision::{BoundingSphere, MeshGeometry, MeshPart};
    pub use crate::config::{BoundsConfig, Config, FittingConfig, PlacementConfig};
    pub use crate::debug::{OutlineColors, ShapeDrawer};
    pub use crate::error::{BoundsError, BoundsResult};
    pub use crate::foundation::math::{Mat4, Transform, Vec3};
}
