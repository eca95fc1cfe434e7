//! Two-level structure bounds
//!
//! # Module Organization
//!
//! - [`sphere`] - A single bound in object and world space
//! - [`bound_set`] - Coarse and fine spheres with their cross references
//! - [`fitting`] - Initial bounds from model geometry
//! - [`navigation`] - Cursor selection, stepping and deletion
//! - [`optimize`] - Containment repair and pruning before saving
//! - [`record`] - Settings text records
//! - [`session`] - Editing state with change tracking

pub mod bound_set;
pub mod fitting;
pub mod navigation;
pub mod optimize;
pub mod record;
pub mod session;
pub mod sphere;

pub use bound_set::{BoundSet, CoarseBound};
pub use fitting::{fit_from_geometry, fit_with_config};
pub use navigation::{Cursor, Step};
pub use optimize::{optimize, optimized, validate, InvariantViolation, OptimizeReport, CONTAINMENT_TOLERANCE};
pub use record::{parse_records, to_records, RecordError};
pub use session::EditSession;
pub use sphere::StructureSphere;
