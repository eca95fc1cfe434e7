//! Error types reported to the host
//!
//! Every variant is a precondition failure: the operation that returned it did
//! not change the bound set.

use thiserror::Error;

use crate::asset::AssetKind;

/// Outcome of a rejected bounds operation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    /// The mesh handed to fitting had no triangles
    #[error("Model has no geometry to fit bounds to")]
    EmptyGeometry,

    /// Structure bounds requested for an asset that is not a structure
    #[error("Structure bounds can only be created for structure models, not {0}")]
    WrongAssetType(AssetKind),

    /// An index outside the collection it refers to
    #[error("Invalid {collection} selection {index} (count {len})")]
    InvalidSelection {
        /// Which collection the index refers to
        collection: Level,
        /// The rejected index
        index: usize,
        /// Length of the collection at the time
        len: usize,
    },

    /// A fitting parameter outside its valid range
    #[error("Invalid fitting parameter {name} = {value}")]
    InvalidFitParameter {
        /// Parameter name
        name: &'static str,
        /// Rejected value
        value: f32,
    },
}

/// The two levels of the bound hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// Larger spheres grouping several fine spheres
    Coarse,
    /// Smaller spheres approximating surface detail
    Fine,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Coarse => write!(f, "coarse"),
            Level::Fine => write!(f, "fine"),
        }
    }
}

/// Result alias for bounds operations
pub type BoundsResult<T> = Result<T, BoundsError>;
