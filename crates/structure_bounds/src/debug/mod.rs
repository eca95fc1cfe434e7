//! Debug visualisation of bounds

pub mod outline;

pub use outline::{
    outline_all_fine, outline_coarse, outline_fine_of_selected, OutlineBuffer, OutlineColors,
    OutlineSphere, ShapeDrawer,
};
