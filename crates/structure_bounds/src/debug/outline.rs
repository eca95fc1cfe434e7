//! Outline requests for visualising bounds
//!
//! The library never renders anything itself. Helpers here issue sphere
//! requests to a [`ShapeDrawer`] supplied by the host, which decides how to
//! draw them.

use serde::{Deserialize, Serialize};

use crate::bounds::{BoundSet, Cursor};
use crate::config::ConfigError;
use crate::foundation::math::{Vec3, Vec4};

/// Sink for sphere outline requests
pub trait ShapeDrawer {
    /// Drop every outline issued so far
    fn clear(&mut self);

    /// Outline one sphere in world space
    fn draw_sphere(&mut self, center: Vec3, radius: f32, color: Vec4);
}

/// Outline colors as RGBA, each component in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlineColors {
    /// Coarse spheres
    pub coarse: [f32; 4],
    /// The selected coarse sphere
    pub coarse_selected: [f32; 4],
    /// Fine spheres
    pub fine: [f32; 4],
    /// The selected fine sphere
    pub fine_selected: [f32; 4],
}

impl Default for OutlineColors {
    fn default() -> Self {
        Self {
            coarse: [0.0, 1.0, 0.0, 0.3],          // Green, semi-transparent
            coarse_selected: [1.0, 1.0, 0.0, 0.6], // Yellow
            fine: [0.0, 1.0, 1.0, 0.2],            // Cyan, transparent
            fine_selected: [1.0, 0.0, 0.0, 0.6],   // Red
        }
    }
}

impl OutlineColors {
    /// Check every component lies in `0.0..=1.0`
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("outline.coarse", self.coarse),
            ("outline.coarse_selected", self.coarse_selected),
            ("outline.fine", self.fine),
            ("outline.fine_selected", self.fine_selected),
        ];
        for (field, color) in named {
            if color.iter().any(|c| !(0.0..=1.0).contains(c)) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("components must be within 0..1, got {:?}", color),
                });
            }
        }
        Ok(())
    }

    fn pick(normal: [f32; 4], selected: [f32; 4], is_selected: bool) -> Vec4 {
        Vec4::from(if is_selected { selected } else { normal })
    }
}

/// One outline request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlineSphere {
    /// World-space center
    pub center: Vec3,
    /// Radius
    pub radius: f32,
    /// RGBA color
    pub color: Vec4,
}

/// A [`ShapeDrawer`] that just collects requests
#[derive(Debug, Clone, Default)]
pub struct OutlineBuffer {
    spheres: Vec<OutlineSphere>,
}

impl OutlineBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests collected since the last clear
    pub fn spheres(&self) -> &[OutlineSphere] {
        &self.spheres
    }

    /// Number of collected requests
    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    /// True when nothing is collected
    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }
}

impl ShapeDrawer for OutlineBuffer {
    fn clear(&mut self) {
        self.spheres.clear();
    }

    fn draw_sphere(&mut self, center: Vec3, radius: f32, color: Vec4) {
        self.spheres.push(OutlineSphere { center, radius, color });
    }
}

/// Outline every coarse sphere, highlighting the selected one
pub fn outline_coarse<D: ShapeDrawer + ?Sized>(
    set: &BoundSet,
    cursor: Cursor,
    colors: &OutlineColors,
    drawer: &mut D,
) {
    drawer.clear();
    for (index, sphere) in set.coarse_spheres().enumerate() {
        let color = OutlineColors::pick(colors.coarse, colors.coarse_selected, cursor.coarse == Some(index));
        drawer.draw_sphere(sphere.center, sphere.radius, color);
    }
}

/// Outline the fine spheres of the selected coarse sphere
///
/// Draws nothing when no coarse sphere is selected.
pub fn outline_fine_of_selected<D: ShapeDrawer + ?Sized>(
    set: &BoundSet,
    cursor: Cursor,
    colors: &OutlineColors,
    drawer: &mut D,
) {
    drawer.clear();
    let Some(references) = cursor.coarse.and_then(|c| set.coarse_references(c)) else {
        return;
    };
    for index in references {
        if let Some(sphere) = set.fine(index) {
            let color = OutlineColors::pick(colors.fine, colors.fine_selected, cursor.fine == Some(index));
            drawer.draw_sphere(sphere.center, sphere.radius, color);
        }
    }
}

/// Outline every fine sphere, highlighting the selected one
pub fn outline_all_fine<D: ShapeDrawer + ?Sized>(
    set: &BoundSet,
    cursor: Cursor,
    colors: &OutlineColors,
    drawer: &mut D,
) {
    drawer.clear();
    for (index, sphere) in set.fine_spheres().enumerate() {
        let color = OutlineColors::pick(colors.fine, colors.fine_selected, cursor.fine == Some(index));
        drawer.draw_sphere(sphere.center, sphere.radius, color);
    }
}
