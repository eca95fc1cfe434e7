//! Editing state for one asset's bounds
//!
//! An [`EditSession`] ties a [`BoundSet`] to the selection cursor, the asset
//! kind and the model's world placement, and tracks whether the set needs
//! optimizing or saving.

use crate::asset::AssetKind;
use crate::collision::MeshGeometry;
use crate::config::FittingConfig;
use crate::debug::{self, OutlineColors, ShapeDrawer};
use crate::error::BoundsResult;
use crate::foundation::math::Mat4;

use super::bound_set::BoundSet;
use super::fitting::fit_with_config;
use super::navigation::{self, Cursor, Step};
use super::optimize::{self, OptimizeReport};
use super::record::{self, RecordError};
use super::sphere::StructureSphere;

/// Bounds being edited, with selection and change tracking
#[derive(Debug, Clone)]
pub struct EditSession {
    bounds: BoundSet,
    cursor: Cursor,
    kind: AssetKind,
    world: Mat4,
    optimized_at: Option<u64>,
    saved_at: Option<u64>,
}

impl EditSession {
    /// Start with no bounds
    pub fn new(kind: AssetKind) -> Self {
        Self::with_bounds(kind, BoundSet::new())
    }

    /// Start from bounds that were loaded; they count as saved and optimized
    pub fn with_bounds(kind: AssetKind, bounds: BoundSet) -> Self {
        let revision = bounds.revision();
        Self {
            bounds,
            cursor: Cursor::NONE,
            kind,
            world: Mat4::identity(),
            optimized_at: Some(revision),
            saved_at: Some(revision),
        }
    }

    /// Start from saved settings records
    pub fn from_records(kind: AssetKind, text: &str) -> Result<Self, RecordError> {
        Ok(Self::with_bounds(kind, record::parse_records(text)?))
    }

    // == State ==

    /// The bounds
    pub fn bounds(&self) -> &BoundSet {
        &self.bounds
    }

    /// Mutable access for direct edits; they are tracked like any other
    pub fn bounds_mut(&mut self) -> &mut BoundSet {
        &mut self.bounds
    }

    /// Current selection
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Kind of asset being edited
    pub fn asset_kind(&self) -> AssetKind {
        self.kind
    }

    /// Placement last reported by the host
    pub fn world_transform(&self) -> &Mat4 {
        &self.world
    }

    /// True when the bounds were edited since the last optimization
    pub fn needs_optimize(&self) -> bool {
        self.optimized_at != Some(self.bounds.revision())
    }

    /// True when the bounds differ from what was loaded or last saved
    pub fn has_changed(&self) -> bool {
        self.saved_at != Some(self.bounds.revision())
    }

    /// Record that the current bounds were written out
    pub fn mark_saved(&mut self) {
        self.saved_at = Some(self.bounds.revision());
    }

    // == Host hooks ==

    /// The model moved; every world center follows it
    pub fn set_world_transform(&mut self, transform: &Mat4) {
        self.world = *transform;
        self.bounds.move_to_world(transform);
    }

    // == Editing ==

    /// Replace the bounds with a fresh fit to the model geometry
    ///
    /// On failure the current bounds are kept.
    pub fn create_bounds(&mut self, mesh: &MeshGeometry, config: &FittingConfig) -> BoundsResult<()> {
        let mut fitted = match fit_with_config(mesh, self.kind, config) {
            Ok(fitted) => fitted,
            Err(e) => {
                log::warn!("Could not create bounds: {}", e);
                return Err(e);
            }
        };
        fitted.move_to_world(&self.world);

        self.bounds = fitted;
        self.cursor = Cursor::NONE;
        // A fresh fit already satisfies every invariant, but it is unsaved
        self.optimized_at = Some(self.bounds.revision());
        self.saved_at = None;
        Ok(())
    }

    /// Select a coarse sphere; out-of-range indices are ignored
    pub fn select_coarse(&mut self, index: usize) -> bool {
        self.apply_selection(navigation::select_coarse(&self.bounds, self.cursor, index))
    }

    /// Select a fine sphere; out-of-range indices are ignored
    pub fn select_fine(&mut self, index: usize) -> bool {
        self.apply_selection(navigation::select_fine(&self.bounds, self.cursor, index))
    }

    fn apply_selection(&mut self, selected: BoundsResult<Cursor>) -> bool {
        match selected {
            Ok(cursor) => {
                self.cursor = cursor;
                true
            }
            Err(e) => {
                log::debug!("Ignoring selection: {}", e);
                false
            }
        }
    }

    /// Step the coarse selection
    pub fn step_coarse(&mut self, step: Step) -> Cursor {
        self.cursor = navigation::step_coarse(&self.bounds, self.cursor, step);
        self.cursor
    }

    /// Step the fine selection over all fine spheres
    pub fn step_fine(&mut self, step: Step) -> Cursor {
        self.cursor = navigation::step_fine(&self.bounds, self.cursor, step);
        self.cursor
    }

    /// Step the fine selection within the selected coarse sphere
    pub fn step_fine_within_coarse(&mut self, step: Step) -> Cursor {
        self.cursor = navigation::step_fine_within_coarse(&self.bounds, self.cursor, step);
        self.cursor
    }

    /// Delete the selected fine sphere, if any
    pub fn delete_selected_fine(&mut self) -> Option<StructureSphere> {
        let target = self.cursor.fine?;
        match navigation::delete_fine(&mut self.bounds, self.cursor, target) {
            Ok((cursor, removed)) => {
                self.cursor = cursor;
                Some(removed)
            }
            Err(e) => {
                log::debug!("Nothing deleted: {}", e);
                self.cursor.fine = None;
                None
            }
        }
    }

    /// Delete the selected coarse sphere, if any
    pub fn delete_selected_coarse(&mut self) -> Option<StructureSphere> {
        let target = self.cursor.coarse?;
        match navigation::delete_coarse(&mut self.bounds, self.cursor, target) {
            Ok((cursor, removed)) => {
                self.cursor = cursor;
                Some(removed)
            }
            Err(e) => {
                log::debug!("Nothing deleted: {}", e);
                self.cursor.coarse = None;
                None
            }
        }
    }

    /// Run the optimization pass
    ///
    /// The cursor is cleared when anything was deleted, since positions moved.
    pub fn optimize(&mut self) -> OptimizeReport {
        let report = optimize::optimize(&mut self.bounds);
        if report.orphans_removed > 0 {
            self.cursor.fine = None;
        }
        if report.empty_coarse_removed > 0 {
            self.cursor.coarse = None;
        }
        self.optimized_at = Some(self.bounds.revision());
        report
    }

    // == Output ==

    /// Outline every coarse sphere
    pub fn outline_coarse(&self, colors: &OutlineColors, drawer: &mut dyn ShapeDrawer) {
        debug::outline_coarse(&self.bounds, self.cursor, colors, drawer);
    }

    /// Outline the fine spheres of the selected coarse sphere
    pub fn outline_selected_fine(&self, colors: &OutlineColors, drawer: &mut dyn ShapeDrawer) {
        debug::outline_fine_of_selected(&self.bounds, self.cursor, colors, drawer);
    }

    /// Outline every fine sphere
    pub fn outline_all_fine(&self, colors: &OutlineColors, drawer: &mut dyn ShapeDrawer) {
        debug::outline_all_fine(&self.bounds, self.cursor, colors, drawer);
    }

    /// Settings records for saving
    pub fn settings_records(&self) -> String {
        if self.needs_optimize() {
            log::warn!("Writing bounds that have not been optimised since the last edit");
        }
        record::to_records(&self.bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::OutlineBuffer;
    use crate::error::BoundsError;
    use crate::foundation::math::{Transform, Vec3};
    use approx::assert_relative_eq;

    fn cube_session() -> EditSession {
        let mut session = EditSession::new(AssetKind::Structure);
        let config = FittingConfig { fine_width: 0.5, coarse_multiple: 2.0 };
        session.create_bounds(&MeshGeometry::cube(Vec3::zeros(), 1.0), &config).unwrap();
        session
    }

    #[test]
    fn test_create_bounds_flags() {
        let session = cube_session();

        assert_eq!(session.bounds().fine_len(), 8);
        assert!(session.has_changed());
        assert!(!session.needs_optimize());
        assert_eq!(session.cursor(), Cursor::NONE);
    }

    #[test]
    fn test_create_bounds_failure_keeps_set() {
        let mut session = cube_session();
        let before = session.bounds().clone();

        let result = session.create_bounds(&MeshGeometry::default(), &FittingConfig::default());
        assert_eq!(result, Err(BoundsError::EmptyGeometry));
        assert_eq!(session.bounds(), &before);

        let mut character = EditSession::new(AssetKind::Character);
        let result = character.create_bounds(&MeshGeometry::cube(Vec3::zeros(), 1.0), &FittingConfig::default());
        assert_eq!(result, Err(BoundsError::WrongAssetType(AssetKind::Character)));
        assert!(character.bounds().is_empty());
    }

    #[test]
    fn test_edit_then_optimize_then_save() {
        let mut session = cube_session();
        session.mark_saved();
        assert!(!session.has_changed());

        assert!(session.select_fine(3));
        assert!(session.delete_selected_fine().is_some());
        assert!(session.needs_optimize());
        assert!(session.has_changed());

        session.optimize();
        assert!(!session.needs_optimize());
        assert!(optimize::validate(session.bounds()).is_ok());

        session.mark_saved();
        assert!(!session.has_changed());
    }

    #[test]
    fn test_direct_edits_are_tracked() {
        let mut session = cube_session();
        session.bounds_mut().add_fine(Vec3::new(5.0, 5.0, 5.0), 0.1);

        assert!(session.needs_optimize());
        let report = session.optimize();
        assert_eq!(report.orphans_removed, 1);
    }

    #[test]
    fn test_replacing_the_whole_set_is_tracked() {
        let mut session = cube_session();
        session.optimize();
        session.mark_saved();
        assert!(!session.has_changed());

        *session.bounds_mut() = BoundSet::new();

        assert!(session.has_changed());
        assert!(session.needs_optimize());
    }

    #[test]
    fn test_out_of_range_selection_ignored() {
        let mut session = cube_session();
        session.select_coarse(0);

        assert!(!session.select_coarse(5));
        assert!(!session.select_fine(99));
        assert_eq!(session.cursor(), Cursor::at(Some(0), None));
    }

    #[test]
    fn test_delete_without_selection() {
        let mut session = cube_session();
        assert!(session.delete_selected_fine().is_none());
        assert!(session.delete_selected_coarse().is_none());
        assert!(!session.needs_optimize());
    }

    #[test]
    fn test_delete_coarse_then_optimize_removes_orphans() {
        let mut session = cube_session();
        session.select_coarse(0);
        session.select_fine(2);

        session.delete_selected_coarse();
        assert_eq!(session.cursor(), Cursor::at(None, Some(2)));

        let report = session.optimize();
        assert_eq!(report.orphans_removed, 8);
        assert!(session.bounds().is_empty());
        assert_eq!(session.cursor(), Cursor::NONE);
    }

    #[test]
    fn test_world_transform_applies_to_new_bounds() {
        let mut session = EditSession::new(AssetKind::Structure);
        let placement = Transform::from_position(Vec3::new(0.0, 10.0, 0.0)).to_matrix();
        session.set_world_transform(&placement);

        session
            .create_bounds(&MeshGeometry::cube(Vec3::zeros(), 1.0), &FittingConfig::default())
            .unwrap();

        let coarse = session.bounds().coarse(0).unwrap();
        assert_relative_eq!(coarse.center.y - coarse.center_local.y, 10.0, epsilon = 1e-5);
    }

    #[test]
    fn test_stepping_within_coarse() {
        let mut session = cube_session();

        let cursor = session.step_fine_within_coarse(Step::Forward);
        assert_eq!(cursor, Cursor::at(Some(0), Some(0)));
        let cursor = session.step_fine_within_coarse(Step::Backward);
        assert_eq!(cursor.fine, Some(7));
        assert_eq!(session.step_coarse(Step::Forward).coarse, Some(0));
        assert_eq!(session.step_fine(Step::Forward).fine, Some(0));
    }

    #[test]
    fn test_outline_and_records() {
        let mut session = cube_session();
        session.select_coarse(0);
        let mut buffer = OutlineBuffer::new();

        session.outline_selected_fine(&OutlineColors::default(), &mut buffer);
        assert_eq!(buffer.len(), 8);
        session.outline_coarse(&OutlineColors::default(), &mut buffer);
        assert_eq!(buffer.len(), 1);

        let text = session.settings_records();
        let reloaded = EditSession::from_records(AssetKind::Structure, &text).unwrap();
        assert_eq!(reloaded.bounds(), session.bounds());
        assert!(!reloaded.has_changed());
    }
}
