//! The two-level bound hierarchy
//!
//! A [`BoundSet`] owns an ordered list of coarse spheres and an ordered list of
//! fine spheres. Each coarse sphere lists the fine spheres it contains.
//!
//! Fine spheres live in a generation-tagged slot map and coarse spheres hold
//! their keys, so deleting a fine sphere only has to strip that one key.
//! Every public surface still speaks in positional indices: deleting fine
//! index 5 from a set whose coarse list reads `[2, 5, 7]` leaves `[2, 6]`,
//! exactly as the saved settings format expects.
//!
//! Coarse reference lists are kept in ascending positional order. Insertion
//! is sorted and deletion preserves relative order, so the invariant holds
//! without re-sorting.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::collision::BoundingSphere;
use crate::error::{BoundsError, BoundsResult, Level};
use crate::foundation::collections::{FineKey, OrderedSlotMap};
use crate::foundation::math::{Mat4, Vec3};

use super::sphere::StructureSphere;

/// Source of revision stamps, shared by every set in the process
static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

/// A coarse sphere and the fine spheres it groups
#[derive(Debug, Clone)]
pub struct CoarseBound {
    /// The sphere itself
    pub sphere: StructureSphere,
    references: Vec<FineKey>,
}

impl CoarseBound {
    /// Number of fine spheres referenced
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }
}

/// Coarse and fine bounding spheres of one structure asset
#[derive(Debug, Clone)]
pub struct BoundSet {
    coarse: Vec<CoarseBound>,
    fine: OrderedSlotMap<StructureSphere>,
    placement: Mat4,
    revision: u64,
}

impl Default for BoundSet {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundSet {
    /// Create an empty set in object space
    pub fn new() -> Self {
        Self {
            coarse: Vec::new(),
            fine: OrderedSlotMap::new(),
            placement: Mat4::identity(),
            revision: next_revision(),
        }
    }

    /// Build a set from fine spheres and coarse spheres with positional references
    ///
    /// References are sorted and deduplicated. Fails if any reference is out
    /// of range, in which case nothing is built.
    pub fn from_parts(
        fine: Vec<StructureSphere>,
        coarse: Vec<(StructureSphere, Vec<usize>)>,
    ) -> BoundsResult<Self> {
        let mut set = Self::new();
        for sphere in fine {
            set.fine.push(sphere);
        }
        for (sphere, references) in coarse {
            let keys = set.keys_for(&references)?;
            set.coarse.push(CoarseBound { sphere, references: keys });
        }
        Ok(set)
    }

    // == Queries ==

    /// Number of coarse spheres
    pub fn coarse_len(&self) -> usize {
        self.coarse.len()
    }

    /// Number of fine spheres
    pub fn fine_len(&self) -> usize {
        self.fine.len()
    }

    /// True when both collections are empty
    pub fn is_empty(&self) -> bool {
        self.coarse.is_empty() && self.fine.is_empty()
    }

    /// Coarse sphere at a position
    pub fn coarse(&self, index: usize) -> Option<&StructureSphere> {
        self.coarse.get(index).map(|c| &c.sphere)
    }

    /// Fine sphere at a position
    pub fn fine(&self, index: usize) -> Option<&StructureSphere> {
        self.fine.get_at(index)
    }

    /// Coarse spheres in order
    pub fn coarse_spheres(&self) -> impl Iterator<Item = &StructureSphere> + '_ {
        self.coarse.iter().map(|c| &c.sphere)
    }

    /// Fine spheres in order
    pub fn fine_spheres(&self) -> impl Iterator<Item = &StructureSphere> + '_ {
        self.fine.iter()
    }

    /// Coarse bounds with their reference counts
    pub fn coarse_bounds(&self) -> &[CoarseBound] {
        &self.coarse
    }

    /// Positional fine indices referenced by a coarse sphere, ascending
    pub fn coarse_references(&self, index: usize) -> Option<Vec<usize>> {
        self.coarse
            .get(index)
            .map(|c| c.references.iter().filter_map(|k| self.resolve(*k)).collect())
    }

    /// Object-space spheres of every fine sphere a coarse sphere references
    pub fn referenced_local_spheres(&self, index: usize) -> Option<Vec<BoundingSphere>> {
        self.coarse.get(index).map(|c| {
            c.references
                .iter()
                .filter_map(|k| self.fine.get(*k))
                .map(StructureSphere::local_sphere)
                .collect()
        })
    }

    /// For each fine position, whether any coarse sphere references it
    pub fn referenced_mask(&self) -> Vec<bool> {
        let mut mask = vec![false; self.fine.len()];
        for coarse in &self.coarse {
            for key in &coarse.references {
                if let Some(position) = self.resolve(*key) {
                    mask[position] = true;
                }
            }
        }
        mask
    }

    /// Height of the lowest fine sphere bottom in world space, `None` when empty
    pub fn lowest_point(&self) -> Option<f32> {
        self.fine
            .iter()
            .map(StructureSphere::lowest_point)
            .reduce(f32::min)
    }

    /// Positions of the fine spheres the horizontal plane at `level` cuts
    pub fn fine_at_level(&self, level: f32) -> Vec<usize> {
        self.fine
            .iter()
            .enumerate()
            .filter(|(_, sphere)| sphere.is_at_level(level))
            .map(|(index, _)| index)
            .collect()
    }

    /// The world placement last applied
    pub fn placement(&self) -> &Mat4 {
        &self.placement
    }

    /// Stamp renewed by every structural or geometric edit
    ///
    /// Stamps are unique across all sets, so a set that replaces another
    /// never reports the revision the old one had. Clones keep the stamp.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // == Edits ==

    /// Append a fine sphere, placed with the current world transform
    pub fn add_fine(&mut self, center_local: Vec3, radius: f32) -> usize {
        let mut sphere = StructureSphere::new(center_local, radius);
        sphere.move_to_world(&self.placement);
        self.fine.push(sphere);
        self.touch();
        self.fine.len() - 1
    }

    /// Append a coarse sphere referencing the given fine positions
    pub fn add_coarse(
        &mut self,
        center_local: Vec3,
        radius: f32,
        references: &[usize],
    ) -> BoundsResult<usize> {
        let keys = self.keys_for(references)?;
        let mut sphere = StructureSphere::new(center_local, radius);
        sphere.move_to_world(&self.placement);
        self.coarse.push(CoarseBound { sphere, references: keys });
        self.touch();
        Ok(self.coarse.len() - 1)
    }

    /// Make a coarse sphere reference a fine sphere
    ///
    /// Returns `Ok(false)` if the reference already existed.
    pub fn add_reference(&mut self, coarse: usize, fine: usize) -> BoundsResult<bool> {
        self.check_coarse(coarse)?;
        let key = self.fine_key(fine)?;

        let fine_map = &self.fine;
        let references = &mut self.coarse[coarse].references;
        let slot = references
            .binary_search_by_key(&fine, |k| fine_map.position_of(*k).unwrap_or(usize::MAX));
        let added = match slot {
            Ok(_) => false,
            Err(at) => {
                references.insert(at, key);
                true
            }
        };

        if added {
            self.touch();
        }
        Ok(added)
    }

    /// Drop a reference from a coarse sphere
    ///
    /// Returns `Ok(false)` if there was no such reference.
    pub fn remove_reference(&mut self, coarse: usize, fine: usize) -> BoundsResult<bool> {
        self.check_coarse(coarse)?;
        let key = self.fine_key(fine)?;

        let references = &mut self.coarse[coarse].references;
        let before = references.len();
        references.retain(|k| *k != key);
        let removed = references.len() != before;

        if removed {
            self.touch();
        }
        Ok(removed)
    }

    /// Delete a fine sphere and every reference to it
    ///
    /// Higher fine positions shift down by one, both in the fine list and in
    /// every coarse reference list, in one step.
    pub fn remove_fine(&mut self, index: usize) -> BoundsResult<StructureSphere> {
        let len = self.fine.len();
        let (key, sphere) = self.fine.remove_at(index).ok_or(BoundsError::InvalidSelection {
            collection: Level::Fine,
            index,
            len,
        })?;

        let mut stripped = 0usize;
        for coarse in &mut self.coarse {
            let before = coarse.references.len();
            coarse.references.retain(|k| *k != key);
            stripped += before - coarse.references.len();
        }

        log::debug!("Deleted fine bound {} (was referenced by {} coarse bounds)", index, stripped);
        self.touch();
        Ok(sphere)
    }

    /// Delete a coarse sphere; fine spheres are left alone
    pub fn remove_coarse(&mut self, index: usize) -> BoundsResult<StructureSphere> {
        self.check_coarse(index)?;
        let removed = self.coarse.remove(index);
        log::debug!("Deleted coarse bound {}", index);
        self.touch();
        Ok(removed.sphere)
    }

    /// Replace a coarse sphere's position and size, keeping its references
    pub fn reposition_coarse(&mut self, index: usize, bound: &BoundingSphere) -> BoundsResult<()> {
        self.check_coarse(index)?;
        let sphere = &mut self.coarse[index].sphere;
        sphere.reposition_from(bound);
        sphere.move_to_world(&self.placement);
        self.touch();
        Ok(())
    }

    /// Replace a fine sphere's position and size
    pub fn reposition_fine(&mut self, index: usize, bound: &BoundingSphere) -> BoundsResult<()> {
        let len = self.fine.len();
        let placement = self.placement;
        let sphere = self.fine.get_at_mut(index).ok_or(BoundsError::InvalidSelection {
            collection: Level::Fine,
            index,
            len,
        })?;
        sphere.reposition_from(bound);
        sphere.move_to_world(&placement);
        self.touch();
        Ok(())
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.coarse.clear();
        self.fine.clear();
        self.touch();
    }

    // == Placement ==

    /// Host hook: the model moved, recompute every world center
    pub fn move_to_world(&mut self, transform: &Mat4) {
        self.placement = *transform;
        for coarse in &mut self.coarse {
            coarse.sphere.move_to_world(transform);
        }
        for fine in self.fine.values_mut() {
            fine.move_to_world(transform);
        }
    }

    /// Put every sphere back in object space
    pub fn move_to_object_space(&mut self) {
        self.placement = Mat4::identity();
        for coarse in &mut self.coarse {
            coarse.sphere.move_to_object_space();
        }
        for fine in self.fine.values_mut() {
            fine.move_to_object_space();
        }
    }

    // == Internals ==

    fn touch(&mut self) {
        self.revision = next_revision();
    }

    fn resolve(&self, key: FineKey) -> Option<usize> {
        let position = self.fine.position_of(key);
        if position.is_none() {
            log::error!("Coarse bound refers to a deleted fine bound {:?}", key);
        }
        debug_assert!(position.is_some(), "dangling fine reference {key:?}");
        position
    }

    fn check_coarse(&self, index: usize) -> BoundsResult<()> {
        if index < self.coarse.len() {
            Ok(())
        } else {
            Err(BoundsError::InvalidSelection {
                collection: Level::Coarse,
                index,
                len: self.coarse.len(),
            })
        }
    }

    fn fine_key(&self, index: usize) -> BoundsResult<FineKey> {
        self.fine.key_at(index).ok_or(BoundsError::InvalidSelection {
            collection: Level::Fine,
            index,
            len: self.fine.len(),
        })
    }

    /// Sorted, deduplicated keys for positional references
    fn keys_for(&self, references: &[usize]) -> BoundsResult<Vec<FineKey>> {
        let mut positions = references.to_vec();
        positions.sort_unstable();
        positions.dedup();
        positions.into_iter().map(|p| self.fine_key(p)).collect()
    }
}

impl PartialEq for BoundSet {
    /// Sets are equal when their positional views match
    fn eq(&self, other: &Self) -> bool {
        self.coarse_len() == other.coarse_len()
            && self.fine_len() == other.fine_len()
            && self.fine_spheres().eq(other.fine_spheres())
            && (0..self.coarse_len()).all(|i| {
                self.coarse(i) == other.coarse(i)
                    && self.coarse_references(i) == other.coarse_references(i)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform;
    use approx::assert_relative_eq;

    fn set_with_fine(count: usize) -> BoundSet {
        let mut set = BoundSet::new();
        for i in 0..count {
            set.add_fine(Vec3::new(i as f32, 0.0, 0.0), 0.25);
        }
        set
    }

    #[test]
    fn test_delete_fine_renumbers_references() {
        let mut set = set_with_fine(8);
        set.add_coarse(Vec3::zeros(), 10.0, &[2, 5, 7]).unwrap();

        set.remove_fine(5).unwrap();

        assert_eq!(set.coarse_references(0), Some(vec![2, 6]));
        assert_eq!(set.fine_len(), 7);
        // The sphere that was at 7 now sits at 6
        assert_eq!(set.fine(6).unwrap().center_local, Vec3::new(7.0, 0.0, 0.0));
    }

    #[test]
    fn test_delete_fine_updates_every_coarse() {
        let mut set = set_with_fine(6);
        set.add_coarse(Vec3::zeros(), 10.0, &[0, 3, 5]).unwrap();
        set.add_coarse(Vec3::zeros(), 10.0, &[1, 3, 4]).unwrap();
        set.add_coarse(Vec3::zeros(), 10.0, &[0, 1]).unwrap();

        set.remove_fine(3).unwrap();

        assert_eq!(set.coarse_references(0), Some(vec![0, 4]));
        assert_eq!(set.coarse_references(1), Some(vec![1, 3]));
        assert_eq!(set.coarse_references(2), Some(vec![0, 1]));
    }

    #[test]
    fn test_delete_fine_out_of_range() {
        let mut set = set_with_fine(2);
        let before = set.clone();

        assert!(matches!(
            set.remove_fine(2),
            Err(BoundsError::InvalidSelection { collection: Level::Fine, index: 2, len: 2 })
        ));
        assert_eq!(set, before);
    }

    #[test]
    fn test_delete_coarse_keeps_fine() {
        let mut set = set_with_fine(3);
        set.add_coarse(Vec3::zeros(), 5.0, &[0, 1]).unwrap();
        set.add_coarse(Vec3::zeros(), 5.0, &[2]).unwrap();

        set.remove_coarse(0).unwrap();

        assert_eq!(set.coarse_len(), 1);
        assert_eq!(set.fine_len(), 3);
        assert_eq!(set.coarse_references(0), Some(vec![2]));
        assert_eq!(set.referenced_mask(), vec![false, false, true]);
    }

    #[test]
    fn test_references_sorted_on_insert() {
        let mut set = set_with_fine(8);
        set.add_coarse(Vec3::zeros(), 10.0, &[6, 1, 4, 1]).unwrap();

        assert_eq!(set.coarse_references(0), Some(vec![1, 4, 6]));

        assert_eq!(set.add_reference(0, 5), Ok(true));
        assert_eq!(set.add_reference(0, 0), Ok(true));
        assert_eq!(set.add_reference(0, 4), Ok(false));
        assert_eq!(set.coarse_references(0), Some(vec![0, 1, 4, 5, 6]));

        assert_eq!(set.remove_reference(0, 4), Ok(true));
        assert_eq!(set.remove_reference(0, 4), Ok(false));
        assert_eq!(set.coarse_references(0), Some(vec![0, 1, 5, 6]));
    }

    #[test]
    fn test_add_coarse_rejects_bad_reference() {
        let mut set = set_with_fine(2);

        assert!(set.add_coarse(Vec3::zeros(), 1.0, &[0, 2]).is_err());
        assert_eq!(set.coarse_len(), 0);
    }

    #[test]
    fn test_move_to_world_follows_placement() {
        let mut set = set_with_fine(2);
        set.add_coarse(Vec3::zeros(), 3.0, &[0, 1]).unwrap();
        let placement = Transform::from_position(Vec3::new(0.0, 4.0, 0.0)).to_matrix();

        set.move_to_world(&placement);
        assert_relative_eq!(set.fine(1).unwrap().center, Vec3::new(1.0, 4.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(set.coarse(0).unwrap().center, Vec3::new(0.0, 4.0, 0.0), epsilon = 1e-5);

        // New spheres pick up the current placement
        let added = set.add_fine(Vec3::new(2.0, 0.0, 0.0), 0.1);
        assert_relative_eq!(set.fine(added).unwrap().center, Vec3::new(2.0, 4.0, 0.0), epsilon = 1e-5);

        set.move_to_object_space();
        assert_eq!(set.fine(1).unwrap().center, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_reposition_coarse_keeps_references_and_placement() {
        let mut set = set_with_fine(3);
        set.add_coarse(Vec3::zeros(), 1.0, &[0, 2]).unwrap();
        set.move_to_world(&Transform::from_position(Vec3::new(1.0, 0.0, 0.0)).to_matrix());

        set.reposition_coarse(0, &BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 2.0)).unwrap();

        let coarse = set.coarse(0).unwrap();
        assert_eq!(coarse.center_local, Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(coarse.center, Vec3::new(2.0, 0.0, 0.0), epsilon = 1e-5);
        assert_eq!(set.coarse_references(0), Some(vec![0, 2]));
    }

    #[test]
    fn test_revision_counts_edits_only() {
        let mut set = set_with_fine(1);
        let start = set.revision();

        set.move_to_world(&Mat4::identity());
        assert_eq!(set.revision(), start);

        set.add_coarse(Vec3::zeros(), 1.0, &[0]).unwrap();
        assert!(set.revision() > start);
    }

    #[test]
    fn test_ground_contact_follows_placement() {
        let mut set = BoundSet::new();
        set.add_fine(Vec3::new(0.0, 0.0, 0.0), 0.5);
        set.add_fine(Vec3::new(0.0, 2.0, 0.0), 0.5);
        set.add_fine(Vec3::new(3.0, 0.2, 0.0), 0.5);
        assert_eq!(set.lowest_point(), Some(-0.5));
        assert_eq!(set.fine_at_level(-0.5), vec![0]);
        assert_eq!(set.fine_at_level(0.0), vec![0, 2]);

        // Rolled upside down the second sphere ends up lowest
        let flip = Transform::from_euler(Vec3::zeros(), std::f32::consts::PI, 0.0, 0.0);
        set.move_to_world(&flip.to_matrix());
        let lowest = set.lowest_point().unwrap();
        assert!((lowest + 2.5).abs() < 1e-5);
        assert_eq!(set.fine_at_level(lowest + 1e-4), vec![1]);
        assert!(BoundSet::new().lowest_point().is_none());
    }

    #[test]
    fn test_fresh_sets_never_share_a_revision() {
        let a = BoundSet::new();
        let b = BoundSet::new();
        assert_ne!(a.revision(), b.revision());
        assert_eq!(a.clone().revision(), a.revision());
    }

    #[test]
    fn test_from_parts_and_equality() {
        let fine = vec![
            StructureSphere::new(Vec3::zeros(), 0.5),
            StructureSphere::new(Vec3::new(1.0, 0.0, 0.0), 0.5),
        ];
        let coarse = vec![(StructureSphere::new(Vec3::new(0.5, 0.0, 0.0), 1.0), vec![1, 0])];

        let a = BoundSet::from_parts(fine.clone(), coarse.clone()).unwrap();
        let b = BoundSet::from_parts(fine.clone(), coarse).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.coarse_references(0), Some(vec![0, 1]));

        let bad = BoundSet::from_parts(fine, vec![(StructureSphere::new(Vec3::zeros(), 1.0), vec![2])]);
        assert!(bad.is_err());
    }
}
