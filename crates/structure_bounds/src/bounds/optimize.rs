//! Post-edit consistency pass
//!
//! Run before saving whenever bounds were edited by hand:
//! 1. every coarse sphere is refitted to exactly enclose its fine spheres,
//!    since an overlapping fine sphere gives inconsistent collision response
//! 2. fine spheres no coarse sphere references are deleted
//! 3. coarse spheres left with no references are deleted
//!
//! The pass is idempotent.

use crate::collision::BoundingSphere;
use crate::foundation::math::{transform_position, Vec3};

use super::bound_set::BoundSet;

/// Slack allowed when checking that a coarse sphere contains a fine sphere
pub const CONTAINMENT_TOLERANCE: f32 = 1e-4;

/// What an optimization pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeReport {
    /// Coarse spheres whose center or radius changed
    pub resized: usize,
    /// Unreferenced fine spheres deleted
    pub orphans_removed: usize,
    /// Coarse spheres deleted for having no references
    pub empty_coarse_removed: usize,
}

impl OptimizeReport {
    /// True when the pass changed nothing
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Repair containment and prune orphans and empty coarse spheres, in place
pub fn optimize(set: &mut BoundSet) -> OptimizeReport {
    let mut report = OptimizeReport::default();

    for index in 0..set.coarse_len() {
        let members = set.referenced_local_spheres(index).unwrap_or_default();
        let Some(enclosing) = BoundingSphere::enclosing_spheres(&members) else {
            continue;
        };
        let current = set.coarse(index).map(|c| c.local_sphere());
        if current != Some(enclosing) && set.reposition_coarse(index, &enclosing).is_ok() {
            report.resized += 1;
        }
    }

    // Descending, so deleting one orphan never moves a position still to be checked
    let referenced = set.referenced_mask();
    for index in (0..referenced.len()).rev() {
        if !referenced[index] && set.remove_fine(index).is_ok() {
            report.orphans_removed += 1;
        }
    }

    for index in (0..set.coarse_len()).rev() {
        let empty = set.coarse_bounds()[index].reference_count() == 0;
        if empty && set.remove_coarse(index).is_ok() {
            report.empty_coarse_removed += 1;
        }
    }

    log::info!(
        "Optimised bounds: {} coarse resized, {} orphaned fine removed, {} empty coarse removed",
        report.resized,
        report.orphans_removed,
        report.empty_coarse_removed
    );
    report
}

/// Optimize a set the caller hands over, returning the result
pub fn optimized(mut set: BoundSet) -> (BoundSet, OptimizeReport) {
    let report = optimize(&mut set);
    (set, report)
}

/// A broken bound-set invariant
#[derive(Debug, Clone, PartialEq)]
pub enum InvariantViolation {
    /// A referenced fine sphere pokes out of its coarse sphere
    NotContained {
        /// Coarse position
        coarse: usize,
        /// Fine position
        fine: usize,
        /// How far it pokes out
        excess: f32,
    },
    /// A reference past the end of the fine list
    ReferenceOutOfRange {
        /// Coarse position
        coarse: usize,
        /// The bad reference
        reference: usize,
    },
    /// A reference list not strictly ascending
    UnsortedReferences {
        /// Coarse position
        coarse: usize,
    },
    /// A fine sphere no coarse sphere references
    Orphan {
        /// Fine position
        fine: usize,
    },
    /// A coarse sphere with no references
    EmptyCoarse {
        /// Coarse position
        coarse: usize,
    },
    /// A world center that does not match the current placement
    CenterOutOfPlace {
        /// True for coarse, false for fine
        coarse: bool,
        /// Position in its collection
        index: usize,
    },
}

/// Check every invariant an optimized set must satisfy
pub fn validate(set: &BoundSet) -> Result<(), Vec<InvariantViolation>> {
    let mut violations = Vec::new();

    for coarse in 0..set.coarse_len() {
        let references = set.coarse_references(coarse).unwrap_or_default();
        let Some(sphere) = set.coarse(coarse) else { continue };
        let outer = sphere.local_sphere();

        if references.is_empty() {
            violations.push(InvariantViolation::EmptyCoarse { coarse });
        }
        if !references.windows(2).all(|w| w[0] < w[1]) {
            violations.push(InvariantViolation::UnsortedReferences { coarse });
        }
        for &fine in &references {
            match set.fine(fine) {
                None => violations.push(InvariantViolation::ReferenceOutOfRange { coarse, reference: fine }),
                Some(inner) => {
                    let excess = outer.containment_excess(&inner.local_sphere());
                    if excess > CONTAINMENT_TOLERANCE {
                        violations.push(InvariantViolation::NotContained { coarse, fine, excess });
                    }
                }
            }
        }
    }

    for (fine, referenced) in set.referenced_mask().into_iter().enumerate() {
        if !referenced {
            violations.push(InvariantViolation::Orphan { fine });
        }
    }

    let placement = set.placement();
    let out_of_place = |center_local: &Vec3, center: &Vec3| {
        (transform_position(placement, center_local) - center).magnitude() > CONTAINMENT_TOLERANCE
    };
    for (index, sphere) in set.coarse_spheres().enumerate() {
        if out_of_place(&sphere.center_local, &sphere.center) {
            violations.push(InvariantViolation::CenterOutOfPlace { coarse: true, index });
        }
    }
    for (index, sphere) in set.fine_spheres().enumerate() {
        if out_of_place(&sphere.center_local, &sphere.center) {
            violations.push(InvariantViolation::CenterOutOfPlace { coarse: false, index });
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Transform;

    /// Three fine spheres in a row, one coarse sphere too small to hold them
    fn hand_edited_set() -> BoundSet {
        let mut set = BoundSet::new();
        set.add_fine(Vec3::new(-1.0, 0.0, 0.0), 0.5);
        set.add_fine(Vec3::new(0.0, 0.0, 0.0), 0.5);
        set.add_fine(Vec3::new(1.0, 0.0, 0.0), 0.5);
        set.add_coarse(Vec3::new(0.2, 0.0, 0.0), 0.5, &[0, 1, 2]).unwrap();
        set
    }

    #[test]
    fn test_repairs_containment() {
        let mut set = hand_edited_set();
        assert!(validate(&set).is_err());

        let report = optimize(&mut set);

        assert_eq!(report.resized, 1);
        assert!(validate(&set).is_ok(), "{:?}", validate(&set));
        let coarse = set.coarse(0).unwrap();
        assert!((coarse.radius - 1.5).abs() < 1e-4);
    }

    #[test]
    fn test_shrinks_oversized_coarse() {
        let mut set = BoundSet::new();
        set.add_fine(Vec3::zeros(), 0.5);
        set.add_coarse(Vec3::zeros(), 10.0, &[0]).unwrap();

        optimize(&mut set);

        assert!((set.coarse(0).unwrap().radius - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_prunes_orphans_and_empty_coarse() {
        let mut set = BoundSet::new();
        for i in 0..6 {
            set.add_fine(Vec3::new(i as f32, 0.0, 0.0), 0.25);
        }
        set.add_coarse(Vec3::zeros(), 1.0, &[1, 4]).unwrap();
        set.add_coarse(Vec3::zeros(), 1.0, &[]).unwrap();
        set.add_coarse(Vec3::zeros(), 1.0, &[4, 5]).unwrap();

        let report = optimize(&mut set);

        assert_eq!(report.orphans_removed, 3);
        assert_eq!(report.empty_coarse_removed, 1);
        assert_eq!(set.fine_len(), 3);
        assert_eq!(set.coarse_len(), 2);
        assert_eq!(set.coarse_references(0), Some(vec![0, 1]));
        assert_eq!(set.coarse_references(1), Some(vec![1, 2]));
        assert_eq!(set.fine(2).unwrap().center_local, Vec3::new(5.0, 0.0, 0.0));
        assert!(validate(&set).is_ok());
    }

    #[test]
    fn test_idempotent() {
        let mut set = hand_edited_set();
        set.add_fine(Vec3::new(9.0, 9.0, 9.0), 1.0);
        set.add_coarse(Vec3::zeros(), 2.0, &[]).unwrap();

        optimize(&mut set);
        let once = set.clone();
        let second = optimize(&mut set);

        assert_eq!(set, once);
        assert!(second.is_noop());
    }

    /// Small linear congruential generator so generated sets are repeatable
    struct Lcg(u64);

    impl Lcg {
        fn next_unit(&mut self) -> f32 {
            self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            (self.0 >> 40) as f32 / (1u64 << 24) as f32
        }

        fn range(&mut self, lo: f32, hi: f32) -> f32 {
            lo + (hi - lo) * self.next_unit()
        }

        fn below(&mut self, n: usize) -> usize {
            ((self.next_unit() * n as f32) as usize).min(n - 1)
        }

        fn point(&mut self) -> Vec3 {
            Vec3::new(self.range(-10.0, 10.0), self.range(-10.0, 10.0), self.range(-10.0, 10.0))
        }
    }

    /// A messy hand-edited set: random spheres, shared references, empty
    /// coarse spheres and orphans, sometimes placed away from the origin
    fn generated_set(rng: &mut Lcg) -> BoundSet {
        let mut set = BoundSet::new();
        let placed = rng.next_unit() < 0.5;
        let placement = Transform::from_euler(rng.point(), rng.range(-3.0, 3.0), rng.range(-3.0, 3.0), 0.7)
            .to_matrix();
        if placed {
            set.move_to_world(&placement);
        }

        let fine_count = 1 + rng.below(20);
        for _ in 0..fine_count {
            set.add_fine(rng.point(), rng.range(0.05, 2.0));
        }

        let mut previous: Vec<usize> = Vec::new();
        for _ in 0..rng.below(6) {
            let references: Vec<usize> = match rng.below(4) {
                0 => Vec::new(),
                1 => previous.clone(),
                _ => (0..rng.below(fine_count)).map(|_| rng.below(fine_count)).collect(),
            };
            set.add_coarse(rng.point(), rng.range(0.1, 5.0), &references).unwrap();
            previous = references;
        }

        if !placed {
            set.move_to_world(&placement);
        }
        set
    }

    #[test]
    fn test_generated_sets_optimize_to_valid_fixed_point() {
        let mut rng = Lcg(0x5eed);
        for round in 0..200 {
            let mut set = generated_set(&mut rng);

            optimize(&mut set);
            assert!(validate(&set).is_ok(), "set {}: {:?}", round, validate(&set));

            let once = set.clone();
            let second = optimize(&mut set);
            assert!(second.is_noop(), "set {}: second pass changed {:?}", round, second);
            assert_eq!(set, once, "set {}", round);
        }
    }

    #[test]
    fn test_empty_set() {
        let (set, report) = optimized(BoundSet::new());
        assert!(set.is_empty());
        assert!(report.is_noop());
        assert!(validate(&set).is_ok());
    }

    #[test]
    fn test_fine_without_coarse_all_pruned() {
        let mut set = BoundSet::new();
        set.add_fine(Vec3::zeros(), 1.0);
        set.add_fine(Vec3::zeros(), 1.0);

        let report = optimize(&mut set);
        assert_eq!(report.orphans_removed, 2);
        assert!(set.is_empty());
    }

    #[test]
    fn test_keeps_world_placement() {
        let mut set = hand_edited_set();
        let placement = Transform::from_position(Vec3::new(0.0, 3.0, 0.0)).to_matrix();
        set.move_to_world(&placement);

        optimize(&mut set);

        assert!(validate(&set).is_ok(), "{:?}", validate(&set));
        let coarse = set.coarse(0).unwrap();
        assert!((coarse.center.y - 3.0).abs() < 1e-5);
    }
}
