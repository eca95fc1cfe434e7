//! Fit an initial bound set to model geometry
//!
//! The model is divided into a sparse uniform grid whose cell size is the fine
//! width. Every triangle is clipped to each cell it passes through, and each
//! cell the surface occupies becomes one fine sphere enclosing the clipped
//! pieces. Since the pieces are convex, the sphere around their corners covers
//! all of the surface inside that cell.
//!
//! Fine spheres are then bucketed by center into a coarser grid and each
//! occupied coarse cell becomes one coarse sphere enclosing its fine spheres.
//! A coarse cell spans `fine_width * coarse_multiple`, so that product is the
//! approximate coarse *diameter* across a flat patch; a fully occupied cubic
//! cell gives a radius of about `0.87 * fine_width * coarse_multiple`.
//!
//! Both grids are anchored at the minimum corner of the model's bounding box.
//! Cells are visited in grid-coordinate order, so the output is deterministic.

use std::collections::BTreeMap;

use crate::asset::AssetKind;
use crate::collision::primitives::{clip_to_slab, polygon_area};
use crate::collision::{BoundingSphere, MeshGeometry, Triangle};
use crate::config::FittingConfig;
use crate::error::{BoundsError, BoundsResult};
use crate::foundation::math::Vec3;

use super::bound_set::BoundSet;
use super::sphere::StructureSphere;

/// Clipped pieces smaller than this fraction of their triangle or cell face are
/// contact only
const MIN_PIECE_FRACTION: f32 = 1e-6;

/// Grid cell coordinate
type Cell = [usize; 3];

/// Sparse uniform grid anchored at `origin`
struct Grid {
    origin: Vec3,
    cell_size: f32,
    dims: Cell,
}

impl Grid {
    fn new(origin: Vec3, extent: Vec3, cell_size: f32) -> Self {
        let cells_along = |length: f32| ((length / cell_size).ceil() as usize).max(1);
        Self {
            origin,
            cell_size,
            dims: [cells_along(extent.x), cells_along(extent.y), cells_along(extent.z)],
        }
    }

    /// Index along one axis; values past either end fall in the end cells
    fn index_along(&self, axis: usize, value: f32) -> usize {
        let relative = (value - self.origin[axis]) / self.cell_size;
        (relative.max(0.0).floor() as usize).min(self.dims[axis] - 1)
    }

    /// Cell holding a point
    fn cell_of(&self, point: &Vec3) -> Cell {
        [
            self.index_along(0, point.x),
            self.index_along(1, point.y),
            self.index_along(2, point.z),
        ]
    }

    /// Slab covered by cell `index` along `axis`; the end cells are open-ended
    fn slab(&self, axis: usize, index: usize) -> (f32, f32) {
        let lo = if index == 0 {
            f32::NEG_INFINITY
        } else {
            self.origin[axis] + index as f32 * self.cell_size
        };
        let hi = if index + 1 >= self.dims[axis] {
            f32::INFINITY
        } else {
            self.origin[axis] + (index + 1) as f32 * self.cell_size
        };
        (lo, hi)
    }

    /// Cell indices along `axis` that a polygon can reach
    fn span(&self, axis: usize, polygon: &[Vec3]) -> std::ops::RangeInclusive<usize> {
        let (lo, hi) = polygon
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), p| (lo.min(p[axis]), hi.max(p[axis])));
        self.index_along(axis, lo)..=self.index_along(axis, hi)
    }
}

/// Fit bounds using the tuning values from a [`FittingConfig`]
pub fn fit_with_config(
    mesh: &MeshGeometry,
    kind: AssetKind,
    config: &FittingConfig,
) -> BoundsResult<BoundSet> {
    fit_from_geometry(mesh, kind, config.fine_width, config.coarse_multiple)
}

/// Build a fresh bound set approximating the mesh surface
///
/// `fine_width` is the target diameter of a fine sphere and `coarse_multiple`
/// how many fine widths a coarse sphere spans. The result is in object space.
pub fn fit_from_geometry(
    mesh: &MeshGeometry,
    kind: AssetKind,
    fine_width: f32,
    coarse_multiple: f32,
) -> BoundsResult<BoundSet> {
    if !kind.supports_structure_bounds() {
        return Err(BoundsError::WrongAssetType(kind));
    }
    if !(fine_width.is_finite() && fine_width > 0.0) {
        return Err(BoundsError::InvalidFitParameter { name: "fine_width", value: fine_width });
    }
    if !(coarse_multiple.is_finite() && coarse_multiple > 1.0) {
        return Err(BoundsError::InvalidFitParameter {
            name: "coarse_multiple",
            value: coarse_multiple,
        });
    }
    let aabb = match mesh.aabb() {
        Some(aabb) if !mesh.is_empty() => aabb,
        _ => return Err(BoundsError::EmptyGeometry),
    };

    log::info!(
        "Calculating model bounds for {} triangles (fine width {}, coarse multiple {})",
        mesh.triangle_count(),
        fine_width,
        coarse_multiple
    );

    let fine = fit_fine(mesh, &Grid::new(aabb.min, aabb.size(), fine_width));
    let coarse_grid = Grid::new(aabb.min, aabb.size(), fine_width * coarse_multiple);
    let coarse = group_coarse(&fine, &coarse_grid);

    log::info!("Created {} coarse and {} fine bounds", coarse.len(), fine.len());

    let fine = fine.iter().map(StructureSphere::from_local).collect();
    BoundSet::from_parts(fine, coarse)
}

/// One fine sphere per cell the surface passes through
fn fit_fine(mesh: &MeshGeometry, grid: &Grid) -> Vec<BoundingSphere> {
    let mut cells: BTreeMap<Cell, Vec<Vec3>> = BTreeMap::new();
    for triangle in mesh.triangles() {
        clip_into_cells(triangle, grid, &mut cells);
    }

    cells
        .values()
        .filter_map(|points| BoundingSphere::from_points(points))
        .collect()
}

/// Add the corners of every piece of `triangle` to the cell holding it
///
/// The triangle is cut into x slabs, each piece into y slabs and each of
/// those into z slabs, so only cells the surface reaches are visited.
/// Pieces where the triangle merely touches a cell face are dropped.
fn clip_into_cells(triangle: &Triangle, grid: &Grid, cells: &mut BTreeMap<Cell, Vec<Vec3>>) {
    let corners = triangle.corners();
    let area = polygon_area(&corners);
    if area <= 0.0 {
        log::trace!("Skipping degenerate triangle {:?}", triangle);
        return;
    }
    let min_area = area.min(grid.cell_size * grid.cell_size) * MIN_PIECE_FRACTION;

    for ix in grid.span(0, &corners) {
        let (lo, hi) = grid.slab(0, ix);
        let in_x = clip_to_slab(&corners, 0, lo, hi);
        if in_x.len() < 3 {
            continue;
        }
        for iy in grid.span(1, &in_x) {
            let (lo, hi) = grid.slab(1, iy);
            let in_xy = clip_to_slab(&in_x, 1, lo, hi);
            if in_xy.len() < 3 {
                continue;
            }
            for iz in grid.span(2, &in_xy) {
                let (lo, hi) = grid.slab(2, iz);
                let piece = clip_to_slab(&in_xy, 2, lo, hi);
                if piece.len() >= 3 && polygon_area(&piece) > min_area {
                    cells.entry([ix, iy, iz]).or_default().extend(piece);
                }
            }
        }
    }
}

/// Group fine spheres into coarse cells by center
fn group_coarse(fine: &[BoundingSphere], grid: &Grid) -> Vec<(StructureSphere, Vec<usize>)> {
    let mut cells: BTreeMap<Cell, Vec<usize>> = BTreeMap::new();
    for (index, sphere) in fine.iter().enumerate() {
        cells.entry(grid.cell_of(&sphere.center)).or_default().push(index);
    }

    cells
        .into_values()
        .filter_map(|members| {
            let spheres: Vec<BoundingSphere> = members.iter().map(|&i| fine[i]).collect();
            BoundingSphere::enclosing_spheres(&spheres)
                .map(|enclosing| (StructureSphere::from_local(&enclosing), members))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::optimize::{validate, CONTAINMENT_TOLERANCE};

    fn unit_cube() -> MeshGeometry {
        MeshGeometry::cube(Vec3::zeros(), 1.0)
    }

    #[test]
    fn test_unit_cube_covers_every_octant() {
        let set = fit_from_geometry(&unit_cube(), AssetKind::Structure, 0.5, 2.0).unwrap();

        let mut octants = [false; 8];
        for sphere in set.fine_spheres() {
            let c = sphere.center_local;
            let octant = usize::from(c.x > 0.0) | usize::from(c.y > 0.0) << 1 | usize::from(c.z > 0.0) << 2;
            octants[octant] = true;
        }
        assert!(octants.iter().all(|&hit| hit), "octants covered: {:?}", octants);
        assert_eq!(set.fine_len(), 8);
        assert_eq!(set.coarse_len(), 1);
        assert_eq!(set.coarse_references(0), Some((0..8).collect::<Vec<usize>>()));
    }

    #[test]
    fn test_fitted_set_is_consistent() {
        let set = fit_from_geometry(&unit_cube(), AssetKind::Structure, 0.2, 2.5).unwrap();

        assert!(set.coarse_len() > 1);
        assert!(validate(&set).is_ok(), "{:?}", validate(&set));
        for i in 0..set.coarse_len() {
            let coarse = set.coarse(i).unwrap().local_sphere();
            for fine in set.referenced_local_spheres(i).unwrap() {
                assert!(coarse.contains_sphere(&fine, CONTAINMENT_TOLERANCE));
            }
        }
    }

    #[test]
    fn test_fine_spheres_track_fine_width() {
        let width = 0.25;
        let set = fit_from_geometry(&unit_cube(), AssetKind::Structure, width, 2.0).unwrap();

        // A cell's enclosing sphere never exceeds half the cell diagonal
        let limit = width * 3.0f32.sqrt() * 0.5 + 1e-5;
        assert!(set.fine_spheres().all(|s| s.radius <= limit));
    }

    #[test]
    fn test_sample_surface_of_large_triangles() {
        // One big quad; the interior must be covered, not just its corners
        let set = fit_from_geometry(&flat_quad(4.0), AssetKind::Structure, 1.0, 2.0).unwrap();

        assert_eq!(set.fine_len(), 16);
        assert_eq!(set.coarse_len(), 4);
    }

    fn flat_quad(size: f32) -> MeshGeometry {
        MeshGeometry::single(crate::collision::MeshPart::from_vertices(
            &[
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(size, 0.0, 0.0),
                Vec3::new(0.0, 0.0, size),
                Vec3::new(size, 0.0, size),
            ],
            &[0, 2, 1, 1, 2, 3],
        ))
    }

    fn covered(set: &BoundSet, point: &Vec3) -> bool {
        set.fine_spheres()
            .any(|s| (point - s.center_local).magnitude() <= s.radius + 1e-4)
    }

    #[test]
    fn test_every_surface_point_is_covered() {
        let set = fit_from_geometry(&flat_quad(4.0), AssetKind::Structure, 1.0, 2.0).unwrap();

        for i in 0..=40 {
            for j in 0..=40 {
                let point = Vec3::new(i as f32 * 0.1, 0.0, j as f32 * 0.1);
                assert!(covered(&set, &point), "{:?} not inside any fine sphere", point);
            }
        }
    }

    #[test]
    fn test_tilted_triangle_is_covered() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 1.0, 0.5);
        let c = Vec3::new(0.5, 2.5, 3.0);
        let mesh = MeshGeometry::from_triangles(vec![Triangle::new(a, b, c)]);
        let set = fit_from_geometry(&mesh, AssetKind::Structure, 0.4, 3.0).unwrap();

        let steps = 30;
        for i in 0..=steps {
            for j in 0..=steps - i {
                let u = i as f32 / steps as f32;
                let v = j as f32 / steps as f32;
                let point = a + (b - a) * u + (c - a) * v;
                assert!(covered(&set, &point), "{:?} not inside any fine sphere", point);
            }
        }
        assert!(validate(&set).is_ok(), "{:?}", validate(&set));
    }

    #[test]
    fn test_large_triangles_fill_every_cell() {
        // 256 cells per side, far more than any fixed subdivision would reach
        let width = 0.125;
        let set = fit_from_geometry(&flat_quad(32.0), AssetKind::Structure, width, 4.0).unwrap();

        assert_eq!(set.fine_len(), 256 * 256);
        assert_eq!(set.coarse_len(), 64 * 64);
        let limit = width * 2.0f32.sqrt() * 0.5 + 1e-5;
        assert!(set.fine_spheres().all(|s| s.radius > 0.0 && s.radius <= limit));
    }

    #[test]
    fn test_empty_geometry_rejected() {
        let result = fit_from_geometry(&MeshGeometry::default(), AssetKind::Structure, 0.5, 2.0);
        assert_eq!(result, Err(BoundsError::EmptyGeometry));
    }

    #[test]
    fn test_wrong_asset_type_rejected() {
        let result = fit_from_geometry(&unit_cube(), AssetKind::Character, 0.5, 2.0);
        assert_eq!(result, Err(BoundsError::WrongAssetType(AssetKind::Character)));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(matches!(
            fit_from_geometry(&unit_cube(), AssetKind::Structure, 0.0, 2.0),
            Err(BoundsError::InvalidFitParameter { name: "fine_width", .. })
        ));
        assert!(matches!(
            fit_from_geometry(&unit_cube(), AssetKind::Structure, 0.5, 1.0),
            Err(BoundsError::InvalidFitParameter { name: "coarse_multiple", .. })
        ));
        assert!(matches!(
            fit_from_geometry(&unit_cube(), AssetKind::Structure, f32::NAN, 2.0),
            Err(BoundsError::InvalidFitParameter { .. })
        ));
    }

    #[test]
    fn test_fitting_is_deterministic() {
        let a = fit_from_geometry(&unit_cube(), AssetKind::Structure, 0.3, 3.0).unwrap();
        let b = fit_from_geometry(&unit_cube(), AssetKind::Structure, 0.3, 3.0).unwrap();
        assert_eq!(a, b);
    }
}
