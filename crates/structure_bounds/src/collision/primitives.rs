//! Primitive collision shapes and enclosure algorithms
//!
//! Provides basic geometric primitives (spheres, boxes, triangles) with the
//! containment and merge operations used to build bound hierarchies.

use crate::foundation::math::{component_max, component_min, Vec3};

/// A bounding sphere for collision detection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// How far `other` pokes out of this sphere (zero or negative when contained)
    pub fn containment_excess(&self, other: &BoundingSphere) -> f32 {
        (other.center - self.center).magnitude() + other.radius - self.radius
    }

    /// Check if `other` lies entirely inside this sphere, within `tolerance`
    pub fn contains_sphere(&self, other: &BoundingSphere, tolerance: f32) -> bool {
        self.containment_excess(other) <= tolerance
    }

    /// Smallest sphere enclosing both this sphere and `other`
    pub fn merged(&self, other: &BoundingSphere) -> BoundingSphere {
        let offset = other.center - self.center;
        let distance = offset.magnitude();

        if distance + other.radius <= self.radius {
            return *self;
        }
        if distance + self.radius <= other.radius {
            return *other;
        }

        let radius = (distance + self.radius + other.radius) * 0.5;
        // distance > 0 here, otherwise one sphere would contain the other
        let center = self.center + offset * ((radius - self.radius) / distance);
        BoundingSphere { center, radius }
    }

    /// A sphere enclosing every sphere in `spheres`
    ///
    /// Two candidates are built and the smaller one is returned: a sphere
    /// centred on the box around all sphere extents, and a sequential merge.
    /// Both enclose every input exactly. Returns `None` for an empty input.
    pub fn enclosing_spheres(spheres: &[BoundingSphere]) -> Option<BoundingSphere> {
        let (first, rest) = spheres.split_first()?;

        let mut extents = Aabb::from_sphere(first);
        for sphere in rest {
            extents.expand_to_sphere(sphere);
        }
        let box_center = extents.center();
        let box_radius = spheres
            .iter()
            .map(|s| (s.center - box_center).magnitude() + s.radius)
            .fold(0.0f32, f32::max);
        let boxed = BoundingSphere::new(box_center, box_radius);

        let merged = rest.iter().fold(*first, |acc, s| acc.merged(s));
        // Rounding in the merge can leave an input a hair outside
        let merged_radius = spheres
            .iter()
            .map(|s| (s.center - merged.center).magnitude() + s.radius)
            .fold(merged.radius, f32::max);
        let merged = BoundingSphere::new(merged.center, merged_radius);

        if merged.radius < boxed.radius {
            Some(merged)
        } else {
            Some(boxed)
        }
    }

    /// A sphere enclosing every point, centred on their bounding box
    pub fn from_points(points: &[Vec3]) -> Option<BoundingSphere> {
        let aabb = Aabb::from_points(points)?;
        let center = aabb.center();
        let radius = points
            .iter()
            .map(|p| (p - center).magnitude())
            .fold(0.0f32, f32::max);
        Some(BoundingSphere::new(center, radius))
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box holding every point, `None` for no points
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut aabb = Self::new(*first, *first);
        for point in rest {
            aabb.expand_to_point(point);
        }
        Some(aabb)
    }

    /// Box around a sphere
    pub fn from_sphere(sphere: &BoundingSphere) -> Self {
        let extent = Vec3::repeat(sphere.radius);
        Self::new(sphere.center - extent, sphere.center + extent)
    }

    /// Grow the box to include a point
    pub fn expand_to_point(&mut self, point: &Vec3) {
        self.min = component_min(&self.min, point);
        self.max = component_max(&self.max, point);
    }

    /// Grow the box to include a sphere
    pub fn expand_to_sphere(&mut self, sphere: &BoundingSphere) {
        let other = Self::from_sphere(sphere);
        self.min = component_min(&self.min, &other.min);
        self.max = component_max(&self.max, &other.max);
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the full size of the AABB along each axis
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// A triangle of mesh geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// The three corners in order
    pub fn corners(&self) -> [Vec3; 3] {
        [self.v0, self.v1, self.v2]
    }
}

/// Clip a convex planar polygon to the slab `lo <= p[axis] <= hi`
///
/// Sutherland-Hodgman against the two slab planes. Points on a plane are
/// kept. Infinite bounds leave that side unclipped.
pub fn clip_to_slab(polygon: &[Vec3], axis: usize, lo: f32, hi: f32) -> Vec<Vec3> {
    let above = clip_to_plane(polygon, axis, lo, 1.0);
    clip_to_plane(&above, axis, hi, -1.0)
}

/// Keep the part of `polygon` where `side * (p[axis] - bound) >= 0`
fn clip_to_plane(polygon: &[Vec3], axis: usize, bound: f32, side: f32) -> Vec<Vec3> {
    if polygon.is_empty() || bound.is_infinite() {
        return polygon.to_vec();
    }
    let inside = |p: &Vec3| side * (p[axis] - bound) >= 0.0;

    let mut clipped = Vec::with_capacity(polygon.len() + 2);
    for (i, current) in polygon.iter().enumerate() {
        let previous = &polygon[(i + polygon.len() - 1) % polygon.len()];
        match (inside(previous), inside(current)) {
            (true, true) => clipped.push(*current),
            (true, false) => clipped.push(plane_crossing(previous, current, axis, bound)),
            (false, true) => {
                clipped.push(plane_crossing(previous, current, axis, bound));
                clipped.push(*current);
            }
            (false, false) => {}
        }
    }
    clipped
}

/// Point where segment `a`-`b` crosses `p[axis] == bound`
fn plane_crossing(a: &Vec3, b: &Vec3, axis: usize, bound: f32) -> Vec3 {
    let t = (bound - a[axis]) / (b[axis] - a[axis]);
    let mut point = a + (b - a) * t;
    // Pin the clipped coordinate so rounding cannot leave it outside the slab
    point[axis] = bound;
    point
}

/// Area of a convex planar polygon
pub fn polygon_area(polygon: &[Vec3]) -> f32 {
    let Some((first, rest)) = polygon.split_first() else {
        return 0.0;
    };
    let twice = rest
        .windows(2)
        .map(|pair| (pair[0] - first).cross(&(pair[1] - first)))
        .fold(Vec3::zeros(), |acc, c| acc + c);
    twice.magnitude() * 0.5
}
