//! Geometry kernel: convex hulls, polytope intersection and overlap

pub mod halfspace;
pub mod hull;
pub mod lp;
pub mod overlap;

pub use halfspace::halfspace_intersection;
pub use hull::{ConvexHull, Facet};
pub use lp::{chebyshev_center, ChebyshevBall};
pub use overlap::{volumetric_overlap, INTERSECTION_RADIUS_FLOOR};

/// A point in Cartesian space (Å)
pub type Point = [f64; 3];

/// A half-space `normal · x + offset <= 0` stored as `[nx, ny, nz, offset]`
pub type Halfspace = [f64; 4];

#[inline]
pub fn sub(a: &Point, b: &Point) -> Point {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub fn add(a: &Point, b: &Point) -> Point {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

#[inline]
pub fn scale(a: &Point, s: f64) -> Point {
    [a[0] * s, a[1] * s, a[2] * s]
}

#[inline]
pub fn dot(a: &Point, b: &Point) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[inline]
pub fn cross(a: &Point, b: &Point) -> Point {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

#[inline]
pub fn norm(a: &Point) -> f64 {
    dot(a, a).sqrt()
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: &Point, b: &Point) -> f64 {
    norm(&sub(a, b))
}

/// Arithmetic mean of a point set (NaN coordinates when empty)
pub fn mean_point(points: &[Point]) -> Point {
    let n = points.len() as f64;
    let sum = points.iter().fold([0.0; 3], |acc, p| add(&acc, p));
    scale(&sum, 1.0 / n)
}

/// Weighted center of mass; weights must align with `points`
pub fn weighted_center(points: &[Point], weights: &[f64]) -> Point {
    let total: f64 = weights.iter().sum();
    let sum = points
        .iter()
        .zip(weights)
        .fold([0.0; 3], |acc, (p, &w)| add(&acc, &scale(p, w)));
    scale(&sum, 1.0 / total)
}

/// Shortest distance from `point` to any member of `targets`
pub fn min_distance(point: &Point, targets: &[Point]) -> f64 {
    targets
        .iter()
        .map(|t| distance(point, t))
        .fold(f64::INFINITY, f64::min)
}

/// Signed volume of the tetrahedron `(a, b, c, d)` times six
#[inline]
pub fn triple_product(a: &Point, b: &Point, c: &Point, d: &Point) -> f64 {
    let ab = sub(b, a);
    let ac = sub(c, a);
    let ad = sub(d, a);
    dot(&ab, &cross(&ac, &ad))
}
