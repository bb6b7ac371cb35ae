//! Three-dimensional convex hulls
//!
//! Hulls are grown incrementally: starting from a maximal initial simplex,
//! every point that lies beyond at least one facet replaces the facets it can
//! see with a fan of new facets around the horizon. Facets are triangles with
//! outward unit normals, so `normal · x + offset <= 0` holds for every point of
//! the hull.

use std::collections::{BTreeMap, BTreeSet};

use super::{add, cross, dot, norm, scale, sub, triple_product, Halfspace, Point};
use crate::error::{Error, Result};

/// Visibility tolerance relative to the extent of the point cloud
const RELATIVE_TOLERANCE: f64 = 1e-10;

/// Triangular hull facet with an outward unit normal
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    /// Indices into the hull's point array
    pub vertices: [usize; 3],

    /// Outward unit normal
    pub normal: Point,

    /// Plane offset: `normal · x + offset = 0` on the facet
    pub offset: f64,
}

impl Facet {
    /// Build the facet through three points, oriented away from `interior`
    fn through(points: &[Point], vertices: [usize; 3], interior: &Point) -> Option<Self> {
        let [a, b, c] = vertices;
        let raw = cross(
            &sub(&points[b], &points[a]),
            &sub(&points[c], &points[a]),
        );
        let length = norm(&raw);
        if length == 0.0 || !length.is_finite() {
            return None;
        }

        let mut normal = scale(&raw, 1.0 / length);
        let mut vertices = vertices;
        if dot(&normal, &sub(interior, &points[a])) > 0.0 {
            normal = scale(&normal, -1.0);
            vertices.swap(1, 2);
        }

        Some(Self {
            vertices,
            normal,
            offset: -dot(&normal, &points[a]),
        })
    }

    /// Signed distance of `point` from the facet plane (positive outside)
    #[inline]
    pub fn signed_distance(&self, point: &Point) -> f64 {
        dot(&self.normal, point) + self.offset
    }

    /// Facet plane as a half-space row `[normal | offset]`
    pub fn equation(&self) -> Halfspace {
        [self.normal[0], self.normal[1], self.normal[2], self.offset]
    }
}

/// Convex hull of a 3D point set
#[derive(Debug, Clone)]
pub struct ConvexHull {
    points: Vec<Point>,
    facets: Vec<Facet>,
    vertices: Vec<usize>,
    volume: f64,
}

impl ConvexHull {
    /// Build the hull of `points`
    ///
    /// Fails with [`Error::DegenerateGeometry`] when fewer than four points are
    /// given or when the points do not span three dimensions.
    pub fn new(points: &[Point]) -> Result<Self> {
        if points.len() < 4 {
            return Err(Error::degenerate(
                "convex hull",
                format!("{} points, at least 4 required", points.len()),
            ));
        }
        if points.iter().flatten().any(|c| !c.is_finite()) {
            return Err(Error::degenerate("convex hull", "non-finite coordinate"));
        }

        let eps = RELATIVE_TOLERANCE * extent(points);
        let simplex = initial_simplex(points, eps)?;
        let interior = scale(
            &simplex
                .iter()
                .fold([0.0; 3], |acc, &i| add(&acc, &points[i])),
            0.25,
        );

        let [i0, i1, i2, i3] = simplex;
        let mut facets = Vec::with_capacity(points.len() * 2);
        for face in [[i0, i1, i2], [i0, i1, i3], [i0, i2, i3], [i1, i2, i3]] {
            facets.push(
                Facet::through(points, face, &interior)
                    .ok_or_else(|| Error::degenerate("convex hull", "flat initial simplex"))?,
            );
        }

        for (idx, point) in points.iter().enumerate() {
            if simplex.contains(&idx) {
                continue;
            }

            let visible: Vec<bool> = facets
                .iter()
                .map(|f| f.signed_distance(point) > eps)
                .collect();
            if !visible.iter().any(|&v| v) {
                continue;
            }

            let horizon = horizon_edges(&facets, &visible);

            let mut kept: Vec<Facet> = facets
                .into_iter()
                .zip(&visible)
                .filter(|(_, v)| !**v)
                .map(|(f, _)| f)
                .collect();

            for (u, v) in horizon {
                let facet = Facet::through(points, [u, v, idx], &interior).ok_or_else(|| {
                    Error::degenerate("convex hull", "collapsed facet while adding point")
                })?;
                kept.push(facet);
            }
            facets = kept;
        }

        let vertices: Vec<usize> = facets
            .iter()
            .flat_map(|f| f.vertices)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let volume = facets
            .iter()
            .map(|f| {
                let [a, b, c] = f.vertices;
                triple_product(&interior, &points[a], &points[b], &points[c]).abs() / 6.0
            })
            .sum();

        Ok(Self {
            points: points.to_vec(),
            facets,
            vertices,
            volume,
        })
    }

    /// All input points, including those strictly inside the hull
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Indices of the points that lie on the hull boundary
    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Facet equations `[normal | offset]`, one row per facet
    pub fn equations(&self) -> Vec<Halfspace> {
        self.facets.iter().map(Facet::equation).collect()
    }

    /// Volumetric centroid of the hull
    ///
    /// The hull is split into tetrahedra that share the first hull vertex as
    /// apex, one per facet not incident to it. The centroid is the
    /// volume-weighted sum of the tetrahedron centroids over the hull volume.
    pub fn centroid(&self) -> Point {
        let anchor_idx = self.vertices[0];
        let anchor = self.points[anchor_idx];

        let weighted = self
            .facets
            .iter()
            .filter(|f| !f.vertices.contains(&anchor_idx))
            .fold([0.0; 3], |acc, f| {
                let [a, b, c] = f.vertices.map(|i| self.points[i]);
                let volume = triple_product(&anchor, &a, &b, &c).abs() / 6.0;
                let center = scale(&add(&add(&anchor, &a), &add(&b, &c)), 0.25);
                add(&acc, &scale(&center, volume))
            });

        scale(&weighted, 1.0 / self.volume)
    }

    /// True when `point` is inside or on the hull, within `tolerance`
    pub fn contains(&self, point: &Point, tolerance: f64) -> bool {
        self.facets
            .iter()
            .all(|f| f.signed_distance(point) <= tolerance)
    }
}

/// Diagonal of the axis-aligned bounding box
fn extent(points: &[Point]) -> f64 {
    let mut lo = [f64::INFINITY; 3];
    let mut hi = [f64::NEG_INFINITY; 3];
    for p in points {
        for k in 0..3 {
            lo[k] = lo[k].min(p[k]);
            hi[k] = hi[k].max(p[k]);
        }
    }
    norm(&sub(&hi, &lo))
}

/// Pick four affinely independent points spanning as much volume as possible
fn initial_simplex(points: &[Point], eps: f64) -> Result<[usize; 4]> {
    let farthest = |score: &dyn Fn(&Point) -> f64| -> (usize, f64) {
        points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, score(p)))
            .fold((0, f64::NEG_INFINITY), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            })
    };

    let (i0, _) = farthest(&|p: &Point| -p[0]);
    let p0 = points[i0];

    let (i1, d1) = farthest(&|p: &Point| norm(&sub(p, &p0)));
    if d1 <= eps {
        return Err(Error::degenerate("convex hull", "all points coincide"));
    }
    let axis = scale(&sub(&points[i1], &p0), 1.0 / d1);

    let (i2, d2) = farthest(&|p: &Point| norm(&cross(&sub(p, &p0), &axis)));
    if d2 <= eps {
        return Err(Error::degenerate("convex hull", "points are collinear"));
    }
    let plane = cross(&sub(&points[i1], &p0), &sub(&points[i2], &p0));
    let plane = scale(&plane, 1.0 / norm(&plane));

    let (i3, d3) = farthest(&|p: &Point| dot(&plane, &sub(p, &p0)).abs());
    if d3 <= eps {
        return Err(Error::degenerate("convex hull", "points are coplanar"));
    }

    Ok([i0, i1, i2, i3])
}

/// Edges bounding the visible region, in the order they are first met
fn horizon_edges(facets: &[Facet], visible: &[bool]) -> Vec<(usize, usize)> {
    let key = |u: usize, v: usize| if u < v { (u, v) } else { (v, u) };

    let mut counts: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    let mut ordered = Vec::new();
    for (facet, _) in facets.iter().zip(visible).filter(|(_, v)| **v) {
        let [a, b, c] = facet.vertices;
        for (u, v) in [(a, b), (b, c), (c, a)] {
            let count = counts.entry(key(u, v)).or_insert(0);
            if *count == 0 {
                ordered.push((u, v));
            }
            *count += 1;
        }
    }

    ordered
        .into_iter()
        .filter(|&(u, v)| counts[&key(u, v)] == 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mean_point;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn unit_cube() -> Vec<Point> {
        let mut points = Vec::new();
        for x in [0.0, 1.0] {
            for y in [0.0, 1.0] {
                for z in [0.0, 1.0] {
                    points.push([x, y, z]);
                }
            }
        }
        points
    }

    fn regular_tetrahedron() -> Vec<Point> {
        vec![
            [1.0, 1.0, 1.0],
            [1.0, -1.0, -1.0],
            [-1.0, 1.0, -1.0],
            [-1.0, -1.0, 1.0],
        ]
    }

    #[test]
    fn cube_volume_and_vertices() {
        let hull = ConvexHull::new(&unit_cube()).unwrap();
        assert_relative_eq!(hull.volume(), 1.0, epsilon = 1e-12);
        assert_eq!(hull.vertices().len(), 8);
        assert_eq!(hull.facets().len(), 12);
    }

    #[test]
    fn interior_and_duplicate_points_are_not_vertices() {
        let mut points = unit_cube();
        points.push([0.5, 0.5, 0.5]);
        points.push([0.25, 0.75, 0.5]);
        points.push([1.0, 1.0, 1.0]);
        let hull = ConvexHull::new(&points).unwrap();
        assert_relative_eq!(hull.volume(), 1.0, epsilon = 1e-12);
        assert!(!hull.vertices().contains(&8));
        assert!(!hull.vertices().contains(&9));
        assert_eq!(hull.vertices().len(), 8);
    }

    #[test]
    fn normals_point_outward() {
        let hull = ConvexHull::new(&unit_cube()).unwrap();
        let center = [0.5, 0.5, 0.5];
        for facet in hull.facets() {
            assert!(facet.signed_distance(&center) < 0.0);
            assert_relative_eq!(norm(&facet.normal), 1.0, epsilon = 1e-12);
        }
        for point in hull.points() {
            assert!(hull.contains(point, 1e-9));
        }
        assert!(!hull.contains(&[1.5, 0.5, 0.5], 1e-9));
    }

    #[test]
    fn tetrahedron_centroid_equals_vertex_mean() {
        let points = regular_tetrahedron();
        let hull = ConvexHull::new(&points).unwrap();
        let centroid = hull.centroid();
        let mean = mean_point(&points);
        for k in 0..3 {
            assert_abs_diff_eq!(centroid[k], mean[k], epsilon = 1e-12);
        }
        // edge 2√2: V = a³ / (6√2)
        let a: f64 = 8.0_f64.sqrt();
        assert_relative_eq!(hull.volume(), a.powi(3) / (6.0 * 2.0_f64.sqrt()), epsilon = 1e-12);
    }

    #[test]
    fn centroid_ignores_uneven_vertex_density() {
        // Crowding one corner of the cube with extra boundary points must not
        // drag the volumetric centroid toward it.
        let mut points = unit_cube();
        for i in 1..10 {
            let t = i as f64 / 10.0;
            points.push([t, 0.0, 0.0]);
            points.push([0.0, t, 0.0]);
        }
        let hull = ConvexHull::new(&points).unwrap();
        let centroid = hull.centroid();
        for k in 0..3 {
            assert_abs_diff_eq!(centroid[k], 0.5, epsilon = 1e-9);
        }
        let vertex_mean = mean_point(&points);
        assert!(vertex_mean[0] < 0.45);
    }

    #[test]
    fn too_few_points_is_degenerate() {
        let err = ConvexHull::new(&regular_tetrahedron()[..3]).unwrap_err();
        assert!(err.is_degenerate_geometry());
    }

    #[test]
    fn coplanar_points_are_degenerate() {
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.5, 0.3, 0.0],
        ];
        let err = ConvexHull::new(&points).unwrap_err();
        assert!(err.is_degenerate_geometry());
    }

    #[test]
    fn sphere_sample_hull_is_closed() {
        // Fibonacci sphere: every point is a vertex and the surface closes.
        let n = 60;
        let golden = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
        let points: Vec<Point> = (0..n)
            .map(|i| {
                let y = 1.0 - 2.0 * (i as f64 + 0.5) / n as f64;
                let r = (1.0 - y * y).sqrt();
                let theta = golden * i as f64;
                [r * theta.cos(), y, r * theta.sin()]
            })
            .collect();
        let hull = ConvexHull::new(&points).unwrap();
        assert_eq!(hull.vertices().len(), n);
        // Euler: a closed triangulated sphere has 2V - 4 faces
        assert_eq!(hull.facets().len(), 2 * n - 4);
        assert!(hull.volume() < 4.0 / 3.0 * std::f64::consts::PI);
        assert!(hull.volume() > 3.5);
    }
}
