//! Vertices of a half-space intersection
//!
//! With an interior point `c`, each half-space `n · x + d <= 0` becomes
//! `n · y <= h` in coordinates `y = x - c`, where `h = -(n · c + d) > 0`.
//! The polar (dual) points `n / h` have a convex hull whose facets map
//! one-to-one onto the vertices of the intersection: a dual facet
//! `m · q + e = 0` gives the vertex `y = -m / e`.

use super::{add, scale, ConvexHull, Halfspace, Point};
use crate::error::{Error, Result};

/// Interior slack below which the seed point is treated as on the boundary
const MIN_INTERIOR_SLACK: f64 = 1e-12;

/// Vertices of the polytope `{x : n_i · x + d_i <= 0}`
///
/// `interior` must lie strictly inside every half-space, as the Chebyshev
/// center of a non-empty intersection does.
pub fn halfspace_intersection(halfspaces: &[Halfspace], interior: &Point) -> Result<Vec<Point>> {
    let mut dual = Vec::with_capacity(halfspaces.len());
    for (row, h) in halfspaces.iter().enumerate() {
        let slack = -(h[0] * interior[0] + h[1] * interior[1] + h[2] * interior[2] + h[3]);
        if slack <= MIN_INTERIOR_SLACK {
            return Err(Error::degenerate(
                "half-space intersection",
                format!("seed point is not interior to half-space {row} (slack {slack:.3e})"),
            ));
        }
        dual.push([h[0] / slack, h[1] / slack, h[2] / slack]);
    }

    let dual_hull = ConvexHull::new(&dual).map_err(|err| {
        Error::degenerate("half-space intersection", format!("unbounded or flat dual: {err}"))
    })?;

    Ok(dual_hull
        .facets()
        .iter()
        .map(|facet| add(&scale(&facet.normal, -1.0 / facet.offset), interior))
        .collect())
}
