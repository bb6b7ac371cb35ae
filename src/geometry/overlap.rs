//! Volumetric overlap between two convex hulls

use super::{chebyshev_center, halfspace_intersection, ConvexHull};
use crate::error::Result;

/// Inscribed-ball radius at or below which two hulls are treated as disjoint
///
/// The LP optimum is only approximate, so touching or disjoint hulls can come
/// back with a tiny positive radius.
pub const INTERSECTION_RADIUS_FLOOR: f64 = 1e-5;

/// Jaccard overlap `|A ∩ B| / |A ∪ B|` of two hulls
///
/// Returns 0 without building the intersection when the combined half-space
/// system has no interior.
pub fn volumetric_overlap(a: &ConvexHull, b: &ConvexHull) -> Result<f64> {
    let mut halfspaces = a.equations();
    halfspaces.extend(b.equations());

    let ball = chebyshev_center(&halfspaces)?;
    if ball.radius <= INTERSECTION_RADIUS_FLOOR {
        log::debug!(
            "Hulls do not intersect (inscribed radius {:.3e})",
            ball.radius
        );
        return Ok(0.0);
    }

    let vertices = halfspace_intersection(&halfspaces, &ball.center)?;
    let intersection = ConvexHull::new(&vertices)?;

    Ok(jaccard(a.volume(), b.volume(), intersection.volume()))
}

#[inline]
fn jaccard(volume_a: f64, volume_b: f64, intersection: f64) -> f64 {
    intersection / (volume_a + volume_b - intersection)
}
