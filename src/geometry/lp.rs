//! Chebyshev center of a half-space system
//!
//! The largest ball inside `{x : n_i · x + d_i <= 0}` solves
//!
//! ```text
//! maximize r  subject to  n_i · x + |n_i| r <= -d_i
//! ```
//!
//! with `x` and `r` free. Writing `x = x⁺ - x⁻` and `r = r' + r₀`, where
//! `r₀ = min(0, min_i -d_i / |n_i|)`, makes every right-hand side
//! non-negative, so the slack basis is feasible and a single simplex phase
//! suffices. `(0, r₀)` is always feasible, so requiring `r' >= 0` cannot cut
//! off the optimum.

use ndarray::Array2;

use super::{Halfspace, Point};
use crate::error::{Error, Result};

const PIVOT_TOLERANCE: f64 = 1e-12;
const MAX_ITERATIONS: usize = 10_000;

/// Columns for x⁺ (3), x⁻ (3) and r'
const STRUCTURAL: usize = 7;
const RADIUS_COLUMN: usize = 6;

/// Center and radius of the largest inscribed ball
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChebyshevBall {
    pub center: Point,
    pub radius: f64,
}

/// Solve the Chebyshev-center linear program for `halfspaces`
///
/// A negative radius means the half-spaces have no common point; the value
/// then measures how far apart the constraints are.
pub fn chebyshev_center(halfspaces: &[Halfspace]) -> Result<ChebyshevBall> {
    if halfspaces.is_empty() {
        return Err(Error::linear_program("no half-spaces"));
    }

    let m = halfspaces.len();
    let norms: Vec<f64> = halfspaces
        .iter()
        .map(|h| (h[0] * h[0] + h[1] * h[1] + h[2] * h[2]).sqrt())
        .collect();
    if let Some(row) = norms.iter().position(|&n| n == 0.0 || !n.is_finite()) {
        return Err(Error::linear_program(format!(
            "half-space {row} has no usable normal"
        )));
    }

    let radius_shift = halfspaces
        .iter()
        .zip(&norms)
        .map(|(h, n)| -h[3] / n)
        .fold(0.0_f64, f64::min);

    let cols = STRUCTURAL + m + 1;
    let rhs = cols - 1;
    let mut tableau = Array2::<f64>::zeros((m + 1, cols));
    let mut basis: Vec<usize> = (STRUCTURAL..STRUCTURAL + m).collect();

    for (i, (h, &n)) in halfspaces.iter().zip(&norms).enumerate() {
        for k in 0..3 {
            tableau[[i, k]] = h[k];
            tableau[[i, k + 3]] = -h[k];
        }
        tableau[[i, RADIUS_COLUMN]] = n;
        tableau[[i, STRUCTURAL + i]] = 1.0;
        tableau[[i, rhs]] = (-h[3] - n * radius_shift).max(0.0);
    }
    tableau[[m, RADIUS_COLUMN]] = -1.0;

    let mut iterations = 0;
    loop {
        // Bland's rule: lowest-index improving column
        let Some(entering) = (0..rhs).find(|&j| tableau[[m, j]] < -PIVOT_TOLERANCE) else {
            break;
        };

        let mut leaving: Option<(usize, f64)> = None;
        for i in 0..m {
            let a = tableau[[i, entering]];
            if a <= PIVOT_TOLERANCE {
                continue;
            }
            let ratio = tableau[[i, rhs]] / a;
            leaving = match leaving {
                None => Some((i, ratio)),
                Some((best, best_ratio)) => {
                    if ratio < best_ratio - PIVOT_TOLERANCE
                        || (ratio <= best_ratio + PIVOT_TOLERANCE && basis[i] < basis[best])
                    {
                        Some((i, ratio))
                    } else {
                        Some((best, best_ratio))
                    }
                }
            };
        }

        let Some((pivot_row, _)) = leaving else {
            return Err(Error::linear_program("objective is unbounded"));
        };

        pivot(&mut tableau, pivot_row, entering);
        basis[pivot_row] = entering;

        iterations += 1;
        if iterations >= MAX_ITERATIONS {
            return Err(Error::linear_program(format!(
                "no optimum after {MAX_ITERATIONS} pivots"
            )));
        }
    }

    let mut values = [0.0; STRUCTURAL];
    for (i, &var) in basis.iter().enumerate() {
        if var < STRUCTURAL {
            values[var] = tableau[[i, rhs]];
        }
    }

    Ok(ChebyshevBall {
        center: [
            values[0] - values[3],
            values[1] - values[4],
            values[2] - values[5],
        ],
        radius: values[RADIUS_COLUMN] + radius_shift,
    })
}

fn pivot(tableau: &mut Array2<f64>, row: usize, col: usize) {
    let pivot = tableau[[row, col]];
    tableau.row_mut(row).mapv_inplace(|v| v / pivot);
    let pivot_row = tableau.row(row).to_owned();

    for i in 0..tableau.nrows() {
        if i == row {
            continue;
        }
        let factor = tableau[[i, col]];
        if factor == 0.0 {
            continue;
        }
        tableau
            .row_mut(i)
            .zip_mut_with(&pivot_row, |v, &p| *v -= factor * p);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ConvexHull;
    use approx::assert_abs_diff_eq;

    fn box_halfspaces(lo: Point, hi: Point) -> Vec<Halfspace> {
        vec![
            [1.0, 0.0, 0.0, -hi[0]],
            [-1.0, 0.0, 0.0, lo[0]],
            [0.0, 1.0, 0.0, -hi[1]],
            [0.0, -1.0, 0.0, lo[1]],
            [0.0, 0.0, 1.0, -hi[2]],
            [0.0, 0.0, -1.0, lo[2]],
        ]
    }

    #[test]
    fn cube_center_and_inradius() {
        let ball = chebyshev_center(&box_halfspaces([0.0; 3], [2.0; 3])).unwrap();
        assert_abs_diff_eq!(ball.radius, 1.0, epsilon = 1e-9);
        for k in 0..3 {
            assert_abs_diff_eq!(ball.center[k], 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn box_away_from_origin() {
        // Origin lies outside the box, so right-hand sides start negative.
        let ball =
            chebyshev_center(&box_halfspaces([10.0, -20.0, 5.0], [14.0, -18.0, 11.0])).unwrap();
        assert_abs_diff_eq!(ball.radius, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(ball.center[1], -19.0, epsilon = 1e-9);
    }

    #[test]
    fn disjoint_boxes_have_negative_radius() {
        let mut halfspaces = box_halfspaces([0.0; 3], [1.0; 3]);
        halfspaces.extend(box_halfspaces([3.0, 0.0, 0.0], [4.0, 1.0, 1.0]));
        let ball = chebyshev_center(&halfspaces).unwrap();
        assert!(ball.radius < 0.0);
    }

    #[test]
    fn hull_equations_feed_the_program() {
        let points = vec![
            [0.0, 0.0, 0.0],
            [6.0, 0.0, 0.0],
            [0.0, 6.0, 0.0],
            [0.0, 0.0, 6.0],
        ];
        let hull = ConvexHull::new(&points).unwrap();
        let ball = chebyshev_center(&hull.equations()).unwrap();
        // inradius of the corner tetrahedron with legs a: a / (3 + √3)
        assert_abs_diff_eq!(ball.radius, 6.0 / (3.0 + 3.0_f64.sqrt()), epsilon = 1e-9);
        assert!(hull.contains(&ball.center, 1e-9));
    }

    #[test]
    fn zero_normal_is_rejected() {
        let err = chebyshev_center(&[[0.0, 0.0, 0.0, 1.0]]).unwrap_err();
        assert!(matches!(err, Error::LinearProgram { .. }));
    }
}
