//! Per-atom class probabilities

use ndarray::{Array2, Axis};

use crate::error::{Error, Result};

/// Tolerance on `p_negative + p_positive == 1`
const ROW_SUM_TOLERANCE: f64 = 1e-3;

/// Two-column `[p_negative, p_positive]` table, one row per atom
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityField {
    values: Array2<f64>,
}

impl ProbabilityField {
    /// Wrap an `n x 2` array, checking that every row sums to one
    pub fn new(values: Array2<f64>) -> Result<Self> {
        if values.ncols() != 2 {
            return Err(Error::invalid_input(format!(
                "probability field needs 2 columns, got {}",
                values.ncols()
            )));
        }
        for (i, row) in values.axis_iter(Axis(0)).enumerate() {
            let sum = row[0] + row[1];
            if !((sum - 1.0).abs() <= ROW_SUM_TOLERANCE) {
                return Err(Error::invalid_input(format!(
                    "probability row {i} sums to {sum}"
                )));
            }
        }
        Ok(Self { values })
    }

    pub fn from_rows(rows: &[[f64; 2]]) -> Result<Self> {
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let values = Array2::from_shape_vec((rows.len(), 2), flat)
            .map_err(|e| Error::invalid_input(e.to_string()))?;
        Self::new(values)
    }

    /// Field from positive-class probabilities alone
    pub fn from_positive(positive: &[f64]) -> Result<Self> {
        let rows: Vec<[f64; 2]> = positive.iter().map(|&p| [1.0 - p, p]).collect();
        Self::from_rows(&rows)
    }

    /// One-hot field from ground-truth labels
    pub fn from_labels(labels: &[bool]) -> Self {
        let values = Array2::from_shape_fn((labels.len(), 2), |(i, j)| {
            if labels[i] == (j == 1) {
                1.0
            } else {
                0.0
            }
        });
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    /// Positive-class probability of atom `index`
    #[inline]
    pub fn positive(&self, index: usize) -> f64 {
        self.values[[index, 1]]
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Rows selected by `mask`, in their original order
    pub fn subset(&self, mask: &[bool]) -> Self {
        let keep: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(i, _)| i)
            .collect();
        Self {
            values: self.values.select(Axis(0), &keep),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn rows_must_sum_to_one() {
        assert!(ProbabilityField::new(array![[0.3, 0.7], [0.5, 0.5]]).is_ok());
        assert!(ProbabilityField::new(array![[0.3, 0.6]]).is_err());
        assert!(ProbabilityField::new(array![[0.2, 0.3, 0.5]]).is_err());
    }

    #[test]
    fn labels_become_one_hot_rows() {
        let field = ProbabilityField::from_labels(&[true, false]);
        assert_eq!(field.values(), &array![[0.0, 1.0], [1.0, 0.0]]);
        assert_eq!(field.positive(0), 1.0);
    }

    #[test]
    fn subset_selects_rows() {
        let field = ProbabilityField::from_positive(&[0.1, 0.9, 0.6]).unwrap();
        let sub = field.subset(&[false, true, true]);
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.positive(0), 0.9);
        assert_eq!(sub.positive(1), 0.6);
    }
}
