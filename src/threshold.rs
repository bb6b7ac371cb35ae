//! ROC analysis for choosing a probability threshold
//!
//! Scores and labels are pooled over every atom of a dataset. The chosen
//! threshold maximises the geometric mean of sensitivity and specificity on
//! the positive-class curve. [`RocReport`] adds the negative-class curve and
//! the micro and macro averages over both classes.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::ProbabilityField;

/// Receiver operating characteristic curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,

    /// Decreasing; the first entry is `+inf`
    pub thresholds: Vec<f64>,
}

impl RocCurve {
    /// Build the curve with one point per distinct score, highest first
    pub fn new(scores: &[f64], labels: &[bool]) -> Result<Self> {
        if scores.len() != labels.len() {
            return Err(Error::invalid_input(format!(
                "{} scores but {} labels",
                scores.len(),
                labels.len()
            )));
        }
        if let Some(bad) = scores.iter().find(|s| s.is_nan()) {
            return Err(Error::invalid_input(format!("score {} is not a number", bad)));
        }

        let positives = labels.iter().filter(|&&l| l).count();
        let negatives = labels.len() - positives;
        if positives == 0 || negatives == 0 {
            return Err(Error::invalid_input(
                "ROC analysis needs both positive and negative labels",
            ));
        }

        let ordered = scores
            .iter()
            .zip(labels)
            .sorted_by(|a, b| b.0.total_cmp(a.0))
            .collect_vec();

        let mut curve = Self {
            fpr: vec![0.0],
            tpr: vec![0.0],
            thresholds: vec![f64::INFINITY],
        };
        let (mut tp, mut fp) = (0usize, 0usize);
        for (i, &(&score, &label)) in ordered.iter().enumerate() {
            if label {
                tp += 1;
            } else {
                fp += 1;
            }
            let last_of_score = ordered.get(i + 1).map_or(true, |next| *next.0 != score);
            if last_of_score {
                curve.tpr.push(tp as f64 / positives as f64);
                curve.fpr.push(fp as f64 / negatives as f64);
                curve.thresholds.push(score);
            }
        }

        Ok(curve)
    }

    /// Area under the curve by the trapezoidal rule
    pub fn auc(&self) -> f64 {
        trapezoid(&self.fpr, &self.tpr)
    }

    /// Linear interpolation of the true positive rate at `fpr`
    ///
    /// At a vertical step the upper point is used.
    pub fn tpr_at(&self, fpr: f64) -> f64 {
        let j = self.fpr.partition_point(|&x| x <= fpr);
        if j == 0 {
            return self.tpr[0];
        }
        if j == self.fpr.len() {
            return self.tpr[j - 1];
        }
        let (x0, y0) = (self.fpr[j - 1], self.tpr[j - 1]);
        let (x1, y1) = (self.fpr[j], self.tpr[j]);
        y0 + (y1 - y0) * (fpr - x0) / (x1 - x0)
    }

    /// Threshold with the largest `sqrt(tpr * (1 - fpr))`; ties keep the higher threshold
    pub fn optimal_threshold(&self) -> f64 {
        let mut best = 0;
        let mut best_gmean = f64::NEG_INFINITY;
        for (i, (tpr, fpr)) in self.tpr.iter().zip(&self.fpr).enumerate() {
            let gmean = (tpr * (1.0 - fpr)).sqrt();
            if gmean > best_gmean {
                best_gmean = gmean;
                best = i;
            }
        }
        self.thresholds[best]
    }
}

fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y)
        .tuple_windows()
        .map(|((x0, y0), (x1, y1))| (x1 - x0) * (y0 + y1) / 2.0)
        .sum()
}

/// Per-class and averaged ROC summaries of a two-class dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RocReport {
    /// Curve of the binding class; thresholds are chosen on it
    pub positive: RocCurve,

    /// Curve of the non-binding class
    pub negative: RocCurve,

    /// AUC of both classes' scores and labels pooled into one curve
    pub micro_auc: f64,

    /// AUC of the class curves averaged over their joint false positive rates
    pub macro_auc: f64,
}

impl RocReport {
    /// Pool the atoms of several structures
    pub fn from_fields<'a, I>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a ProbabilityField, &'a [bool])>,
    {
        let mut negative_scores = Vec::new();
        let mut positive_scores = Vec::new();
        let mut labels = Vec::new();
        for (field, field_labels) in fields {
            let values = field.values();
            negative_scores.extend(values.column(0).iter().copied());
            positive_scores.extend(values.column(1).iter().copied());
            labels.extend_from_slice(field_labels);
        }

        let positive = RocCurve::new(&positive_scores, &labels)?;
        let negative_labels: Vec<bool> = labels.iter().map(|&l| !l).collect();
        let negative = RocCurve::new(&negative_scores, &negative_labels)?;

        let micro_scores: Vec<f64> = negative_scores
            .iter()
            .interleave(&positive_scores)
            .copied()
            .collect();
        let micro_labels: Vec<bool> = negative_labels
            .iter()
            .interleave(&labels)
            .copied()
            .collect();
        let micro_auc = RocCurve::new(&micro_scores, &micro_labels)?.auc();

        let all_fpr: Vec<f64> = negative
            .fpr
            .iter()
            .chain(&positive.fpr)
            .copied()
            .sorted_by(|a, b| a.total_cmp(b))
            .dedup()
            .collect();
        let mean_tpr: Vec<f64> = all_fpr
            .iter()
            .map(|&x| (negative.tpr_at(x) + positive.tpr_at(x)) / 2.0)
            .collect();
        let macro_auc = trapezoid(&all_fpr, &mean_tpr);

        Ok(Self {
            positive,
            negative,
            micro_auc,
            macro_auc,
        })
    }

    pub fn optimal_threshold(&self) -> f64 {
        self.positive.optimal_threshold()
    }
}
