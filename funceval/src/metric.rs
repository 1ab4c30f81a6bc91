//! Metric derivation from confusion tuples.
//!
//! Every metric is a pure function of one [`ConfusionTuple`]. Undefined
//! values (a ratio with a zero denominator, an F-measure with precision and
//! recall both zero) are NaN; macro averaging skips them.

use std::fmt;

use funceval_core::{EvalError, Result};

use crate::confmat::{ratio, ConfusionTuple};
use crate::result::Centric;

/// The closed set of metrics, each carrying only its own parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetricKind {
    /// `(precision, recall)`.
    PrecisionRecall,
    /// `(precision, recall)` on weighted counts.
    WeightedPrecisionRecall,
    /// F-beta of precision and recall.
    FMeasure {
        /// Weight of recall relative to precision.
        beta: f64,
    },
    /// F-beta on weighted counts.
    WeightedFMeasure {
        /// Weight of recall relative to precision.
        beta: f64,
    },
    /// `(sensitivity, 1 - specificity)`, the ROC coordinates.
    SensitivitySpecificity,
    /// `(TP + TN) / total`.
    Accuracy,
    /// `(remaining uncertainty, misinformation)`: the weighted mass of
    /// missed and of wrongly predicted terms.
    RemainingMisinformation {
        /// Divide both by the weighted size of the true annotation.
        normalized: bool,
    },
    /// `(RU^order + MI^order)^(1/order)`.
    SemanticDistance {
        /// Minkowski order; 2 is Euclidean.
        order: f64,
        /// Use normalized RU and MI.
        normalized: bool,
    },
}

impl MetricKind {
    /// Short name used in messages.
    pub fn name(&self) -> &'static str {
        match self {
            MetricKind::PrecisionRecall => "pr",
            MetricKind::WeightedPrecisionRecall => "wpr",
            MetricKind::FMeasure { .. } => "f",
            MetricKind::WeightedFMeasure { .. } => "wf",
            MetricKind::SensitivitySpecificity => "ss",
            MetricKind::Accuracy => "acc",
            MetricKind::RemainingMisinformation { normalized: false } => "rm",
            MetricKind::RemainingMisinformation { normalized: true } => "nrm",
            MetricKind::SemanticDistance {
                normalized: false, ..
            } => "sd",
            MetricKind::SemanticDistance {
                normalized: true, ..
            } => "nsd",
        }
    }

    /// Number of components per threshold.
    pub fn arity(&self) -> usize {
        match self {
            MetricKind::PrecisionRecall
            | MetricKind::WeightedPrecisionRecall
            | MetricKind::SensitivitySpecificity
            | MetricKind::RemainingMisinformation { .. } => 2,
            MetricKind::FMeasure { .. }
            | MetricKind::WeightedFMeasure { .. }
            | MetricKind::Accuracy
            | MetricKind::SemanticDistance { .. } => 1,
        }
    }

    /// Whether the metric needs term weights along the sequence axis.
    pub fn sequence_only(&self) -> bool {
        matches!(
            self,
            MetricKind::WeightedPrecisionRecall
                | MetricKind::WeightedFMeasure { .. }
                | MetricKind::RemainingMisinformation { .. }
                | MetricKind::SemanticDistance { .. }
        )
    }

    /// Which counts the metric reads: `Some(true)` for weighted
    /// sequence-centric counts, `Some(false)` for plain counts, `None` when
    /// either is meaningful.
    pub fn weighting(&self) -> Option<bool> {
        match self {
            MetricKind::PrecisionRecall | MetricKind::FMeasure { .. } => Some(false),
            MetricKind::SensitivitySpecificity | MetricKind::Accuracy => None,
            _ => Some(true),
        }
    }

    /// Check parameters and compatibility with `centric`, returning the
    /// metric unchanged when both hold.
    pub fn for_centric(self, centric: Centric) -> Result<Self> {
        if centric == Centric::Term && self.sequence_only() {
            return Err(EvalError::IncompatibleMetric {
                metric: self.name().into(),
                centric: centric.to_string(),
            });
        }
        match self {
            MetricKind::FMeasure { beta } | MetricKind::WeightedFMeasure { beta }
                if !(beta.is_finite() && beta > 0.0) =>
            {
                Err(EvalError::InputValidation(format!(
                    "beta must be a positive finite number, got {beta}"
                )))
            }
            MetricKind::SemanticDistance { order, .. } if !(order.is_finite() && order > 0.0) => {
                Err(EvalError::InputValidation(format!(
                    "order must be a positive finite number, got {order}"
                )))
            }
            _ => Ok(self),
        }
    }

    /// Evaluate on one tuple.
    pub fn compute(&self, t: &ConfusionTuple) -> MetricValue {
        match *self {
            MetricKind::PrecisionRecall | MetricKind::WeightedPrecisionRecall => {
                MetricValue::Pair([t.precision(), t.recall()])
            }
            MetricKind::FMeasure { beta } | MetricKind::WeightedFMeasure { beta } => {
                MetricValue::Scalar(f_beta(t.precision(), t.recall(), beta))
            }
            MetricKind::SensitivitySpecificity => {
                MetricValue::Pair([t.recall(), t.false_positive_rate()])
            }
            MetricKind::Accuracy => MetricValue::Scalar(t.accuracy()),
            MetricKind::RemainingMisinformation { normalized } => {
                let (ru, mi) = ru_mi(t, normalized);
                MetricValue::Pair([ru, mi])
            }
            MetricKind::SemanticDistance { order, normalized } => {
                let (ru, mi) = ru_mi(t, normalized);
                MetricValue::Scalar(semantic_distance(ru, mi, order))
            }
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The value of a metric at one threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MetricValue {
    /// Two-component metrics (precision/recall, RU/MI, ...).
    Pair([f64; 2]),
    /// Single-number metrics.
    Scalar(f64),
}

impl MetricValue {
    /// Components in order.
    pub fn as_slice(&self) -> &[f64] {
        match self {
            MetricValue::Pair(p) => &p[..],
            MetricValue::Scalar(s) => std::slice::from_ref(s),
        }
    }

    /// The value of a single-number metric.
    pub fn scalar(&self) -> Option<f64> {
        match self {
            MetricValue::Scalar(s) => Some(*s),
            MetricValue::Pair(_) => None,
        }
    }

    pub(crate) fn from_components(arity: usize, c: &[f64]) -> Self {
        if arity == 2 {
            MetricValue::Pair([c[0], c[1]])
        } else {
            MetricValue::Scalar(c[0])
        }
    }
}

/// An averaged metric, one value per threshold.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricCurve {
    /// Metric the values belong to.
    pub kind: MetricKind,
    /// Thresholds.
    pub tau: Vec<f64>,
    /// One value per threshold.
    pub values: Vec<MetricValue>,
}

impl MetricCurve {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Component `i` at every threshold; NaN where the value has fewer
    /// components.
    pub fn component(&self, i: usize) -> Vec<f64> {
        self.values
            .iter()
            .map(|v| v.as_slice().get(i).copied().unwrap_or(f64::NAN))
            .collect()
    }

    /// Every value of a single-number metric, or `None` for pairs.
    pub fn scalars(&self) -> Option<Vec<f64>> {
        self.values.iter().map(MetricValue::scalar).collect()
    }
}

/// Weighted harmonic mean of precision and recall.
///
/// NaN when either input is undefined or both are zero.
pub fn f_beta(precision: f64, recall: f64, beta: f64) -> f64 {
    if !(precision.is_finite() && recall.is_finite()) || precision + recall <= 0.0 {
        return f64::NAN;
    }
    let b2 = beta * beta;
    (1.0 + b2) * precision * recall / (b2 * precision + recall)
}

/// Minkowski combination of remaining uncertainty and misinformation.
pub fn semantic_distance(ru: f64, mi: f64, order: f64) -> f64 {
    if order == 2.0 {
        ru.hypot(mi)
    } else {
        (ru.powf(order) + mi.powf(order)).powf(1.0 / order)
    }
}

fn ru_mi(t: &ConfusionTuple, normalized: bool) -> (f64, f64) {
    if normalized {
        let size = t.tp + t.fn_;
        (ratio(t.fn_, size), ratio(t.fp, size))
    } else {
        (t.fn_, t.fp)
    }
}
