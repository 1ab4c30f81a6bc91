//! Threshold-swept confusion matrices for a single entity.
//!
//! Given one score vector, one binary truth vector and an array of
//! thresholds, produce one `(TN, FP, FN, TP)` tuple per threshold. A position
//! is predicted positive at threshold `tau` when `score > tau`, so a zero
//! score is never positive for any `tau` in `[0, 1]`. Counts may be weighted
//! per position; unit weights give plain counts.

use funceval_core::{EvalError, Result, SparseVector};

/// Confusion counts at one threshold.
///
/// With unit weights every field is a non-negative integer stored as `f64`;
/// with per-term weights the fields are weighted sums. The four fields
/// always add up to the total weight of the vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfusionTuple {
    /// True negatives.
    pub tn: f64,
    /// False positives.
    pub fp: f64,
    /// False negatives.
    pub fn_: f64,
    /// True positives.
    pub tp: f64,
}

impl ConfusionTuple {
    /// Build from counts in `(TN, FP, FN, TP)` order.
    pub fn new(tn: f64, fp: f64, fn_: f64, tp: f64) -> Self {
        Self { tn, fp, fn_, tp }
    }

    /// `TN + FP + FN + TP`.
    pub fn total(&self) -> f64 {
        self.tn + self.fp + self.fn_ + self.tp
    }

    /// Component-wise sum.
    pub fn add(&self, other: &ConfusionTuple) -> ConfusionTuple {
        ConfusionTuple::new(
            self.tn + other.tn,
            self.fp + other.fp,
            self.fn_ + other.fn_,
            self.tp + other.tp,
        )
    }

    /// Component-wise scaling.
    pub fn scale(&self, k: f64) -> ConfusionTuple {
        ConfusionTuple::new(self.tn * k, self.fp * k, self.fn_ * k, self.tp * k)
    }

    /// `TP / (TP + FP)`; NaN when nothing is predicted positive.
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// `TP / (TP + FN)`; NaN when there are no positives.
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    /// `FP / (FP + TN)`; NaN when there are no negatives.
    pub fn false_positive_rate(&self) -> f64 {
        ratio(self.fp, self.fp + self.tn)
    }

    /// `(TP + TN) / total`; NaN for an empty tuple.
    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }
}

/// `num / den`, or NaN when `den` is not positive.
pub(crate) fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        f64::NAN
    }
}

/// Check that every threshold is finite and inside `[0, 1]`.
pub fn validate_thresholds(taus: &[f64]) -> Result<()> {
    if taus.is_empty() {
        return Err(EvalError::InputCount("threshold array is empty".into()));
    }
    for (i, &t) in taus.iter().enumerate() {
        if !(0.0..=1.0).contains(&t) {
            return Err(EvalError::InputValidation(format!(
                "threshold at index {i} is outside [0, 1]: {t}"
            )));
        }
    }
    Ok(())
}

/// Confusion tuples for a dense score vector against a dense truth vector.
///
/// # Errors
///
/// Returns an error if the vectors differ in length, a score is not finite,
/// or a threshold is out of range.
pub fn confmat(scores: &[f64], truth: &[bool], taus: &[f64]) -> Result<Vec<ConfusionTuple>> {
    if scores.len() != truth.len() {
        return Err(EvalError::InputValidation(format!(
            "scores length {} != truth length {}",
            scores.len(),
            truth.len()
        )));
    }
    if let Some(s) = scores.iter().find(|s| !s.is_finite()) {
        return Err(EvalError::InputValidation(format!(
            "non-finite score {s}"
        )));
    }
    validate_thresholds(taus)?;

    let positive = truth.iter().filter(|&&t| t).count() as f64;
    let entries: Vec<Entry> = scores
        .iter()
        .zip(truth)
        .filter(|(&s, _)| s > 0.0)
        .map(|(&score, &t)| Entry {
            score,
            weight: 1.0,
            hit: if t { 1.0 } else { 0.0 },
        })
        .collect();
    Ok(sweep(entries, scores.len() as f64, positive, taus))
}

/// Confusion tuples for a sparse score lane against a sparse truth lane.
///
/// Truth positions are those with a stored value `> 0`. With `weights`
/// every position contributes its weight instead of 1.
///
/// # Errors
///
/// Returns an error if the lanes or the weight vector differ in length, or
/// a threshold is out of range.
pub fn confmat_sparse(
    scores: SparseVector<'_>,
    truth: SparseVector<'_>,
    weights: Option<&[f64]>,
    taus: &[f64],
) -> Result<Vec<ConfusionTuple>> {
    if scores.len != truth.len {
        return Err(EvalError::InputValidation(format!(
            "scores length {} != truth length {}",
            scores.len, truth.len
        )));
    }
    let total = match weights {
        Some(w) if w.len() != scores.len => {
            return Err(EvalError::InputValidation(format!(
                "weights length {} != vector length {}",
                w.len(),
                scores.len
            )));
        }
        Some(w) => w.iter().sum(),
        None => scores.len as f64,
    };
    validate_thresholds(taus)?;
    Ok(confmat_lane(scores, truth, weights, total, taus))
}

/// Unchecked core of [`confmat_sparse`]: lengths and thresholds are trusted,
/// and `total` is the summed weight of the whole lane.
pub(crate) fn confmat_lane(
    scores: SparseVector<'_>,
    truth: SparseVector<'_>,
    weights: Option<&[f64]>,
    total: f64,
    taus: &[f64],
) -> Vec<ConfusionTuple> {
    let weight = |i: usize| weights.map_or(1.0, |w| w[i]);

    let positive: f64 = truth
        .iter()
        .filter(|&(_, v)| v > 0.0)
        .map(|(i, _)| weight(i))
        .sum();

    // Merge-walk the two ascending index lists.
    let mut entries = Vec::with_capacity(scores.nnz());
    let mut truth_iter = truth.iter().peekable();
    for (i, score) in scores.iter() {
        while truth_iter.peek().map_or(false, |&(j, _)| j < i) {
            truth_iter.next();
        }
        if score <= 0.0 {
            continue;
        }
        let is_true = matches!(truth_iter.peek(), Some(&(j, v)) if j == i && v > 0.0);
        let w = weight(i);
        entries.push(Entry {
            score,
            weight: w,
            hit: if is_true { w } else { 0.0 },
        });
    }

    sweep(entries, total, positive, taus)
}

/// A predicted-positive candidate: a stored score above zero.
struct Entry {
    score: f64,
    weight: f64,
    /// `weight` if the position is a truth positive, else 0.
    hit: f64,
}

/// Sort candidates by score once, then answer every threshold with a binary
/// search into suffix sums.
fn sweep(mut entries: Vec<Entry>, total: f64, positive: f64, taus: &[f64]) -> Vec<ConfusionTuple> {
    entries.sort_unstable_by(|a, b| a.score.total_cmp(&b.score));

    let m = entries.len();
    let mut suffix_weight = vec![0.0; m + 1];
    let mut suffix_hit = vec![0.0; m + 1];
    for i in (0..m).rev() {
        suffix_weight[i] = suffix_weight[i + 1] + entries[i].weight;
        suffix_hit[i] = suffix_hit[i + 1] + entries[i].hit;
    }

    taus.iter()
        .map(|&tau| {
            let first = entries.partition_point(|e| e.score <= tau);
            let predicted = suffix_weight[first];
            let tp = suffix_hit[first];
            let fp = (predicted - tp).max(0.0);
            let fn_ = (positive - tp).max(0.0);
            let tn = (total - positive - fp).max(0.0);
            ConfusionTuple::new(tn, fp, fn_, tp)
        })
        .collect()
}
