//! Curve-extremum extraction and curve summaries.
//!
//! A metric curve is scanned over the thresholds for its best point: the
//! maximum for F-measure-like metrics, the minimum for semantic distance.
//! Non-finite points are skipped, and ties go to the first (lowest)
//! threshold.

use funceval_core::{EvalError, Result};

use crate::average::metric_curve;
use crate::config::EvalConfig;
use crate::metric::{MetricCurve, MetricKind};
use crate::result::ConfusionResult;

/// A metric value and the threshold achieving it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CurvePoint {
    /// Best metric value; NaN when the curve has no finite point.
    pub value: f64,
    /// Threshold of the best value; NaN when the curve has no finite point.
    pub tau: f64,
}

/// Largest finite value of `values` and its threshold.
///
/// # Errors
///
/// [`EvalError::InputCount`] for an empty curve,
/// [`EvalError::ShapeMismatch`] when `values` and `taus` differ in length.
pub fn argmax_curve(values: &[f64], taus: &[f64]) -> Result<CurvePoint> {
    extremum(values, taus, |candidate, best| candidate > best)
}

/// Smallest finite value of `values` and its threshold.
///
/// # Errors
///
/// Same as [`argmax_curve`].
pub fn argmin_curve(values: &[f64], taus: &[f64]) -> Result<CurvePoint> {
    extremum(values, taus, |candidate, best| candidate < best)
}

fn extremum(values: &[f64], taus: &[f64], better: impl Fn(f64, f64) -> bool) -> Result<CurvePoint> {
    if values.len() != taus.len() {
        return Err(EvalError::ShapeMismatch {
            expected: taus.len(),
            found: values.len(),
        });
    }
    if values.is_empty() {
        return Err(EvalError::InputCount("curve has no points".into()));
    }

    let mut best: Option<CurvePoint> = None;
    for (&value, &tau) in values.iter().zip(taus) {
        if !value.is_finite() {
            continue;
        }
        match best {
            Some(b) if !better(value, b.value) => {}
            _ => best = Some(CurvePoint { value, tau }),
        }
    }
    Ok(best.unwrap_or(CurvePoint {
        value: f64::NAN,
        tau: f64::NAN,
    }))
}

fn scalar_extremum(
    result: &ConfusionResult,
    kind: MetricKind,
    config: &EvalConfig,
    maximize: bool,
) -> Result<CurvePoint> {
    config.validate()?;
    let curve = metric_curve(result, kind, config)?;
    let values = curve.scalars().ok_or_else(|| {
        EvalError::InputValidation(format!("metric {kind} does not produce a single value"))
    })?;
    if maximize {
        argmax_curve(&values, &curve.tau)
    } else {
        argmin_curve(&values, &curve.tau)
    }
}

/// Maximum F-measure (`config.beta`) over thresholds.
pub fn fmax(result: &ConfusionResult, config: &EvalConfig) -> Result<CurvePoint> {
    scalar_extremum(result, MetricKind::FMeasure { beta: config.beta }, config, true)
}

/// Maximum weighted F-measure over thresholds.
///
/// The result must be sequence-centric and built with the non-equal
/// `config.weight`; the same holds for [`smin`] and [`nsmin`].
pub fn wfmax(result: &ConfusionResult, config: &EvalConfig) -> Result<CurvePoint> {
    scalar_extremum(
        result,
        MetricKind::WeightedFMeasure { beta: config.beta },
        config,
        true,
    )
}

/// Minimum semantic distance of order `config.order` (sequence-centric only).
pub fn smin(result: &ConfusionResult, config: &EvalConfig) -> Result<CurvePoint> {
    let kind = MetricKind::SemanticDistance {
        order: config.order,
        normalized: false,
    };
    scalar_extremum(result, kind, config, false)
}

/// Minimum normalized semantic distance (sequence-centric only).
pub fn nsmin(result: &ConfusionResult, config: &EvalConfig) -> Result<CurvePoint> {
    let kind = MetricKind::SemanticDistance {
        order: config.order,
        normalized: true,
    };
    scalar_extremum(result, kind, config, false)
}

/// Area under a precision-recall curve by the trapezoidal rule.
///
/// Points with an undefined coordinate are dropped and the rest are taken in
/// order of increasing recall. Fewer than two points give 0.
///
/// # Errors
///
/// Returns an error if `curve` is not a (weighted) precision-recall curve.
pub fn pr_auc(curve: &MetricCurve) -> Result<f64> {
    if !matches!(
        curve.kind,
        MetricKind::PrecisionRecall | MetricKind::WeightedPrecisionRecall
    ) {
        return Err(EvalError::InputValidation(format!(
            "area under the curve needs a precision-recall curve, got {}",
            curve.kind
        )));
    }
    let mut points: Vec<(f64, f64)> = curve
        .component(1)
        .into_iter()
        .zip(curve.component(0))
        .filter(|(r, p)| r.is_finite() && p.is_finite())
        .collect();
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut auc = 0.0;
    for w in points.windows(2) {
        auc += (w[1].0 - w[0].0) * (w[1].1 + w[0].1) / 2.0;
    }
    Ok(auc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confmat::ConfusionTuple;
    use crate::metric::MetricValue;
    use crate::ontology::TermWeights;
    use crate::result::Centric;

    const TOL: f64 = 1e-12;

    #[test]
    fn flat_maximum_takes_first_threshold() {
        let taus = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let values = [0.2, 0.5, 0.9, 0.9, 0.9, 0.4];
        let best = argmax_curve(&values, &taus).unwrap();
        assert_eq!(best, CurvePoint { value: 0.9, tau: 0.3 });
    }

    #[test]
    fn minimum_skips_nan() {
        let taus = [0.0, 0.5, 1.0];
        let values = [f64::NAN, 2.0, 3.0];
        let best = argmin_curve(&values, &taus).unwrap();
        assert_eq!(best, CurvePoint { value: 2.0, tau: 0.5 });
    }

    #[test]
    fn all_nan_curve() {
        let best = argmax_curve(&[f64::NAN, f64::NAN], &[0.0, 1.0]).unwrap();
        assert!(best.value.is_nan() && best.tau.is_nan());
    }

    #[test]
    fn shape_and_count_errors() {
        assert_eq!(
            argmax_curve(&[0.1, 0.2], &[0.0]).unwrap_err(),
            EvalError::ShapeMismatch {
                expected: 1,
                found: 2
            }
        );
        assert!(matches!(
            argmin_curve(&[], &[]),
            Err(EvalError::InputCount(_))
        ));
    }

    fn sequence_result(weight: TermWeights) -> ConfusionResult {
        // two thresholds; the second is better on every count
        ConfusionResult {
            centric: Centric::Sequence,
            entities: vec!["p1".into(), "p2".into()],
            tau: vec![0.2, 0.6],
            cm: vec![
                vec![
                    ConfusionTuple::new(0.0, 2.0, 0.0, 2.0),
                    ConfusionTuple::new(2.0, 0.0, 0.0, 2.0),
                ],
                vec![
                    ConfusionTuple::new(1.0, 1.0, 1.0, 1.0),
                    ConfusionTuple::new(2.0, 0.0, 1.0, 1.0),
                ],
            ],
            npp: vec![4, 2],
            weight: Some(weight),
            stamp: None,
        }
    }

    #[test]
    fn fmax_on_plain_counts() {
        let r = sequence_result(TermWeights::Equal);
        let config = EvalConfig::default();

        // tau 0.6: F(p1) = 1, F(p2) = 2/3
        let f = fmax(&r, &config).unwrap();
        assert_eq!(f.tau, 0.6);
        assert!((f.value - 5.0 / 6.0).abs() < TOL);

        assert!(wfmax(&r, &config).is_err());
        assert!(smin(&r, &config).is_err());
    }

    #[test]
    fn weighted_summaries() {
        let r = sequence_result(TermWeights::InformationAccretion);
        let config = EvalConfig::default().with_weight(TermWeights::InformationAccretion);

        let wf = wfmax(&r, &config).unwrap();
        assert_eq!(wf.tau, 0.6);
        assert!((wf.value - 5.0 / 6.0).abs() < TOL);

        // tau 0.6: S(p1) = 0, S(p2) = 1
        let s = smin(&r, &config).unwrap();
        assert_eq!(s.tau, 0.6);
        assert!((s.value - 0.5).abs() < TOL);

        // normalized: p2 RU = 1/2, MI = 0
        let ns = nsmin(&r, &config).unwrap();
        assert!((ns.value - 0.25).abs() < TOL);

        // plain F on weighted counts would silently be weighted F
        assert!(fmax(&r, &config).is_err());
        // weights requested at averaging time must match the result
        assert!(smin(&r, &EvalConfig::default()).is_err());
    }

    #[test]
    fn smin_rejected_for_terms() {
        let mut r = sequence_result(TermWeights::Equal);
        r.centric = Centric::Term;
        r.weight = None;
        assert!(matches!(
            smin(&r, &EvalConfig::default()),
            Err(EvalError::IncompatibleMetric { .. })
        ));
        assert!(fmax(&r, &EvalConfig::default()).is_ok());
    }

    #[test]
    fn area_under_pr_curve() {
        let curve = MetricCurve {
            kind: MetricKind::PrecisionRecall,
            tau: vec![0.0, 0.5, 0.9, 1.0],
            values: vec![
                MetricValue::Pair([0.5, 1.0]),
                MetricValue::Pair([1.0, 0.5]),
                MetricValue::Pair([1.0, 0.0]),
                MetricValue::Pair([f64::NAN, 0.0]),
            ],
        };
        // (0, 1) -> (0.5, 1) -> (1, 0.5)
        assert!((pr_auc(&curve).unwrap() - 0.875).abs() < TOL);

        let not_pr = MetricCurve {
            kind: MetricKind::Accuracy,
            tau: vec![0.0],
            values: vec![MetricValue::Scalar(1.0)],
        };
        assert!(pr_auc(&not_pr).is_err());
    }
}
