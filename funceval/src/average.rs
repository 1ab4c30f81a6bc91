//! Averaging engine: collapse the entity axis of a [`ConfusionResult`].
//!
//! - **Macro**: the metric is computed per entity and the finite values are
//!   averaged, component by component. An entity whose precision is
//!   undefined at some threshold simply does not vote on precision there.
//! - **Micro**: the raw counts are averaged over entities first and the
//!   metric is computed once on the averaged tuple. Nothing is skipped.
//!
//! In partial mode only qualified entities take part; by default an entity
//! qualifies when it has at least one positive prediction.

use funceval_core::{EvalError, Result};

use crate::config::{AvgMode, EvalConfig, EvalMode};
use crate::confmat::ConfusionTuple;
use crate::metric::{MetricCurve, MetricKind, MetricValue};
use crate::ontology::TermWeights;
use crate::result::{Centric, ConfusionResult};

/// Indices of the entities an average runs over.
///
/// # Errors
///
/// Returns an error if the result is ragged (a row of `cm` or the `npp`
/// vector disagrees with the entity and threshold counts), or if a
/// qualification mask is given whose length differs from the number of
/// entities.
pub fn select_entities(result: &ConfusionResult, config: &EvalConfig) -> Result<Vec<usize>> {
    check_shape(result)?;
    let n = result.n_entities();
    if let Some(mask) = &config.qualify_mask {
        if mask.len() != n {
            return Err(EvalError::InputValidation(format!(
                "qualification mask has length {}, result has {n} entities",
                mask.len()
            )));
        }
    }
    Ok(match config.eval_mode {
        EvalMode::Full => (0..n).collect(),
        EvalMode::Partial => {
            let default_mask;
            let mask = match &config.qualify_mask {
                Some(mask) => mask,
                None => {
                    default_mask = result.qualified();
                    &default_mask
                }
            };
            (0..n).filter(|&i| mask[i]).collect()
        }
    })
}

fn check_shape(result: &ConfusionResult) -> Result<()> {
    let n = result.n_entities();
    if result.cm.len() != n || result.npp.len() != n {
        return Err(EvalError::InputValidation(format!(
            "result has {n} entities but {} confusion rows and {} prediction counts",
            result.cm.len(),
            result.npp.len()
        )));
    }
    let k = result.n_thresholds();
    if let Some((e, row)) = result.cm.iter().enumerate().find(|(_, row)| row.len() != k) {
        return Err(EvalError::InputValidation(format!(
            "confusion row of '{}' has {} tuples, expected one per threshold ({k})",
            result.entities[e],
            row.len()
        )));
    }
    Ok(())
}

/// Fail unless `kind` reads the kind of counts `result` holds, and the
/// weights `config` asks for are the ones the result was built with.
fn check_weighting(result: &ConfusionResult, kind: MetricKind, config: &EvalConfig) -> Result<()> {
    if result.centric != Centric::Sequence {
        return Ok(());
    }
    if result.weight.as_ref() != Some(&config.weight) {
        return Err(EvalError::InputValidation(format!(
            "config asks for {} term weights, result was built with {}",
            config.weight.name(),
            result.weight.as_ref().map_or("no", TermWeights::name)
        )));
    }
    match kind.weighting() {
        Some(true) if !result.is_weighted() => Err(EvalError::InputValidation(format!(
            "metric {kind} needs a result built with non-equal term weights"
        ))),
        Some(false) if result.is_weighted() => Err(EvalError::InputValidation(format!(
            "metric {kind} reads plain counts, result holds {} weighted counts",
            config.weight.name()
        ))),
        _ => Ok(()),
    }
}

/// Mean confusion tuple per threshold over the selected entities.
///
/// This is the micro-averaged input to metric derivation. With no selected
/// entities every tuple is zero.
pub fn average_tuples(result: &ConfusionResult, config: &EvalConfig) -> Result<Vec<ConfusionTuple>> {
    let entities = select_entities(result, config)?;
    Ok(mean_tuples(result, &entities))
}

fn mean_tuples(result: &ConfusionResult, entities: &[usize]) -> Vec<ConfusionTuple> {
    let mut sums = vec![ConfusionTuple::default(); result.n_thresholds()];
    for &e in entities {
        for (acc, t) in sums.iter_mut().zip(&result.cm[e]) {
            *acc = acc.add(t);
        }
    }
    if entities.is_empty() {
        return sums;
    }
    let k = 1.0 / entities.len() as f64;
    sums.iter().map(|t| t.scale(k)).collect()
}

/// Average `kind` over the entity axis, one value per threshold.
///
/// # Errors
///
/// Returns an error if the metric is incompatible with the result's centric
/// mode or weighting, its parameters are invalid, `config.weight` differs
/// from the weights a sequence-centric result was built with, the result is
/// ragged, or the qualification mask has the wrong length.
pub fn metric_curve(
    result: &ConfusionResult,
    kind: MetricKind,
    config: &EvalConfig,
) -> Result<MetricCurve> {
    let kind = kind.for_centric(result.centric)?;
    check_weighting(result, kind, config)?;
    let entities = select_entities(result, config)?;

    let values = match config.avg_mode {
        AvgMode::Micro => mean_tuples(result, &entities)
            .iter()
            .map(|t| kind.compute(t))
            .collect(),
        AvgMode::Macro => macro_values(result, &entities, kind),
    };

    Ok(MetricCurve {
        kind,
        tau: result.tau.clone(),
        values,
    })
}

/// Per-threshold, per-component mean of the finite per-entity values.
/// A component with no finite value is NaN.
fn macro_values(result: &ConfusionResult, entities: &[usize], kind: MetricKind) -> Vec<MetricValue> {
    let arity = kind.arity();
    (0..result.n_thresholds())
        .map(|j| {
            let mut sum = [0.0; 2];
            let mut count = [0usize; 2];
            for &e in entities {
                let v = kind.compute(&result.cm[e][j]);
                for (c, &x) in v.as_slice().iter().enumerate() {
                    if x.is_finite() {
                        sum[c] += x;
                        count[c] += 1;
                    }
                }
            }
            let mean: Vec<f64> = (0..arity)
                .map(|c| {
                    if count[c] > 0 {
                        sum[c] / count[c] as f64
                    } else {
                        f64::NAN
                    }
                })
                .collect();
            MetricValue::from_components(arity, &mean)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    fn result(cm: Vec<Vec<ConfusionTuple>>, npp: Vec<usize>, centric: Centric) -> ConfusionResult {
        ConfusionResult {
            centric,
            entities: (0..cm.len()).map(|i| format!("e{i}")).collect(),
            tau: (0..cm[0].len()).map(|j| j as f64 / 10.0).collect(),
            cm,
            npp,
            weight: match centric {
                Centric::Term => None,
                Centric::Sequence => Some(TermWeights::InformationAccretion),
            },
            stamp: None,
        }
    }

    fn ia() -> EvalConfig {
        EvalConfig::default().with_weight(TermWeights::InformationAccretion)
    }

    // e0: P = 1/2, R = 1/2 ; e1: nothing predicted, R = 0, P undefined
    fn divergent() -> ConfusionResult {
        result(
            vec![
                vec![ConfusionTuple::new(0.0, 1.0, 1.0, 1.0)],
                vec![ConfusionTuple::new(2.0, 0.0, 1.0, 0.0)],
            ],
            vec![2, 0],
            Centric::Term,
        )
    }

    #[test]
    fn macro_skips_undefined_precision() {
        let r = divergent();
        let curve = metric_curve(&r, MetricKind::PrecisionRecall, &EvalConfig::default()).unwrap();
        let [p, rc] = match curve.values[0] {
            MetricValue::Pair(pair) => pair,
            MetricValue::Scalar(_) => panic!("expected a pair"),
        };
        assert!((p - 0.5).abs() < TOL);
        // recall is defined for both entities
        assert!((rc - 0.25).abs() < TOL);
    }

    #[test]
    fn micro_pools_counts() {
        let r = divergent();
        let config = EvalConfig::default().with_avg_mode(AvgMode::Micro);
        let pooled = average_tuples(&r, &config).unwrap();
        assert_eq!(pooled[0], ConfusionTuple::new(1.0, 0.5, 1.0, 0.5));

        let curve = metric_curve(&r, MetricKind::PrecisionRecall, &config).unwrap();
        let v = curve.values[0].as_slice().to_vec();
        // P = 0.5 / 1.0, R = 0.5 / 1.5
        assert!((v[0] - 0.5).abs() < TOL);
        assert!((v[1] - 1.0 / 3.0).abs() < TOL);
    }

    #[test]
    fn macro_and_micro_differ() {
        let r = divergent();
        let f1 = MetricKind::FMeasure { beta: 1.0 };
        // macro: e1 has undefined F and is skipped, leaving e0 alone
        let macro_f = metric_curve(&r, f1, &EvalConfig::default())
            .unwrap()
            .values[0]
            .scalar()
            .unwrap();
        assert!((macro_f - 0.5).abs() < TOL);
        // micro: F of P = 1/2, R = 1/3
        let micro_f = metric_curve(&r, f1, &EvalConfig::default().with_avg_mode(AvgMode::Micro))
            .unwrap()
            .values[0]
            .scalar()
            .unwrap();
        assert!((micro_f - 0.4).abs() < TOL);
    }

    #[test]
    fn partial_mode_uses_npp_by_default() {
        let r = divergent();
        let config = EvalConfig::default().with_eval_mode(EvalMode::Partial);
        assert_eq!(select_entities(&r, &config).unwrap(), vec![0]);
        let curve = metric_curve(&r, MetricKind::PrecisionRecall, &config).unwrap();
        assert_eq!(curve.values[0], MetricValue::Pair([0.5, 0.5]));
    }

    #[test]
    fn explicit_mask_overrides_npp() {
        let r = divergent();
        let config = EvalConfig::default()
            .with_eval_mode(EvalMode::Partial)
            .with_qualify_mask(vec![false, true]);
        assert_eq!(select_entities(&r, &config).unwrap(), vec![1]);

        let bad = EvalConfig::default().with_qualify_mask(vec![true]);
        assert!(matches!(
            select_entities(&r, &bad),
            Err(EvalError::InputValidation(_))
        ));
    }

    #[test]
    fn full_mode_ignores_mask_values() {
        let r = divergent();
        let config = EvalConfig::default().with_qualify_mask(vec![false, false]);
        assert_eq!(select_entities(&r, &config).unwrap(), vec![0, 1]);
    }

    #[test]
    fn no_finite_values_gives_nan() {
        let r = result(
            vec![vec![ConfusionTuple::new(1.0, 0.0, 0.0, 0.0)]],
            vec![0],
            Centric::Term,
        );
        let curve = metric_curve(&r, MetricKind::FMeasure { beta: 1.0 }, &EvalConfig::default()).unwrap();
        assert!(curve.values[0].scalar().unwrap().is_nan());
    }

    #[test]
    fn empty_selection() {
        let r = divergent();
        let config = EvalConfig::default()
            .with_eval_mode(EvalMode::Partial)
            .with_qualify_mask(vec![false, false]);
        let pooled = average_tuples(&r, &config).unwrap();
        assert_eq!(pooled[0], ConfusionTuple::default());
    }

    #[test]
    fn term_centric_rejects_semantic_distance() {
        let r = divergent();
        let err = metric_curve(
            &r,
            MetricKind::SemanticDistance {
                order: 2.0,
                normalized: false,
            },
            &EvalConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EvalError::IncompatibleMetric { .. }));
    }

    #[test]
    fn sequence_semantic_distance_macro() {
        let r = result(
            vec![
                vec![ConfusionTuple::new(0.0, 4.0, 3.0, 1.0)],
                vec![ConfusionTuple::new(0.0, 0.0, 0.0, 2.0)],
            ],
            vec![5, 2],
            Centric::Sequence,
        );
        let kind = MetricKind::SemanticDistance {
            order: 2.0,
            normalized: false,
        };
        let curve = metric_curve(&r, kind, &ia()).unwrap();
        assert!((curve.values[0].scalar().unwrap() - 2.5).abs() < TOL);
    }

    #[test]
    fn config_weights_must_match_result() {
        let r = result(
            vec![vec![ConfusionTuple::new(0.0, 1.0, 1.0, 1.0)]],
            vec![2],
            Centric::Sequence,
        );
        let sd = MetricKind::SemanticDistance {
            order: 2.0,
            normalized: false,
        };
        let err = metric_curve(&r, sd, &EvalConfig::default()).unwrap_err();
        assert!(matches!(err, EvalError::InputValidation(_)));

        let explicit = EvalConfig::default().with_weight(TermWeights::Explicit(vec![1.0]));
        assert!(metric_curve(&r, sd, &explicit).is_err());
        assert!(metric_curve(&r, sd, &ia()).is_ok());
    }

    #[test]
    fn weighted_and_plain_metrics_are_not_interchangeable() {
        let mut r = result(
            vec![vec![ConfusionTuple::new(0.0, 1.0, 1.0, 1.0)]],
            vec![2],
            Centric::Sequence,
        );
        // weighted counts: only the weighted variants apply
        assert!(metric_curve(&r, MetricKind::PrecisionRecall, &ia()).is_err());
        assert!(metric_curve(&r, MetricKind::FMeasure { beta: 1.0 }, &ia()).is_err());
        assert!(metric_curve(&r, MetricKind::WeightedPrecisionRecall, &ia()).is_ok());
        assert!(metric_curve(&r, MetricKind::Accuracy, &ia()).is_ok());

        // plain counts: the weighted variants and RU/MI are refused
        r.weight = Some(TermWeights::Equal);
        let plain = EvalConfig::default();
        assert!(metric_curve(&r, MetricKind::PrecisionRecall, &plain).is_ok());
        assert!(metric_curve(&r, MetricKind::WeightedFMeasure { beta: 1.0 }, &plain).is_err());
        assert!(metric_curve(
            &r,
            MetricKind::RemainingMisinformation { normalized: false },
            &plain
        )
        .is_err());
    }

    #[test]
    fn ragged_result_is_rejected() {
        let mut r = divergent();
        r.tau = vec![0.0, 0.5];
        r.cm[1].push(ConfusionTuple::default());
        let err = select_entities(&r, &EvalConfig::default()).unwrap_err();
        assert!(matches!(err, EvalError::InputValidation(_)));
        assert!(metric_curve(&r, MetricKind::PrecisionRecall, &EvalConfig::default()).is_err());
        assert!(average_tuples(&r, &EvalConfig::default()).is_err());

        let mut r = divergent();
        r.npp.pop();
        assert!(select_entities(&r, &EvalConfig::default()).is_err());
    }
}
