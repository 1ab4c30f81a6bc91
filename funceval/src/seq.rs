//! Sequence-centric confusion matrices: one threshold sweep per target
//! object, over its terms of interest, optionally weighted per term.

use std::collections::HashSet;

use log::{debug, warn};

use funceval_core::{EvalError, Result, Summarizable};

use crate::annotation::{check_unique, ensure_same_ontology, AnnotationKind, AnnotationSet};
use crate::config::{EvalConfig, EvalMode};
use crate::confmat::confmat_lane;
use crate::result::{Centric, ConfusionResult};

/// Build sequence-centric confusion matrices.
///
/// Every object of the population gets one row. Terms outside
/// `config.toi` are ignored; each remaining term contributes its weight
/// from `config.weight` (information accretion is estimated from `truth`).
/// The population is `target` restricted to objects the ground truth knows
/// about, and in [`EvalMode::Partial`] further restricted to objects with a
/// positive prediction on a term of interest.
///
/// # Errors
///
/// Fails before any counting if the config is invalid, `target` repeats an
/// ID, the structures use different ontologies, `truth` is not binary, or
/// an explicit mask or weight vector does not match the ontology.
pub fn seq_cm(
    target: &[String],
    pred: &AnnotationSet,
    truth: &AnnotationSet,
    config: &EvalConfig,
) -> Result<ConfusionResult> {
    config.validate()?;
    check_unique(target, "target list")?;
    ensure_same_ontology(pred, truth)?;
    if truth.kind() != AnnotationKind::Binary {
        return Err(EvalError::InputValidation(
            "ground truth must be a binary annotation".into(),
        ));
    }
    let toi = config.toi.resolve(truth.ontology())?;
    let weights: Vec<f64> = config
        .weight
        .resolve(truth)?
        .into_iter()
        .zip(&toi)
        .map(|(w, &keep)| if keep { w } else { 0.0 })
        .collect();
    let total: f64 = weights.iter().sum();

    let count_of_interest = |set: &AnnotationSet| -> Vec<usize> {
        let mut counts = vec![0usize; set.n_objects()];
        for (r, c, v) in set.matrix().iter() {
            if v > 0.0 && toi[c] {
                counts[r] += 1;
            }
        }
        counts
    };

    let mut population = truth.known(target);
    if config.eval_mode == EvalMode::Partial {
        let predicted: HashSet<&str> = pred
            .objects()
            .iter()
            .zip(count_of_interest(pred))
            .filter(|&(_, n)| n > 0)
            .map(|(id, _)| id.as_str())
            .collect();
        let before = population.len();
        population.retain(|id| predicted.contains(id.as_str()));
        debug!(
            "partial mode: {} of {} objects have positive predictions",
            population.len(),
            before
        );
    }
    if population.is_empty() {
        warn!("sequence-centric evaluation retained no objects");
    }

    let pred = pred.project(&population)?;
    let npp = count_of_interest(&pred);
    let scores = pred.by_object();
    let labels = truth.project(&population)?.by_object();
    debug!(
        "sequence-centric: {} objects, {} terms of interest, total weight {:.3}, {} thresholds",
        population.len(),
        toi.iter().filter(|&&k| k).count(),
        total,
        config.tau.len()
    );

    let build = |i: usize| {
        confmat_lane(
            scores.lane(i),
            labels.lane(i),
            Some(weights.as_slice()),
            total,
            &config.tau,
        )
    };

    #[cfg(feature = "parallel")]
    let cm: Vec<_> = {
        use rayon::prelude::*;
        (0..population.len()).into_par_iter().map(build).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let cm: Vec<_> = (0..population.len()).map(build).collect();

    let result = ConfusionResult {
        centric: Centric::Sequence,
        entities: population,
        tau: config.tau.clone(),
        cm,
        npp,
        weight: Some(config.weight.clone()),
        stamp: config.stamp.clone(),
    };
    debug!("built {}", result.summary());
    Ok(result)
}
