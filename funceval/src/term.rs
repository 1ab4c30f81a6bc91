//! Term-centric confusion matrices: one threshold sweep per ontology term,
//! over the target objects.

use std::collections::HashSet;

use log::{debug, warn};

use funceval_core::{EvalError, Result, Summarizable};

use crate::annotation::{check_unique, ensure_same_ontology, AnnotationKind, AnnotationSet};
use crate::config::{EvalConfig, EvalMode};
use crate::confmat::confmat_lane;
use crate::result::{Centric, ConfusionResult};

/// Build term-centric confusion matrices.
///
/// The population is `target` restricted to objects the ground truth knows
/// about, i.e. objects with a row in `truth`; a row without positive terms
/// makes an object a known negative, while an object with no row at all is
/// dropped. In [`EvalMode::Partial`] the population is further restricted
/// to objects with at least one positive prediction. Only terms with at
/// least one positive annotation in that population are kept.
///
/// # Errors
///
/// Fails before any counting if the config is invalid, `target` repeats an
/// ID, the structures use different ontologies, or `truth` is not a binary
/// annotation.
pub fn term_cm(
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

    let mut population = truth.known(target);
    if config.eval_mode == EvalMode::Partial {
        let predicted: HashSet<&str> = pred
            .objects()
            .iter()
            .zip(pred.positives_per_object())
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

    let scores = pred.project(&population)?.by_term();
    let labels = truth.project(&population)?.by_term();

    let terms: Vec<usize> = (0..labels.n_lanes())
        .filter(|&t| labels.lane(t).count_positive() > 0)
        .collect();
    debug!(
        "term-centric: {} objects, {} annotated terms, {} thresholds",
        population.len(),
        terms.len(),
        config.tau.len()
    );
    if terms.is_empty() {
        warn!("term-centric evaluation retained no annotated terms");
    }

    let total = population.len() as f64;
    let build = |t: usize| {
        let column = scores.lane(t);
        let cm = confmat_lane(column, labels.lane(t), None, total, &config.tau);
        (cm, column.count_positive())
    };

    #[cfg(feature = "parallel")]
    let rows: Vec<_> = {
        use rayon::prelude::*;
        terms.par_iter().map(|&t| build(t)).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let rows: Vec<_> = terms.iter().map(|&t| build(t)).collect();

    let ids = truth.ontology().terms();
    let (cm, npp) = rows.into_iter().unzip();
    let result = ConfusionResult {
        centric: Centric::Term,
        entities: terms.iter().map(|&t| ids[t].clone()).collect(),
        tau: config.tau.clone(),
        cm,
        npp,
        weight: None,
        stamp: config.stamp.clone(),
    };
    debug!("built {}", result.summary());
    Ok(result)
}
