//! Evaluation configuration.
//!
//! One explicit record per evaluation call, validated in a single pass
//! before any confusion matrix is built.

use funceval_core::{EvalError, Result};

use crate::confmat::validate_thresholds;
use crate::ontology::{TermSelector, TermWeights};

/// Which population an evaluation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EvalMode {
    /// Every target object; missing predictions count as zero scores.
    #[default]
    Full,
    /// Only objects (and entities) with at least one positive prediction.
    Partial,
}

/// How per-entity confusion tuples are collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AvgMode {
    /// Metric per entity, then the mean of the finite metric values.
    #[default]
    Macro,
    /// Mean of the raw counts, then one metric on the averaged tuple.
    Micro,
}

/// The threshold array `0.00, 0.01, ..., 1.00`.
pub fn default_thresholds() -> Vec<f64> {
    (0..=100).map(|i| i as f64 / 100.0).collect()
}

/// Options shared by the assemblers, the averaging engine and the
/// extremum summaries.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvalConfig {
    /// Thresholds, strictly ascending, inside `[0, 1]`.
    pub tau: Vec<f64>,
    /// Full or partial evaluation.
    pub eval_mode: EvalMode,
    /// Macro or micro averaging.
    pub avg_mode: AvgMode,
    /// Terms of interest (sequence-centric only).
    pub toi: TermSelector,
    /// Term weights (sequence-centric only).
    pub weight: TermWeights,
    /// F-measure `beta` used by the max-F summaries.
    pub beta: f64,
    /// Semantic-distance order used by the min-S summaries.
    pub order: f64,
    /// Explicit qualification per entity for partial averaging. Defaults to
    /// "has at least one positive prediction".
    pub qualify_mask: Option<Vec<bool>>,
    /// Caller-supplied provenance copied onto every result.
    pub stamp: Option<String>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            tau: default_thresholds(),
            eval_mode: EvalMode::Full,
            avg_mode: AvgMode::Macro,
            toi: TermSelector::All,
            weight: TermWeights::Equal,
            beta: 1.0,
            order: 2.0,
            qualify_mask: None,
            stamp: None,
        }
    }
}

impl EvalConfig {
    /// Replace the threshold array.
    pub fn with_tau(mut self, tau: Vec<f64>) -> Self {
        self.tau = tau;
        self
    }

    /// Set the evaluation mode.
    pub fn with_eval_mode(mut self, mode: EvalMode) -> Self {
        self.eval_mode = mode;
        self
    }

    /// Set the averaging mode.
    pub fn with_avg_mode(mut self, mode: AvgMode) -> Self {
        self.avg_mode = mode;
        self
    }

    /// Set the terms of interest.
    pub fn with_toi(mut self, toi: TermSelector) -> Self {
        self.toi = toi;
        self
    }

    /// Set the term weights.
    pub fn with_weight(mut self, weight: TermWeights) -> Self {
        self.weight = weight;
        self
    }

    /// Set the F-measure beta.
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Set the semantic-distance order.
    pub fn with_order(mut self, order: f64) -> Self {
        self.order = order;
        self
    }

    /// Set an explicit qualification mask.
    pub fn with_qualify_mask(mut self, mask: Vec<bool>) -> Self {
        self.qualify_mask = Some(mask);
        self
    }

    /// Attach a provenance stamp.
    pub fn with_stamp(mut self, stamp: impl Into<String>) -> Self {
        self.stamp = Some(stamp.into());
        self
    }

    /// Check every option that can be checked without the data.
    ///
    /// Mask and weight lengths depend on the ontology or on the entity axis
    /// and are checked where those are known.
    pub fn validate(&self) -> Result<()> {
        validate_thresholds(&self.tau)?;
        if self.tau.windows(2).any(|w| w[0] >= w[1]) {
            return Err(EvalError::InputValidation(
                "thresholds must be strictly ascending".into(),
            ));
        }
        if !(self.beta.is_finite() && self.beta > 0.0) {
            return Err(EvalError::InputValidation(format!(
                "beta must be a positive finite number, got {}",
                self.beta
            )));
        }
        if !(self.order.is_finite() && self.order > 0.0) {
            return Err(EvalError::InputValidation(format!(
                "order must be a positive finite number, got {}",
                self.order
            )));
        }
        Ok(())
    }
}
