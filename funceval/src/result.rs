//! The confusion-matrix result structure shared by both assemblers.

use std::fmt;

use funceval_core::Summarizable;

use crate::confmat::ConfusionTuple;
use crate::ontology::TermWeights;

/// Which axis the confusion matrices were built along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Centric {
    /// One confusion matrix per ontology term.
    Term,
    /// One confusion matrix per object (sequence).
    Sequence,
}

impl fmt::Display for Centric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Centric::Term => write!(f, "term"),
            Centric::Sequence => write!(f, "sequence"),
        }
    }
}

/// Per-entity, per-threshold confusion tuples.
///
/// Built once by [`term_cm`](crate::term::term_cm) or
/// [`seq_cm`](crate::seq::seq_cm) and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfusionResult {
    /// Axis of `entities`.
    pub centric: Centric,
    /// Term IDs or object IDs, one per row of `cm`.
    pub entities: Vec<String>,
    /// Thresholds, one per column of `cm`.
    pub tau: Vec<f64>,
    /// `cm[entity][threshold]`.
    pub cm: Vec<Vec<ConfusionTuple>>,
    /// Positive predictions (score > 0) per entity.
    pub npp: Vec<usize>,
    /// Term weights the counts were accumulated with. Always set for
    /// sequence-centric results; `None` for term-centric ones.
    pub weight: Option<TermWeights>,
    /// Caller-supplied provenance.
    pub stamp: Option<String>,
}

impl ConfusionResult {
    /// Number of entities.
    pub fn n_entities(&self) -> usize {
        self.entities.len()
    }

    /// Number of thresholds.
    pub fn n_thresholds(&self) -> usize {
        self.tau.len()
    }

    /// Default qualification for partial averaging: `npp > 0`.
    pub fn qualified(&self) -> Vec<bool> {
        self.npp.iter().map(|&n| n > 0).collect()
    }

    /// Whether the counts are weighted sums rather than plain term counts.
    pub fn is_weighted(&self) -> bool {
        matches!(&self.weight, Some(w) if *w != TermWeights::Equal)
    }

    /// Confusion tuples of one entity, by ID.
    pub fn entity(&self, id: &str) -> Option<&[ConfusionTuple]> {
        self.entities
            .iter()
            .position(|e| e == id)
            .map(|i| self.cm[i].as_slice())
    }
}

impl Summarizable for ConfusionResult {
    fn summary(&self) -> String {
        let qualified = self.npp.iter().filter(|&&n| n > 0).count();
        format!(
            "ConfusionResult ({}-centric): {} entities ({} with predictions) \u{00d7} {} thresholds",
            self.centric,
            self.n_entities(),
            qualified,
            self.n_thresholds()
        )
    }
}
