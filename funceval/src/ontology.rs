//! Ontology reference consumed by the evaluation engine.
//!
//! The term graph itself is built elsewhere; [`Ontology`] only carries the
//! ordered term IDs and each term's direct parents. That is enough to check
//! that two structures share one term universe, to select terms of interest,
//! and to derive information-accretion weights.

use std::collections::HashMap;

use funceval_core::{EvalError, Result, Summarizable};

use crate::annotation::AnnotationSet;

/// An ordered set of ontology terms with direct-parent links.
#[derive(Debug, Clone, PartialEq)]
pub struct Ontology {
    terms: Vec<String>,
    parents: Vec<Vec<usize>>,
    children: Vec<Vec<usize>>,
    index: HashMap<String, usize>,
}

impl Ontology {
    /// An ontology with no relations: every term is a root.
    pub fn new(terms: Vec<String>) -> Result<Self> {
        let parents = vec![Vec::new(); terms.len()];
        Self::with_parents(terms, parents)
    }

    /// Build from term IDs and, for each term, the indices of its direct
    /// parents.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate term IDs, a parent list count that does
    /// not match the term count, out-of-range parent indices, or a term
    /// listed as its own parent.
    pub fn with_parents(terms: Vec<String>, parents: Vec<Vec<usize>>) -> Result<Self> {
        if parents.len() != terms.len() {
            return Err(EvalError::InputValidation(format!(
                "{} parent lists for {} terms",
                parents.len(),
                terms.len()
            )));
        }

        let mut index = HashMap::with_capacity(terms.len());
        for (i, id) in terms.iter().enumerate() {
            if index.insert(id.clone(), i).is_some() {
                return Err(EvalError::InputValidation(format!(
                    "duplicate term ID '{id}'"
                )));
            }
        }

        let n = terms.len();
        let mut children = vec![Vec::new(); n];
        let mut parents = parents;
        for (child, pa) in parents.iter_mut().enumerate() {
            pa.sort_unstable();
            pa.dedup();
            for &p in pa.iter() {
                if p >= n {
                    return Err(EvalError::InputValidation(format!(
                        "term '{}' has parent index {p} out of range",
                        terms[child]
                    )));
                }
                if p == child {
                    return Err(EvalError::InputValidation(format!(
                        "term '{}' lists itself as a parent",
                        terms[child]
                    )));
                }
                children[p].push(child);
            }
        }

        Ok(Self {
            terms,
            parents,
            children,
            index,
        })
    }

    /// Build from term IDs and `(child, parent)` ID pairs.
    pub fn from_edges(terms: Vec<String>, edges: &[(&str, &str)]) -> Result<Self> {
        let lookup: HashMap<&str, usize> = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();
        let mut parents = vec![Vec::new(); terms.len()];
        for &(child, parent) in edges {
            let c = *lookup.get(child).ok_or_else(|| {
                EvalError::InputValidation(format!("unknown term '{child}' in edge list"))
            })?;
            let p = *lookup.get(parent).ok_or_else(|| {
                EvalError::InputValidation(format!("unknown term '{parent}' in edge list"))
            })?;
            parents[c].push(p);
        }
        Self::with_parents(terms, parents)
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the ontology has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Term IDs in ontology order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Position of a term ID.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Direct parents of term `i`.
    pub fn parents(&self, i: usize) -> &[usize] {
        &self.parents[i]
    }

    /// Direct children of term `i`.
    pub fn children(&self, i: usize) -> &[usize] {
        &self.children[i]
    }

    /// Indices of terms without parents.
    pub fn roots(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| self.parents[i].is_empty())
            .collect()
    }

    /// Identical term universe: same length, same IDs, same order.
    pub fn same_terms(&self, other: &Ontology) -> bool {
        self.terms == other.terms
    }
}

impl Summarizable for Ontology {
    fn summary(&self) -> String {
        let edges: usize = self.parents.iter().map(Vec::len).sum();
        format!(
            "Ontology: {} terms, {} roots, {} edges",
            self.len(),
            self.roots().len(),
            edges
        )
    }
}

/// Which terms take part in a sequence-centric evaluation.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TermSelector {
    /// Every term.
    #[default]
    All,
    /// Every term except the ontology roots.
    NoRoot,
    /// Explicit per-term mask in ontology order.
    Mask(Vec<bool>),
}

impl TermSelector {
    /// Resolve to a per-term inclusion mask.
    pub fn resolve(&self, ontology: &Ontology) -> Result<Vec<bool>> {
        match self {
            TermSelector::All => Ok(vec![true; ontology.len()]),
            TermSelector::NoRoot => {
                let mut mask = vec![true; ontology.len()];
                for r in ontology.roots() {
                    mask[r] = false;
                }
                Ok(mask)
            }
            TermSelector::Mask(mask) => {
                if mask.len() != ontology.len() {
                    return Err(EvalError::InputValidation(format!(
                        "terms-of-interest mask has length {}, ontology has {} terms",
                        mask.len(),
                        ontology.len()
                    )));
                }
                Ok(mask.clone())
            }
        }
    }
}

/// Per-term weights used when accumulating sequence-centric counts.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TermWeights {
    /// Every term counts once.
    #[default]
    Equal,
    /// Information accretion derived from the ground-truth annotation.
    InformationAccretion,
    /// Caller-supplied weights in ontology order.
    Explicit(Vec<f64>),
}

impl TermWeights {
    /// Short name used in messages.
    pub fn name(&self) -> &'static str {
        match self {
            TermWeights::Equal => "equal",
            TermWeights::InformationAccretion => "information-accretion",
            TermWeights::Explicit(_) => "explicit",
        }
    }

    /// Resolve to one weight per ontology term.
    ///
    /// `truth` is the annotation information accretion is estimated from.
    pub fn resolve(&self, truth: &AnnotationSet) -> Result<Vec<f64>> {
        let ontology = truth.ontology();
        match self {
            TermWeights::Equal => Ok(vec![1.0; ontology.len()]),
            TermWeights::InformationAccretion => information_accretion(ontology, truth),
            TermWeights::Explicit(w) => {
                if w.len() != ontology.len() {
                    return Err(EvalError::InputValidation(format!(
                        "weight vector has length {}, ontology has {} terms",
                        w.len(),
                        ontology.len()
                    )));
                }
                if let Some((i, v)) = w
                    .iter()
                    .enumerate()
                    .find(|(_, v)| !v.is_finite() || **v < 0.0)
                {
                    return Err(EvalError::InputValidation(format!(
                        "weight {v} for term '{}' must be finite and non-negative",
                        ontology.terms()[i]
                    )));
                }
                Ok(w.clone())
            }
        }
    }
}

/// Information accretion of every term, estimated from `annotation`.
///
/// `ia(t) = -log2(n(t) / n(pa(t)))`, where `n(t)` counts objects annotated
/// with `t` and `n(pa(t))` counts objects annotated with every direct parent
/// of `t`. For roots the denominator is the number of objects carrying at
/// least one annotation. Terms with `n(t) = 0` get weight 0.
///
/// The annotation is expected to be closed under ancestors.
pub fn information_accretion(ontology: &Ontology, annotation: &AnnotationSet) -> Result<Vec<f64>> {
    if !ontology.same_terms(annotation.ontology()) {
        return Err(EvalError::OntologyMismatch(
            "annotation does not use the ontology weights are requested for".into(),
        ));
    }

    let n_terms = ontology.len();
    let rows = annotation
        .matrix()
        .compress(funceval_core::sparse::Axis::Row);

    let mut n_term = vec![0usize; n_terms];
    let mut n_parents = vec![0usize; n_terms];
    let mut annotated = 0usize;
    let mut marked = vec![false; n_terms];
    let roots = ontology.roots();

    for obj in 0..rows.n_lanes() {
        let positives: Vec<usize> = rows
            .lane(obj)
            .iter()
            .filter(|&(_, v)| v > 0.0)
            .map(|(t, _)| t)
            .collect();
        if positives.is_empty() {
            continue;
        }
        annotated += 1;
        for &t in &positives {
            marked[t] = true;
            n_term[t] += 1;
        }

        // A non-root term whose parents are all present has at least one
        // present parent, so it is among the children of `positives`.
        let mut candidates: Vec<usize> = positives
            .iter()
            .flat_map(|&t| ontology.children(t).iter().copied())
            .collect();
        candidates.sort_unstable();
        candidates.dedup();
        for c in candidates {
            if ontology.parents(c).iter().all(|&p| marked[p]) {
                n_parents[c] += 1;
            }
        }

        for &t in &positives {
            marked[t] = false;
        }
    }
    for r in roots {
        n_parents[r] = annotated;
    }

    Ok((0..n_terms)
        .map(|t| {
            if n_term[t] == 0 || n_parents[t] == 0 {
                0.0
            } else {
                // n(t) <= n(pa(t)) only holds for ancestor-closed annotation
                (-(n_term[t] as f64 / n_parents[t] as f64).log2()).max(0.0)
            }
        })
        .collect())
}
