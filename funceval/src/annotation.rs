//! Annotation and prediction structures, and their projection onto a target
//! object list.
//!
//! An [`AnnotationSet`] is a sparse `[objects × terms]` matrix tied to an
//! [`Ontology`]. Ground truth is binary; predictions carry scores in `[0, 1]`
//! that are taken as already normalized.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use funceval_core::sparse::Axis;
use funceval_core::{CompressedMatrix, EvalError, Result, SparseMatrix, Summarizable};

use crate::ontology::Ontology;

/// What the matrix values mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AnnotationKind {
    /// Curated annotation: every stored value is 0 or 1.
    Binary,
    /// Predicted score in `[0, 1]`.
    Score,
}

/// Objects, their ontology, and the sparse object-by-term matrix.
#[derive(Debug, Clone)]
pub struct AnnotationSet {
    objects: Vec<String>,
    ontology: Arc<Ontology>,
    matrix: SparseMatrix,
    kind: AnnotationKind,
}

impl AnnotationSet {
    /// Assemble a structure, checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns an error if object IDs repeat, the matrix shape is not
    /// `objects × terms`, or a value is outside the range `kind` allows.
    pub fn new(
        objects: Vec<String>,
        ontology: Arc<Ontology>,
        matrix: SparseMatrix,
        kind: AnnotationKind,
    ) -> Result<Self> {
        check_unique(&objects, "object list")?;
        let (n_rows, n_cols) = matrix.shape();
        if n_rows != objects.len() || n_cols != ontology.len() {
            return Err(EvalError::InputValidation(format!(
                "matrix shape ({n_rows}, {n_cols}) does not match {} objects \u{00d7} {} terms",
                objects.len(),
                ontology.len()
            )));
        }
        for (r, c, v) in matrix.iter() {
            let ok = match kind {
                AnnotationKind::Binary => v == 0.0 || v == 1.0,
                AnnotationKind::Score => (0.0..=1.0).contains(&v),
            };
            if !ok {
                return Err(EvalError::InputValidation(format!(
                    "{kind:?} value {v} for object '{}', term '{}'",
                    objects[r],
                    ontology.terms()[c]
                )));
            }
        }
        Ok(Self {
            objects,
            ontology,
            matrix,
            kind,
        })
    }

    /// A structure with no objects.
    pub fn empty(ontology: Arc<Ontology>, kind: AnnotationKind) -> Self {
        let matrix = SparseMatrix::new(0, ontology.len());
        Self {
            objects: Vec::new(),
            ontology,
            matrix,
            kind,
        }
    }

    /// Build from `(object, term, value)` records. Objects are numbered in
    /// first-seen order.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown term IDs, repeated `(object, term)`
    /// pairs, or out-of-range values.
    pub fn from_records<'r, I>(ontology: Arc<Ontology>, kind: AnnotationKind, records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'r str, &'r str, f64)>,
    {
        let mut objects: Vec<String> = Vec::new();
        let mut seen: HashMap<&'r str, usize> = HashMap::new();
        let (mut rows, mut cols, mut values) = (Vec::new(), Vec::new(), Vec::new());

        for (obj, term, value) in records {
            let col = ontology.index_of(term).ok_or_else(|| {
                EvalError::InputValidation(format!("unknown term '{term}' for object '{obj}'"))
            })?;
            let row = *seen.entry(obj).or_insert_with(|| {
                objects.push(obj.to_string());
                objects.len() - 1
            });
            rows.push(row);
            cols.push(col);
            values.push(value);
        }

        let matrix = SparseMatrix::from_triplets(rows, cols, values, objects.len(), ontology.len())?;
        Self::new(objects, ontology, matrix, kind)
    }

    /// Object IDs in row order.
    pub fn objects(&self) -> &[String] {
        &self.objects
    }

    /// Number of objects (rows).
    pub fn n_objects(&self) -> usize {
        self.objects.len()
    }

    /// The ontology the columns follow.
    pub fn ontology(&self) -> &Ontology {
        &self.ontology
    }

    /// Shared handle to the ontology.
    pub fn ontology_arc(&self) -> &Arc<Ontology> {
        &self.ontology
    }

    /// The sparse `[objects × terms]` matrix.
    pub fn matrix(&self) -> &SparseMatrix {
        &self.matrix
    }

    /// Matrix value kind.
    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    /// Number of strictly positive values in each row.
    pub fn positives_per_object(&self) -> Vec<usize> {
        self.matrix.row_counts(|v| v > 0.0)
    }

    /// Row-compressed view: one lane per object.
    pub fn by_object(&self) -> CompressedMatrix {
        self.matrix.compress(Axis::Row)
    }

    /// Column-compressed view: one lane per term.
    pub fn by_term(&self) -> CompressedMatrix {
        self.matrix.compress(Axis::Column)
    }

    /// Members of `ids` that have a row here, in the order given.
    pub fn known(&self, ids: &[String]) -> Vec<String> {
        let present: HashSet<&str> = self.objects.iter().map(String::as_str).collect();
        ids.iter()
            .filter(|id| present.contains(id.as_str()))
            .cloned()
            .collect()
    }

    /// Reindex onto `target`.
    ///
    /// The result's objects are exactly `target`, in order. Rows of objects
    /// present here are copied; objects absent here get empty rows (not
    /// annotated, or zero score). Objects not in `target` are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if `target` contains duplicates.
    pub fn project(&self, target: &[String]) -> Result<Self> {
        check_unique(target, "target list")?;
        let position: HashMap<&str, usize> = target
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        let mapping: Vec<Option<usize>> = self
            .objects
            .iter()
            .map(|id| position.get(id.as_str()).copied())
            .collect();
        let matrix = self.matrix.remap_rows(&mapping, target.len())?;
        Ok(Self {
            objects: target.to_vec(),
            ontology: Arc::clone(&self.ontology),
            matrix,
            kind: self.kind,
        })
    }
}

impl Summarizable for AnnotationSet {
    fn summary(&self) -> String {
        let kind = match self.kind {
            AnnotationKind::Binary => "annotation",
            AnnotationKind::Score => "prediction",
        };
        format!(
            "AnnotationSet ({kind}): {} objects \u{00d7} {} terms, {} entries",
            self.n_objects(),
            self.ontology.len(),
            self.matrix.nnz()
        )
    }
}

/// Fail with [`EvalError::OntologyMismatch`] unless both structures use the
/// same term universe in the same order.
pub fn ensure_same_ontology(a: &AnnotationSet, b: &AnnotationSet) -> Result<()> {
    if Arc::ptr_eq(a.ontology_arc(), b.ontology_arc()) || a.ontology().same_terms(b.ontology()) {
        return Ok(());
    }
    Err(EvalError::OntologyMismatch(format!(
        "structures reference different term lists ({} vs {} terms)",
        a.ontology().len(),
        b.ontology().len()
    )))
}

/// Fail with [`EvalError::InputValidation`] if `ids` repeats an entry.
pub fn check_unique(ids: &[String], what: &str) -> Result<()> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(EvalError::InputValidation(format!(
                "{what} contains duplicate ID '{id}'"
            )));
        }
    }
    Ok(())
}
