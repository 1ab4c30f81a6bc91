//! Threshold-swept evaluation of protein function predictions.
//!
//! Predictions and ground truth are sparse object-by-term matrices over a
//! shared [`Ontology`]. The engine builds one confusion tuple per entity and
//! threshold, averages a metric over the entities, and extracts the best
//! point of the resulting curve:
//!
//! - **Projection**: [`AnnotationSet::project`] aligns a structure to a
//!   target object list, zero-filling objects it has no row for
//! - **Confusion matrices**: [`term_cm`] (one row per term) and [`seq_cm`]
//!   (one row per object, optionally weighted by information accretion)
//! - **Averaging**: [`metric_curve`] with macro or micro averaging over all
//!   or only the qualified entities
//! - **Summaries**: [`fmax`], [`wfmax`], [`smin`], [`nsmin`] and [`pr_auc`]
//!
//! ```
//! use std::sync::Arc;
//! use funceval::{fmax, term_cm, AnnotationKind, AnnotationSet, EvalConfig, Ontology};
//!
//! let go = Arc::new(Ontology::new(vec!["GO:1".into(), "GO:2".into()]).unwrap());
//! let truth = AnnotationSet::from_records(
//!     go.clone(),
//!     AnnotationKind::Binary,
//!     [("P1", "GO:1", 1.0), ("P2", "GO:2", 1.0)],
//! )
//! .unwrap();
//! let pred = AnnotationSet::from_records(
//!     go,
//!     AnnotationKind::Score,
//!     [("P1", "GO:1", 0.9), ("P2", "GO:1", 0.3)],
//! )
//! .unwrap();
//!
//! let config = EvalConfig::default();
//! let targets = vec!["P1".to_string(), "P2".to_string()];
//! let result = term_cm(&targets, &pred, &truth, &config).unwrap();
//! let best = fmax(&result, &config).unwrap();
//! assert_eq!(best.value, 1.0);
//! ```

pub mod annotation;
pub mod average;
pub mod config;
pub mod confmat;
pub mod curve;
pub mod metric;
pub mod ontology;
pub mod result;
pub mod seq;
pub mod term;

pub use annotation::{AnnotationKind, AnnotationSet};
pub use average::{average_tuples, metric_curve, select_entities};
pub use config::{default_thresholds, AvgMode, EvalConfig, EvalMode};
pub use confmat::{confmat, confmat_sparse, ConfusionTuple};
pub use curve::{argmax_curve, argmin_curve, fmax, nsmin, pr_auc, smin, wfmax, CurvePoint};
pub use funceval_core::{EvalError, Result, Summarizable};
pub use metric::{MetricCurve, MetricKind, MetricValue};
pub use ontology::{information_accretion, Ontology, TermSelector, TermWeights};
pub use result::{Centric, ConfusionResult};
pub use seq::seq_cm;
pub use term::term_cm;
