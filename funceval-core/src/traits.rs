//! Traits shared by the evaluation structures.

/// One-line human-readable description, used in log lines and reports.
///
/// Implemented by the sparse matrix, the ontology reference, annotation
/// structures and confusion results.
pub trait Summarizable {
    /// Shape and size of the value, without its contents.
    fn summary(&self) -> String;
}
