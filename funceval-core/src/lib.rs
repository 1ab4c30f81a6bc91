//! Shared primitives for the funceval prediction-evaluation workspace.
//!
//! `funceval-core` provides the foundation the evaluation engine builds on:
//!
//! - **Error types**: [`EvalError`] and [`Result`] for structured error handling
//! - **Traits**: [`Summarizable`] one-line descriptions
//! - **Sparse matrices**: [`SparseMatrix`] (COO), [`CompressedMatrix`]
//!   (CSR/CSC lanes) and the borrowed [`SparseVector`] view

pub mod error;
pub mod sparse;
pub mod traits;

pub use error::{EvalError, Result};
pub use sparse::{CompressedMatrix, SparseMatrix, SparseVector};
pub use traits::*;
