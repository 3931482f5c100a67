//! # Workflows Module
//!
//! End-to-end motif searches built from the `core` and `engine` layers.
//!
//! - **Single target** ([`align`]) extracts leaf environments from one structure, enumerates
//!   family-admissible candidate leaf sets and keeps the ideal superimpositions under the RMSD
//!   cutoff.
//! - **Batch** ([`batch`]) runs the single-target search over many structures on a worker
//!   pool, merges and ranks the matches and optionally attaches p-values.
//! - **Output** ([`output`]) writes matched substructures as PDB files and a CSV summary.

pub mod align;
pub mod batch;
pub mod output;
