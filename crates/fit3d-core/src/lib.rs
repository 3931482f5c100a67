//! # Fit3D Core Library
//!
//! Substructure motif search over macromolecular structures: a fixed-column PDB reader that
//! assembles a Structure → Model → Chain → Leaf → Atom hierarchy, an SVD-based rigid-body
//! superimposition engine and the Fit3D search that finds a query motif in target structures.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Data models, the skeleton registry of leaf families,
//!   PDB reading/writing and small geometry helpers.
//!
//! - **[`engine`]: The Algorithms.** Superimposition, representation schemes, candidate
//!   generation, environment extraction, exchange groups, substitution scoring and the
//!   statistical models used to rank matches.
//!
//! - **[`workflows`]: The Public API.** Single-target and batch searches plus result output.
//!
//! With the default `parallel` feature the batch search runs on a `rayon` worker pool.

pub mod core;
pub mod engine;
pub mod workflows;
