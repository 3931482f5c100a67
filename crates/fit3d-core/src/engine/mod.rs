//! # Engine Module
//!
//! The numeric and combinatorial machinery behind Fit3D motif searches.
//!
//! ## Architecture
//!
//! - **Superimposition** ([`superimposition`]) - SVD-based rigid fitting of point sets and leaf
//!   sequences, including the ideal (best-permutation) variant
//! - **Representation** ([`representation`]) - One representative point per leaf, with the
//!   virtual CB for glycine
//! - **Candidates** ([`candidates`]) - Injective mappings of motif positions onto environment leaves
//! - **Environments** ([`environment`]) - k-d tree radius queries over target leaves
//! - **Chemistry tables** ([`exchange`], [`substitution`]) - Exchange groups and BLOSUM62
//! - **Statistics** ([`statistics`]) - Fofanov and Stark p-value models over merged results
//! - **Configuration** ([`config`]), **results** ([`matches`]), **progress** ([`progress`])
//!   and **errors** ([`error`])

pub mod candidates;
pub mod config;
pub mod environment;
pub mod error;
pub mod exchange;
pub mod matches;
pub mod progress;
pub mod representation;
pub mod statistics;
pub mod substitution;
pub mod superimposition;
