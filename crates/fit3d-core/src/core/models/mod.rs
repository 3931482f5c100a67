//! # Core Models Module
//!
//! This module contains the data structures that represent a macromolecular structure as
//! a strict hierarchy: [`structure::Structure`] → [`model::Model`] → [`chain::Chain`] →
//! [`leaf::LeafSubstructure`] → [`atom::Atom`].
//!
//! ## Key Components
//!
//! - [`atom`] - Atoms and chemical elements
//! - [`leaf`] - Amino acids, nucleotides and ligands with their identifiers and bonds
//! - [`chain`] - Ordered leaves sharing a chain identifier
//! - [`model`] - One conformational model of a structure
//! - [`structure`] - The root container
//! - [`family`] - The immutable registry of standard structural families
//! - [`topology`] - Bond orders and name-addressed bonds
//!
//! Structures are built once by the PDB assembler and treated as immutable afterwards;
//! alignment code works on cloned, transformed leaves.
//!
//! ```ignore
//! use fit3d::core::io::{pdb::PdbFile, traits::MolecularFile};
//!
//! let structure = PdbFile::read_from_path(Path::new("1abc.pdb"))?;
//! for leaf in structure.leaves() {
//!     println!("{} has {} atoms", leaf, leaf.atom_count());
//! }
//! ```

pub mod atom;
pub mod chain;
pub mod family;
pub mod leaf;
pub mod model;
pub mod structure;
pub mod topology;
