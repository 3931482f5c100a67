//! Reading and writing of macromolecular structure files.
//!
//! PDB records are described by fixed-column tokens ([`tokens`]) that drive both parsing and
//! re-serialization. A per-parse [`assembler::StructureAssembler`] turns the line stream into
//! the structure hierarchy, and [`pdb::PdbFile`] exposes it through the [`traits::MolecularFile`]
//! interface.

pub mod assembler;
pub mod pdb;
pub mod tokens;
pub mod traits;
