//! # Core Module
//!
//! Stateless building blocks: the structure hierarchy ([`models`]), PDB reading and writing
//! ([`io`]), the leaf skeleton dictionary ([`topology`]) and small geometric and naming
//! helpers ([`utils`]).

pub mod io;
pub mod models;
pub mod topology;
pub mod utils;
