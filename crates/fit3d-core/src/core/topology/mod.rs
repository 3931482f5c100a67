//! # Topology Module
//!
//! Resolves leaves that are not standard residues. The [`registry`] maps a three-letter
//! component code to a leaf skeleton: the family the leaf is classified as, the standard
//! parent it derives from (for modified residues and nucleotides), and its explicit bond
//! list, which replaces the static per-family template of standard residues.
//!
//! ```ignore
//! use fit3d::core::topology::registry::SkeletonRegistry;
//!
//! let registry = SkeletonRegistry::load(Path::new("skeletons.toml"))?;
//! let mse = registry.get("MSE").unwrap();
//! assert_eq!(mse.parent.as_deref(), Some("MET"));
//! ```

pub mod registry;
