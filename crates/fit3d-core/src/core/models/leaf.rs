use super::atom::Atom;
use super::family::StructuralFamily;
use super::topology::{Bond, BondOrder};
use nalgebra::{Point3, Rotation3, Vector3};
use std::fmt;

/// The chemical class of a leaf substructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LeafKind {
    AminoAcid,
    Nucleotide,
    Ligand,
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AminoAcid => "amino acid",
            Self::Nucleotide => "nucleotide",
            Self::Ligand => "ligand",
        })
    }
}

/// Uniquely identifies a leaf substructure within a structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeafIdentifier {
    pub structure_id: String,
    pub model: u32,
    pub chain: char,
    pub serial: i32,
    pub insertion_code: Option<char>,
}

impl LeafIdentifier {
    pub fn new(
        structure_id: impl Into<String>,
        model: u32,
        chain: char,
        serial: i32,
        insertion_code: Option<char>,
    ) -> Self {
        Self {
            structure_id: structure_id.into(),
            model,
            chain,
            serial,
            insertion_code,
        }
    }

    /// The (serial, insertion code) pair that identifies the leaf within its chain.
    pub fn residue_key(&self) -> (i32, Option<char>) {
        (self.serial, self.insertion_code)
    }
}

impl fmt::Display for LeafIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.structure_id, self.model, self.chain, self.serial
        )?;
        if let Some(code) = self.insertion_code {
            write!(f, "{}", code)?;
        }
        Ok(())
    }
}

/// An amino acid, nucleotide or ligand: the smallest addressable unit of a structure.
///
/// A leaf keeps its own three-letter code next to its structural family. For standard
/// residues both agree; modified residues (e.g. `MSE`) borrow their parent's family while
/// keeping the original code, and ligands use the unknown-ligand family.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafSubstructure {
    id: LeafIdentifier,
    kind: LeafKind,
    family: &'static StructuralFamily,
    code: String,
    modified: bool,
    hetero: bool,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
}

impl LeafSubstructure {
    pub fn new(
        id: LeafIdentifier,
        code: &str,
        kind: LeafKind,
        family: &'static StructuralFamily,
    ) -> Self {
        Self {
            id,
            kind,
            family,
            code: code.to_string(),
            modified: false,
            hetero: false,
            atoms: Vec::new(),
            bonds: Vec::new(),
        }
    }

    /// Builds a standard leaf whose kind and code are taken from the family.
    pub fn from_family(id: LeafIdentifier, family: &'static StructuralFamily) -> Self {
        Self::new(id, family.three_letter, family.kind, family)
    }

    pub fn with_modified(mut self, modified: bool) -> Self {
        self.modified = modified;
        self
    }

    pub fn with_hetero(mut self, hetero: bool) -> Self {
        self.hetero = hetero;
        self
    }

    pub fn id(&self) -> &LeafIdentifier {
        &self.id
    }

    pub(crate) fn id_mut(&mut self) -> &mut LeafIdentifier {
        &mut self.id
    }

    pub fn kind(&self) -> LeafKind {
        self.kind
    }

    pub fn family(&self) -> &'static StructuralFamily {
        self.family
    }

    /// The three-letter code as read from the input.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The key used to compare leaves chemically: the family code for polymer residues
    /// (so `MSE` compares as `MET`) and the leaf's own code for ligands.
    pub fn family_key(&self) -> &str {
        match self.kind {
            LeafKind::AminoAcid | LeafKind::Nucleotide if !self.family.is_unknown() => {
                self.family.three_letter
            }
            _ => &self.code,
        }
    }

    pub fn one_letter(&self) -> char {
        self.family.one_letter
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn is_hetero(&self) -> bool {
        self.hetero
    }

    pub fn is_amino_acid(&self) -> bool {
        self.kind == LeafKind::AminoAcid
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, name: &str) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.name == name)
    }

    pub fn has_atom(&self, name: &str) -> bool {
        self.atom(name).is_some()
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    /// Inserts an atom keyed by name. An atom with the same name replaces the earlier one
    /// in place, keeping its position in the atom order.
    pub fn insert_atom(&mut self, atom: Atom) {
        match self.atoms.iter_mut().find(|a| a.name == atom.name) {
            Some(existing) => *existing = atom,
            None => self.atoms.push(atom),
        }
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Adds a bond if both atoms exist and the pair is not already connected.
    /// Returns whether the bond was added.
    pub fn add_bond(&mut self, first: &str, second: &str, order: BondOrder) -> bool {
        if !self.has_atom(first) || !self.has_atom(second) {
            return false;
        }
        let bond = Bond::new(first, second, order);
        if self.bonds.iter().any(|b| b.connects_same_atoms(&bond)) {
            return false;
        }
        self.bonds.push(bond);
        true
    }

    /// Absorbs the atoms of another leaf with the same identifier (last-one-wins per name).
    pub(crate) fn merge(&mut self, other: LeafSubstructure) {
        for atom in other.atoms {
            self.insert_atom(atom);
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = Point3<f64>> + '_ {
        self.atoms.iter().map(|a| a.position)
    }

    /// Applies a rigid-body transform `x -> R * x + t` to every atom.
    pub fn transform(&mut self, rotation: &Rotation3<f64>, translation: &Vector3<f64>) {
        for atom in &mut self.atoms {
            atom.position = rotation * atom.position + translation;
        }
    }

    pub fn transformed(&self, rotation: &Rotation3<f64>, translation: &Vector3<f64>) -> Self {
        let mut copy = self.clone();
        copy.transform(rotation, translation);
        copy
    }
}

impl fmt::Display for LeafSubstructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.code, self.id)
    }
}
