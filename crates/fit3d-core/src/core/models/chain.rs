use super::leaf::{LeafKind, LeafSubstructure};

#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub id: char,                            // Chain identifier (e.g., 'A', 'B')
    pub(crate) leaves: Vec<LeafSubstructure>, // Leaves in input order
}

impl Chain {
    pub fn new(id: char) -> Self {
        Self {
            id,
            leaves: Vec::new(),
        }
    }

    pub fn leaves(&self) -> &[LeafSubstructure] {
        &self.leaves
    }

    pub fn leaves_mut(&mut self) -> &mut [LeafSubstructure] {
        &mut self.leaves
    }

    pub fn leaf(&self, serial: i32, insertion_code: Option<char>) -> Option<&LeafSubstructure> {
        self.leaves
            .iter()
            .find(|l| l.id().residue_key() == (serial, insertion_code))
    }

    pub fn amino_acids(&self) -> impl Iterator<Item = &LeafSubstructure> {
        self.leaves.iter().filter(|l| l.kind() == LeafKind::AminoAcid)
    }

    /// Appends a leaf, or merges it into an existing leaf with the same residue key.
    pub fn add_leaf(&mut self, leaf: LeafSubstructure) {
        let key = leaf.id().residue_key();
        match self.leaves.iter_mut().find(|l| l.id().residue_key() == key) {
            Some(existing) => existing.merge(leaf),
            None => self.leaves.push(leaf),
        }
    }

    /// Moves all leaves of `other` into this chain, merging duplicates.
    pub(crate) fn absorb(&mut self, other: Chain) {
        for leaf in other.leaves {
            self.add_leaf(leaf);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}
