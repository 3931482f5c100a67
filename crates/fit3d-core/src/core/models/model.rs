use super::chain::Chain;
use super::leaf::LeafSubstructure;

#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub serial: u32,
    pub(crate) chains: Vec<Chain>,
}

impl Model {
    pub fn new(serial: u32) -> Self {
        Self {
            serial,
            chains: Vec::new(),
        }
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn chain(&self, id: char) -> Option<&Chain> {
        self.chains.iter().find(|c| c.id == id)
    }

    /// Attaches a chain. A chain id that is already present is reopened and receives the
    /// new leaves, so chain ids stay unique within a model.
    pub fn add_chain(&mut self, chain: Chain) {
        match self.chains.iter_mut().find(|c| c.id == chain.id) {
            Some(existing) => existing.absorb(chain),
            None => self.chains.push(chain),
        }
    }

    pub fn leaves(&self) -> impl Iterator<Item = &LeafSubstructure> {
        self.chains.iter().flat_map(|c| c.leaves().iter())
    }

    pub(crate) fn leaves_mut(&mut self) -> impl Iterator<Item = &mut LeafSubstructure> {
        self.chains.iter_mut().flat_map(|c| c.leaves_mut().iter_mut())
    }

    pub fn is_empty(&self) -> bool {
        self.chains.iter().all(Chain::is_empty)
    }
}
