use crate::core::models::leaf::LeafSubstructure;
use std::collections::BTreeSet;
use tracing::trace;

/// The admissible family keys of one query motif position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotifPosition {
    pub primary: String,
    pub exchanges: BTreeSet<String>,
}

impl MotifPosition {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            exchanges: BTreeSet::new(),
        }
    }

    pub fn with_exchanges<I, S>(mut self, exchanges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exchanges.extend(exchanges.into_iter().map(Into::into));
        self
    }

    pub fn accepts(&self, family_key: &str) -> bool {
        self.primary == family_key || self.exchanges.contains(family_key)
    }
}

/// Enumerates injective mappings of motif positions onto environment leaves.
#[derive(Debug, Clone)]
pub struct ValidCandidateGenerator {
    positions: Vec<MotifPosition>,
}

impl ValidCandidateGenerator {
    pub fn new(positions: Vec<MotifPosition>) -> Self {
        Self { positions }
    }

    pub fn positions(&self) -> &[MotifPosition] {
        &self.positions
    }

    /// Whether a leaf is admissible at any motif position.
    pub fn admits(&self, leaf: &LeafSubstructure) -> bool {
        let key = leaf.family_key();
        self.positions.iter().any(|p| p.accepts(key))
    }

    /// Returns every mapping as a list of environment indices, one per motif position.
    ///
    /// Partial mappings are extended position by position; an extension that reuses a leaf
    /// already assigned in that mapping is discarded. Empty for an empty motif or an empty
    /// environment.
    pub fn generate(&self, environment: &[&LeafSubstructure]) -> Vec<Vec<usize>> {
        if self.positions.is_empty() || environment.is_empty() {
            return Vec::new();
        }

        let acceptable: Vec<Vec<usize>> = self
            .positions
            .iter()
            .map(|position| {
                environment
                    .iter()
                    .enumerate()
                    .filter(|(_, leaf)| position.accepts(leaf.family_key()))
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect();

        let mut partial: Vec<Vec<usize>> = vec![Vec::with_capacity(self.positions.len())];
        for candidates in &acceptable {
            let mut extended = Vec::with_capacity(partial.len() * candidates.len());
            for mapping in &partial {
                for &leaf in candidates {
                    if mapping.contains(&leaf) {
                        continue;
                    }
                    let mut next = mapping.clone();
                    next.push(leaf);
                    extended.push(next);
                }
            }
            partial = extended;
            if partial.is_empty() {
                break;
            }
        }

        trace!(
            positions = self.positions.len(),
            environment = environment.len(),
            mappings = partial.len(),
            "Candidate mappings generated."
        );
        partial
    }
}
