use crate::core::models::leaf::{LeafIdentifier, LeafSubstructure};
use std::cmp::Ordering;

/// One occurrence of the query motif in a target structure.
#[derive(Debug, Clone, PartialEq)]
pub struct Fit3DMatch {
    /// Identifier of the target structure the match was found in.
    pub target: String,
    /// Position of the target in the batch queue; 0 for single-target searches.
    pub target_index: usize,
    /// Order in which the match was found within its target.
    pub discovery_index: usize,
    pub rmsd: f64,
    pub p_value: Option<f64>,
    pub fitted_atom_count: usize,
    pub substitution_score: Option<i32>,
    /// Candidate leaves in motif order, transformed onto the query motif.
    pub leaves: Vec<LeafSubstructure>,
}

impl Fit3DMatch {
    pub fn leaf_ids(&self) -> impl Iterator<Item = &LeafIdentifier> {
        self.leaves.iter().map(LeafSubstructure::id)
    }

    /// A file-name friendly label, e.g. `1ABC_A-57_A-102_A-195`.
    pub fn label(&self) -> String {
        let mut label = self.target.clone();
        for id in self.leaf_ids() {
            label.push('_');
            label.push(id.chain);
            label.push('-');
            label.push_str(&id.serial.to_string());
            if let Some(code) = id.insertion_code {
                label.push(code);
            }
        }
        label
    }

    /// Total order used for merged result lists: RMSD, then queue position, then discovery.
    pub fn merge_order(&self, other: &Self) -> Ordering {
        self.rmsd
            .total_cmp(&other.rmsd)
            .then(self.target_index.cmp(&other.target_index))
            .then(self.discovery_index.cmp(&other.discovery_index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::family::StructuralFamily;

    fn fit(target_index: usize, discovery_index: usize, rmsd: f64) -> Fit3DMatch {
        let his = StructuralFamily::by_code("HIS").unwrap();
        Fit3DMatch {
            target: "1ABC".into(),
            target_index,
            discovery_index,
            rmsd,
            p_value: None,
            fitted_atom_count: 3,
            substitution_score: None,
            leaves: vec![
                LeafSubstructure::from_family(LeafIdentifier::new("1ABC", 1, 'A', 57, None), his),
                LeafSubstructure::from_family(
                    LeafIdentifier::new("1ABC", 1, 'B', 60, Some('A')),
                    his,
                ),
            ],
        }
    }

    #[test]
    fn label_lists_chain_and_serial_of_every_leaf() {
        assert_eq!(fit(0, 0, 0.5).label(), "1ABC_A-57_B-60A");
    }

    #[test]
    fn merge_order_breaks_ties_by_queue_then_discovery() {
        let mut matches = vec![fit(1, 0, 0.5), fit(0, 1, 0.5), fit(0, 0, 0.5), fit(2, 0, 0.1)];
        matches.sort_by(Fit3DMatch::merge_order);
        let keys: Vec<_> = matches
            .iter()
            .map(|m| (m.target_index, m.discovery_index))
            .collect();
        assert_eq!(keys, vec![(2, 0), (0, 0), (0, 1), (1, 0)]);
    }
}
