use super::chain::Chain;
use super::leaf::{LeafIdentifier, LeafSubstructure};
use super::model::Model;

/// The root of the structure hierarchy.
///
/// A single-model structure holds exactly one implicit model with serial 1 and reports
/// `is_multi_model() == false`; writers omit MODEL/ENDMDL records for it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Structure {
    id: String,
    title: Option<String>,
    multi_model: bool,
    models: Vec<Model>,
}

impl Structure {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub(crate) fn from_parts(
        id: String,
        title: Option<String>,
        multi_model: bool,
        models: Vec<Model>,
    ) -> Self {
        Self {
            id,
            title,
            multi_model,
            models,
        }
    }

    /// Assembles a single-model structure from loose leaves, grouping them by chain id in
    /// order of first appearance.
    pub fn from_leaves(id: impl Into<String>, leaves: impl IntoIterator<Item = LeafSubstructure>) -> Self {
        let mut model = Model::new(1);
        for leaf in leaves {
            let mut chain = Chain::new(leaf.id().chain);
            chain.add_leaf(leaf);
            model.add_chain(chain);
        }
        Self {
            id: id.into(),
            title: None,
            multi_model: false,
            models: vec![model],
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Renames the structure, updating the identifiers of all its leaves.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
        for model in &mut self.models {
            for leaf in model.leaves_mut() {
                leaf.id_mut().structure_id = self.id.clone();
            }
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    pub fn is_multi_model(&self) -> bool {
        self.multi_model
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn model(&self, serial: u32) -> Option<&Model> {
        self.models.iter().find(|m| m.serial == serial)
    }

    pub fn first_model(&self) -> Option<&Model> {
        self.models.first()
    }

    /// Chains of the first model; for single-model structures these are all chains.
    pub fn chains(&self) -> &[Chain] {
        self.first_model().map(Model::chains).unwrap_or(&[])
    }

    /// Leaves of the first model.
    pub fn leaves(&self) -> impl Iterator<Item = &LeafSubstructure> {
        self.models.iter().take(1).flat_map(Model::leaves)
    }

    pub fn all_leaves(&self) -> impl Iterator<Item = &LeafSubstructure> {
        self.models.iter().flat_map(Model::leaves)
    }

    pub fn leaf(&self, id: &LeafIdentifier) -> Option<&LeafSubstructure> {
        self.model(id.model)?
            .chain(id.chain)?
            .leaf(id.serial, id.insertion_code)
    }

    pub fn atom_count(&self) -> usize {
        self.all_leaves().map(LeafSubstructure::atom_count).sum()
    }

    pub(crate) fn leaves_mut(&mut self) -> impl Iterator<Item = &mut LeafSubstructure> {
        self.models.iter_mut().flat_map(Model::leaves_mut)
    }
}
