use crate::core::models::family::StructuralFamily;
use crate::core::models::leaf::LeafKind;
use crate::core::models::topology::{Bond, BondOrder};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::error;

const BUNDLED_SKELETONS: &str = include_str!("../../../data/skeletons.toml");

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum SkeletonFamily {
    AminoAcid,
    Nucleotide,
    ModifiedAminoAcid,
    ModifiedNucleotide,
    Ligand,
}

impl SkeletonFamily {
    pub fn is_modified(self) -> bool {
        matches!(self, Self::ModifiedAminoAcid | Self::ModifiedNucleotide)
    }

    pub fn leaf_kind(self) -> LeafKind {
        match self {
            Self::AminoAcid | Self::ModifiedAminoAcid => LeafKind::AminoAcid,
            Self::Nucleotide | Self::ModifiedNucleotide => LeafKind::Nucleotide,
            Self::Ligand => LeafKind::Ligand,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct RawSkeleton {
    parent: Option<String>,
    family: SkeletonFamily,
    #[serde(default)]
    bonds: Vec<(String, String, BondOrder)>,
}

/// Dictionary entry describing how a non-standard leaf is classified and connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafSkeleton {
    pub code: String,
    pub parent: Option<String>,
    pub family: SkeletonFamily,
    pub bonds: Vec<Bond>,
}

impl LeafSkeleton {
    /// The standard family this skeleton is classified as: the parent's family for
    /// polymer residues, the unknown-ligand family otherwise.
    pub fn structural_family(&self) -> &'static StructuralFamily {
        match self.family {
            SkeletonFamily::Ligand => StructuralFamily::unknown_ligand(),
            _ => self
                .parent
                .as_deref()
                .and_then(StructuralFamily::by_code)
                .unwrap_or_else(StructuralFamily::unknown_ligand),
        }
    }
}

/// Read-only map from three-letter codes to leaf skeletons.
#[derive(Debug, Clone, Default)]
pub struct SkeletonRegistry {
    registry: HashMap<String, LeafSkeleton>,
}

impl SkeletonRegistry {
    pub fn load(path: &Path) -> Result<Self, SkeletonLoadError> {
        let origin = path.to_string_lossy().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| SkeletonLoadError::Io {
            path: origin.clone(),
            source: e,
        })?;
        Self::from_toml_str(&content, &origin)
    }

    /// The dictionary shipped with the library, covering common modified residues,
    /// modified nucleotides and frequent ligands.
    pub fn bundled() -> Result<Self, SkeletonLoadError> {
        Self::from_toml_str(BUNDLED_SKELETONS, "<bundled>")
    }

    /// Process-wide read-only instance of the bundled dictionary, parsed on first use.
    pub fn shared() -> &'static Self {
        static SHARED: OnceLock<SkeletonRegistry> = OnceLock::new();
        SHARED.get_or_init(|| {
            Self::bundled().unwrap_or_else(|e| {
                error!("Bundled skeleton dictionary failed to load: {}", e);
                Self::default()
            })
        })
    }

    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, SkeletonLoadError> {
        let raw: HashMap<String, RawSkeleton> =
            toml::from_str(content).map_err(|e| SkeletonLoadError::Toml {
                path: origin.to_string(),
                source: e,
            })?;

        let mut registry = HashMap::with_capacity(raw.len());
        for (code, entry) in raw {
            if entry.family.is_modified() {
                let parent = entry
                    .parent
                    .as_deref()
                    .ok_or_else(|| SkeletonLoadError::MissingParent { code: code.clone() })?;
                if StructuralFamily::by_code(parent).is_none() {
                    return Err(SkeletonLoadError::UnknownParent {
                        code,
                        parent: parent.to_string(),
                    });
                }
            }
            let bonds = entry
                .bonds
                .into_iter()
                .map(|(a, b, order)| Bond::new(a, b, order))
                .collect();
            registry.insert(
                code.clone(),
                LeafSkeleton {
                    code,
                    parent: entry.parent,
                    family: entry.family,
                    bonds,
                },
            );
        }
        Ok(Self { registry })
    }

    pub fn get(&self, code: &str) -> Option<&LeafSkeleton> {
        self.registry.get(code)
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum SkeletonLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Modified leaf '{code}' does not declare a parent")]
    MissingParent { code: String },
    #[error("Leaf '{code}' declares unknown parent '{parent}'")]
    UnknownParent { code: String, parent: String },
}
