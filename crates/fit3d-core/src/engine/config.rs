use super::representation::RepresentationScheme;
use super::statistics::StatisticalModelKind;
use super::superimposition::AtomSelection;
use crate::core::models::structure::Structure;
use crate::core::utils::identifiers::is_backbone_atom;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_RMSD_CUTOFF: f64 = 2.5;
pub const DEFAULT_DISTANCE_TOLERANCE: f64 = 1.0;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Target structures a batch skips without searching them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipRule {
    /// Every amino acid carries only its alpha carbon.
    AlphaCarbonOnly,
    /// Every amino acid carries only backbone atoms.
    BackboneOnly,
}

impl SkipRule {
    pub fn applies(&self, structure: &Structure) -> bool {
        let mut amino_acids = structure.leaves().filter(|l| l.is_amino_acid()).peekable();
        if amino_acids.peek().is_none() {
            return false;
        }
        match self {
            Self::AlphaCarbonOnly => {
                amino_acids.all(|l| l.atoms().iter().all(|a| a.name == "CA"))
            }
            Self::BackboneOnly => {
                amino_acids.all(|l| l.atoms().iter().all(|a| is_backbone_atom(&a.name)))
            }
        }
    }
}

impl fmt::Display for SkipRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AlphaCarbonOnly => "ca-only",
            Self::BackboneOnly => "backbone-only",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown skip rule '{0}'")]
pub struct ParseSkipRuleError(pub String);

impl FromStr for SkipRule {
    type Err = ParseSkipRuleError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ca-only" => Ok(Self::AlphaCarbonOnly),
            "backbone-only" => Ok(Self::BackboneOnly),
            _ => Err(ParseSkipRuleError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fit3DConfig {
    pub rmsd_cutoff: f64,
    pub distance_tolerance: f64,
    pub atom_selection: AtomSelection,
    pub representation: Option<RepresentationScheme>,
    /// Additional family codes admissible at a motif position, keyed by position index.
    pub exchanges: BTreeMap<usize, BTreeSet<String>>,
    /// Adds the members of every exchange group a motif family belongs to.
    pub use_exchange_groups: bool,
    /// Minimum summed BLOSUM62 score of a match against the motif.
    pub substitution_min_score: Option<i32>,
}

impl Default for Fit3DConfig {
    fn default() -> Self {
        Self {
            rmsd_cutoff: DEFAULT_RMSD_CUTOFF,
            distance_tolerance: DEFAULT_DISTANCE_TOLERANCE,
            atom_selection: AtomSelection::All,
            representation: None,
            exchanges: BTreeMap::new(),
            use_exchange_groups: false,
            substitution_min_score: None,
        }
    }
}

#[derive(Default)]
pub struct Fit3DConfigBuilder {
    rmsd_cutoff: Option<f64>,
    distance_tolerance: Option<f64>,
    atom_selection: Option<AtomSelection>,
    representation: Option<RepresentationScheme>,
    exchanges: BTreeMap<usize, BTreeSet<String>>,
    use_exchange_groups: bool,
    substitution_min_score: Option<i32>,
}

impl Fit3DConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rmsd_cutoff(mut self, cutoff: f64) -> Self {
        self.rmsd_cutoff = Some(cutoff);
        self
    }
    pub fn distance_tolerance(mut self, tolerance: f64) -> Self {
        self.distance_tolerance = Some(tolerance);
        self
    }
    pub fn atom_selection(mut self, selection: AtomSelection) -> Self {
        self.atom_selection = Some(selection);
        self
    }
    pub fn representation(mut self, scheme: RepresentationScheme) -> Self {
        self.representation = Some(scheme);
        self
    }
    pub fn exchange<I, S>(mut self, position: usize, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exchanges
            .entry(position)
            .or_default()
            .extend(families.into_iter().map(Into::into));
        self
    }
    pub fn use_exchange_groups(mut self, enabled: bool) -> Self {
        self.use_exchange_groups = enabled;
        self
    }
    pub fn substitution_min_score(mut self, score: i32) -> Self {
        self.substitution_min_score = Some(score);
        self
    }

    pub fn build(self) -> Result<Fit3DConfig, ConfigError> {
        let rmsd_cutoff = self.rmsd_cutoff.unwrap_or(DEFAULT_RMSD_CUTOFF);
        if !(rmsd_cutoff.is_finite() && rmsd_cutoff > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "rmsd_cutoff",
                reason: format!("must be a positive number, got {}", rmsd_cutoff),
            });
        }
        let distance_tolerance = self.distance_tolerance.unwrap_or(DEFAULT_DISTANCE_TOLERANCE);
        if !(distance_tolerance.is_finite() && distance_tolerance >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "distance_tolerance",
                reason: format!("must be a non-negative number, got {}", distance_tolerance),
            });
        }
        Ok(Fit3DConfig {
            rmsd_cutoff,
            distance_tolerance,
            atom_selection: self.atom_selection.unwrap_or_default(),
            representation: self.representation,
            exchanges: self.exchanges,
            use_exchange_groups: self.use_exchange_groups,
            substitution_min_score: self.substitution_min_score,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub alignment: Fit3DConfig,
    /// Worker pool size; 0 lets the pool pick the number of logical CPUs.
    pub threads: usize,
    pub statistical_model: Option<StatisticalModelKind>,
    pub skip_rules: Vec<SkipRule>,
}

#[derive(Default)]
pub struct BatchConfigBuilder {
    alignment: Option<Fit3DConfig>,
    threads: Option<usize>,
    statistical_model: Option<StatisticalModelKind>,
    skip_rules: Vec<SkipRule>,
}

impl BatchConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alignment(mut self, config: Fit3DConfig) -> Self {
        self.alignment = Some(config);
        self
    }
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }
    pub fn statistical_model(mut self, model: StatisticalModelKind) -> Self {
        self.statistical_model = Some(model);
        self
    }
    pub fn skip_rule(mut self, rule: SkipRule) -> Self {
        if !self.skip_rules.contains(&rule) {
            self.skip_rules.push(rule);
        }
        self
    }

    pub fn build(self) -> Result<BatchConfig, ConfigError> {
        Ok(BatchConfig {
            alignment: self
                .alignment
                .ok_or(ConfigError::MissingParameter("alignment"))?,
            threads: self.threads.unwrap_or(0),
            statistical_model: self.statistical_model,
            skip_rules: self.skip_rules,
        })
    }
}
