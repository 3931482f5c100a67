use phf::{Set, phf_set};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static AROMATIC: Set<&'static str> = phf_set! { "PHE", "TYR", "TRP", "HIS" };
static ACIDIC: Set<&'static str> = phf_set! { "ASP", "GLU" };
static BASIC: Set<&'static str> = phf_set! { "LYS", "ARG", "HIS" };
static AMIDE: Set<&'static str> = phf_set! { "ASN", "GLN" };
static HYDROXYL: Set<&'static str> = phf_set! { "SER", "THR", "TYR" };
static SULFUR_CONTAINING: Set<&'static str> = phf_set! { "CYS", "MET" };
static ALIPHATIC: Set<&'static str> = phf_set! { "ALA", "VAL", "LEU", "ILE" };

/// Groups of amino acids that may replace each other at a motif position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExchangeGroup {
    Aromatic,
    Acidic,
    Basic,
    Amide,
    Hydroxyl,
    SulfurContaining,
    Aliphatic,
}

impl ExchangeGroup {
    pub const ALL: [ExchangeGroup; 7] = [
        Self::Aromatic,
        Self::Acidic,
        Self::Basic,
        Self::Amide,
        Self::Hydroxyl,
        Self::SulfurContaining,
        Self::Aliphatic,
    ];

    fn members(self) -> &'static Set<&'static str> {
        match self {
            Self::Aromatic => &AROMATIC,
            Self::Acidic => &ACIDIC,
            Self::Basic => &BASIC,
            Self::Amide => &AMIDE,
            Self::Hydroxyl => &HYDROXYL,
            Self::SulfurContaining => &SULFUR_CONTAINING,
            Self::Aliphatic => &ALIPHATIC,
        }
    }

    pub fn contains(self, code: &str) -> bool {
        self.members().contains(code)
    }

    pub fn families(self) -> impl Iterator<Item = &'static str> {
        self.members().iter().copied()
    }

    /// Every family sharing at least one group with `code`, excluding `code` itself.
    pub fn families_for(code: &str) -> BTreeSet<&'static str> {
        Self::ALL
            .iter()
            .filter(|group| group.contains(code))
            .flat_map(|group| group.families())
            .filter(|&family| family != code)
            .collect()
    }
}

impl fmt::Display for ExchangeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Aromatic => "aromatic",
            Self::Acidic => "acidic",
            Self::Basic => "basic",
            Self::Amide => "amide",
            Self::Hydroxyl => "hydroxyl",
            Self::SulfurContaining => "sulfur-containing",
            Self::Aliphatic => "aliphatic",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown exchange group '{0}'")]
pub struct ParseExchangeGroupError(pub String);

impl FromStr for ExchangeGroup {
    type Err = ParseExchangeGroupError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|group| group.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseExchangeGroupError(s.to_string()))
    }
}
