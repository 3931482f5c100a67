use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "String")]
#[repr(u8)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
    Aromatic,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid bond order string: '{0}'")]
pub struct ParseBondOrderError(pub String);

impl FromStr for BondOrder {
    type Err = ParseBondOrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1" | "s" | "sing" | "single" => Ok(Self::Single),
            "2" | "d" | "doub" | "double" => Ok(Self::Double),
            "3" | "t" | "trip" | "triple" => Ok(Self::Triple),
            "ar" | "arom" | "aromatic" => Ok(Self::Aromatic),
            _ => Err(ParseBondOrderError(s.to_string())),
        }
    }
}

impl TryFrom<String> for BondOrder {
    type Error = ParseBondOrderError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for BondOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Single => "Single",
                Self::Double => "Double",
                Self::Triple => "Triple",
                Self::Aromatic => "Aromatic",
            }
        )
    }
}

/// A covalent bond between two atoms of the same leaf substructure, addressed by atom name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bond {
    pub first: String,
    pub second: String,
    pub order: BondOrder,
}

impl Bond {
    pub fn new(first: impl Into<String>, second: impl Into<String>, order: BondOrder) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            order,
        }
    }

    pub fn contains(&self, atom_name: &str) -> bool {
        self.first == atom_name || self.second == atom_name
    }

    /// Returns `true` if both bonds connect the same pair of atoms, regardless of direction.
    pub fn connects_same_atoms(&self, other: &Bond) -> bool {
        (self.first == other.first && self.second == other.second)
            || (self.first == other.second && self.second == other.first)
    }
}
