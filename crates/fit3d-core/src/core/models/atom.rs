use nalgebra::Point3;
use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

static ELEMENTS: Map<&'static str, u8> = phf_map! {
    "H" => 1, "D" => 1, "HE" => 2,
    "LI" => 3, "BE" => 4, "B" => 5, "C" => 6, "N" => 7, "O" => 8, "F" => 9, "NE" => 10,
    "NA" => 11, "MG" => 12, "AL" => 13, "SI" => 14, "P" => 15, "S" => 16, "CL" => 17, "AR" => 18,
    "K" => 19, "CA" => 20, "SC" => 21, "TI" => 22, "V" => 23, "CR" => 24, "MN" => 25, "FE" => 26,
    "CO" => 27, "NI" => 28, "CU" => 29, "ZN" => 30, "GA" => 31, "GE" => 32, "AS" => 33, "SE" => 34,
    "BR" => 35, "KR" => 36, "RB" => 37, "SR" => 38, "Y" => 39, "ZR" => 40, "NB" => 41, "MO" => 42,
    "TC" => 43, "RU" => 44, "RH" => 45, "PD" => 46, "AG" => 47, "CD" => 48, "IN" => 49, "SN" => 50,
    "SB" => 51, "TE" => 52, "I" => 53, "XE" => 54, "CS" => 55, "BA" => 56, "LA" => 57, "CE" => 58,
    "PR" => 59, "ND" => 60, "PM" => 61, "SM" => 62, "EU" => 63, "GD" => 64, "TB" => 65, "DY" => 66,
    "HO" => 67, "ER" => 68, "TM" => 69, "YB" => 70, "LU" => 71, "HF" => 72, "TA" => 73, "W" => 74,
    "RE" => 75, "OS" => 76, "IR" => 77, "PT" => 78, "AU" => 79, "HG" => 80, "TL" => 81, "PB" => 82,
    "BI" => 83, "PO" => 84, "AT" => 85, "RN" => 86, "FR" => 87, "RA" => 88, "AC" => 89, "TH" => 90,
    "PA" => 91, "U" => 92, "NP" => 93, "PU" => 94, "AM" => 95, "CM" => 96,
    "X" => 0,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unrecognized element symbol: '{0}'")]
pub struct UnknownElementError(pub String);

/// A chemical element, identified by its upper-case symbol as written in PDB files.
///
/// The symbol `X` denotes an unknown atom type (atomic number 0), which PDB files use for
/// dummy or unassigned atoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Element {
    symbol: &'static str,
    atomic_number: u8,
}

impl Element {
    pub const CARBON: Element = Element {
        symbol: "C",
        atomic_number: 6,
    };
    pub const NITROGEN: Element = Element {
        symbol: "N",
        atomic_number: 7,
    };
    pub const OXYGEN: Element = Element {
        symbol: "O",
        atomic_number: 8,
    };

    /// Looks up an element by symbol; matching is case-insensitive and ignores surrounding whitespace.
    pub fn from_symbol(symbol: &str) -> Result<Self, UnknownElementError> {
        let normalized = symbol.trim().to_ascii_uppercase();
        ELEMENTS
            .get_entry(normalized.as_str())
            .map(|(&symbol, &atomic_number)| Element {
                symbol,
                atomic_number,
            })
            .ok_or_else(|| UnknownElementError(symbol.trim().to_string()))
    }

    /// Infers the element from the raw, untrimmed 4-column atom name field.
    ///
    /// Follows the PDB alignment convention: one-letter elements leave column 13 blank (or
    /// hold a digit there for legacy hydrogen names), while two-letter elements start in
    /// column 13. Four-character names starting with `H` are hydrogens.
    pub fn infer_from_atom_name(raw_name: &str) -> Result<Self, UnknownElementError> {
        let trimmed = raw_name.trim();
        let first_alpha = trimmed.chars().find(|c| c.is_ascii_alphabetic());
        let Some(first_alpha) = first_alpha else {
            return Err(UnknownElementError(trimmed.to_string()));
        };

        let starts_in_column_13 = raw_name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic());
        let is_long_hydrogen_name = trimmed.len() == 4 && first_alpha.eq_ignore_ascii_case(&'H');

        if starts_in_column_13 && !is_long_hydrogen_name {
            let two_letters: String = raw_name.chars().take(2).collect();
            if two_letters.chars().all(|c| c.is_ascii_alphabetic()) {
                if let Ok(element) = Self::from_symbol(&two_letters) {
                    return Ok(element);
                }
            }
        }

        Self::from_symbol(&first_alpha.to_string())
    }

    pub fn symbol(&self) -> &'static str {
        self.symbol
    }

    pub fn atomic_number(&self) -> u8 {
        self.atomic_number
    }

    pub fn is_hydrogen(&self) -> bool {
        self.atomic_number == 1
    }
}

impl FromStr for Element {
    type Err = UnknownElementError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbol(s)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol)
    }
}

/// A single atom of a leaf substructure.
///
/// Serials are unique within the owning leaf. Occupancy, temperature factor and formal
/// charge are optional because many structure sources leave those columns blank.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The atom serial number as read from the input.
    pub serial: u32,
    /// The atom name (e.g., "CA", "OD1"), trimmed.
    pub name: String,
    /// The chemical element.
    pub element: Element,
    /// The 3D coordinates of the atom in Angstroms.
    pub position: Point3<f64>,
    /// The alternate location indicator, if any.
    pub alt_loc: Option<char>,
    /// The crystallographic occupancy.
    pub occupancy: Option<f64>,
    /// The temperature (B) factor.
    pub b_factor: Option<f64>,
    /// The formal charge.
    pub charge: Option<i8>,
}

impl Atom {
    pub fn new(serial: u32, name: &str, element: Element, position: Point3<f64>) -> Self {
        Self {
            serial,
            name: name.to_string(),
            element,
            position,
            alt_loc: None,
            occupancy: None,
            b_factor: None,
            charge: None,
        }
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element.is_hydrogen()
    }
}
