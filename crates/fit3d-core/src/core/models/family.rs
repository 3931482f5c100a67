use super::leaf::LeafKind;
use super::topology::BondOrder::{self, Aromatic, Double, Single};
use phf::{Map, phf_map};

/// A static bond template: pairs of atom names with their bond order.
pub type BondTemplate = &'static [(&'static str, &'static str, BondOrder)];

/// An immutable entry of the structural family registry.
///
/// For amino acids the backbone is N, CA, C, O (plus the terminal OXT); for nucleotides
/// it is the sugar-phosphate moiety and the "sidechain" is the base. Atom names are listed
/// in canonical order, which representation schemes rely on.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct StructuralFamily {
    pub one_letter: char,
    pub three_letter: &'static str,
    pub kind: LeafKind,
    pub backbone_atoms: &'static [&'static str],
    pub sidechain_atoms: &'static [&'static str],
    pub backbone_bonds: BondTemplate,
    pub sidechain_bonds: BondTemplate,
}

impl StructuralFamily {
    /// Looks up a standard family by its three-letter code.
    pub fn by_code(code: &str) -> Option<&'static StructuralFamily> {
        FAMILIES.get(code)
    }

    /// Looks up a standard amino acid by its one-letter code.
    pub fn amino_acid_by_one_letter(one_letter: char) -> Option<&'static StructuralFamily> {
        FAMILIES
            .values()
            .find(|f| f.kind == LeafKind::AminoAcid && f.one_letter == one_letter)
    }

    /// The family assigned to leaves whose code is neither a standard residue nor resolvable
    /// through the skeleton dictionary.
    pub fn unknown_ligand() -> &'static StructuralFamily {
        &UNKNOWN_LIGAND
    }

    pub fn all() -> impl Iterator<Item = &'static StructuralFamily> {
        FAMILIES.values()
    }

    pub fn is_unknown(&self) -> bool {
        std::ptr::eq(self, &UNKNOWN_LIGAND)
    }

    pub fn atom_names(&self) -> impl Iterator<Item = &'static str> {
        self.backbone_atoms
            .iter()
            .chain(self.sidechain_atoms.iter())
            .copied()
    }

    pub fn allows_atom(&self, name: &str) -> bool {
        self.atom_names().any(|n| n == name)
    }

    pub fn bond_template(&self) -> impl Iterator<Item = &'static (&'static str, &'static str, BondOrder)> {
        self.backbone_bonds.iter().chain(self.sidechain_bonds.iter())
    }
}

static UNKNOWN_LIGAND: StructuralFamily = StructuralFamily {
    one_letter: 'X',
    three_letter: "UNL",
    kind: LeafKind::Ligand,
    backbone_atoms: &[],
    sidechain_atoms: &[],
    backbone_bonds: &[],
    sidechain_bonds: &[],
};

const AMINO_BACKBONE: &[&str] = &["N", "CA", "C", "O", "OXT"];
const AMINO_BACKBONE_BONDS: BondTemplate = &[
    ("N", "CA", Single),
    ("CA", "C", Single),
    ("C", "O", Double),
    ("C", "OXT", Single),
];

const RNA_BACKBONE: &[&str] = &[
    "P", "OP1", "OP2", "O5'", "C5'", "C4'", "O4'", "C3'", "O3'", "C2'", "O2'", "C1'",
];
const RNA_BACKBONE_BONDS: BondTemplate = &[
    ("P", "OP1", Double),
    ("P", "OP2", Single),
    ("P", "O5'", Single),
    ("O5'", "C5'", Single),
    ("C5'", "C4'", Single),
    ("C4'", "O4'", Single),
    ("C4'", "C3'", Single),
    ("C3'", "O3'", Single),
    ("C3'", "C2'", Single),
    ("C2'", "O2'", Single),
    ("C2'", "C1'", Single),
    ("C1'", "O4'", Single),
];
const DNA_BACKBONE: &[&str] = &[
    "P", "OP1", "OP2", "O5'", "C5'", "C4'", "O4'", "C3'", "O3'", "C2'", "C1'",
];
const DNA_BACKBONE_BONDS: BondTemplate = &[
    ("P", "OP1", Double),
    ("P", "OP2", Single),
    ("P", "O5'", Single),
    ("O5'", "C5'", Single),
    ("C5'", "C4'", Single),
    ("C4'", "O4'", Single),
    ("C4'", "C3'", Single),
    ("C3'", "O3'", Single),
    ("C3'", "C2'", Single),
    ("C2'", "C1'", Single),
    ("C1'", "O4'", Single),
];

const ADENINE: &[&str] = &["N9", "C8", "N7", "C5", "C6", "N6", "N1", "C2", "N3", "C4"];
const ADENINE_BONDS: BondTemplate = &[
    ("C1'", "N9", Single),
    ("N9", "C8", Aromatic),
    ("C8", "N7", Aromatic),
    ("N7", "C5", Aromatic),
    ("C5", "C6", Aromatic),
    ("C6", "N6", Single),
    ("C6", "N1", Aromatic),
    ("N1", "C2", Aromatic),
    ("C2", "N3", Aromatic),
    ("N3", "C4", Aromatic),
    ("C4", "C5", Aromatic),
    ("C4", "N9", Aromatic),
];
const GUANINE: &[&str] = &[
    "N9", "C8", "N7", "C5", "C6", "O6", "N1", "C2", "N2", "N3", "C4",
];
const GUANINE_BONDS: BondTemplate = &[
    ("C1'", "N9", Single),
    ("N9", "C8", Aromatic),
    ("C8", "N7", Aromatic),
    ("N7", "C5", Aromatic),
    ("C5", "C6", Aromatic),
    ("C6", "O6", Double),
    ("C6", "N1", Aromatic),
    ("N1", "C2", Aromatic),
    ("C2", "N2", Single),
    ("C2", "N3", Aromatic),
    ("N3", "C4", Aromatic),
    ("C4", "C5", Aromatic),
    ("C4", "N9", Aromatic),
];
const CYTOSINE: &[&str] = &["N1", "C2", "O2", "N3", "C4", "N4", "C5", "C6"];
const CYTOSINE_BONDS: BondTemplate = &[
    ("C1'", "N1", Single),
    ("N1", "C2", Aromatic),
    ("C2", "O2", Double),
    ("C2", "N3", Aromatic),
    ("N3", "C4", Aromatic),
    ("C4", "N4", Single),
    ("C4", "C5", Aromatic),
    ("C5", "C6", Aromatic),
    ("C6", "N1", Aromatic),
];
const URACIL: &[&str] = &["N1", "C2", "O2", "N3", "C4", "O4", "C5", "C6"];
const URACIL_BONDS: BondTemplate = &[
    ("C1'", "N1", Single),
    ("N1", "C2", Aromatic),
    ("C2", "O2", Double),
    ("C2", "N3", Aromatic),
    ("N3", "C4", Aromatic),
    ("C4", "O4", Double),
    ("C4", "C5", Aromatic),
    ("C5", "C6", Aromatic),
    ("C6", "N1", Aromatic),
];
const THYMINE: &[&str] = &["N1", "C2", "O2", "N3", "C4", "O4", "C5", "C7", "C6"];
const THYMINE_BONDS: BondTemplate = &[
    ("C1'", "N1", Single),
    ("N1", "C2", Aromatic),
    ("C2", "O2", Double),
    ("C2", "N3", Aromatic),
    ("N3", "C4", Aromatic),
    ("C4", "O4", Double),
    ("C4", "C5", Aromatic),
    ("C5", "C7", Single),
    ("C5", "C6", Aromatic),
    ("C6", "N1", Aromatic),
];

static FAMILIES: Map<&'static str, StructuralFamily> = phf_map! {
    "ALA" => StructuralFamily {
        one_letter: 'A', three_letter: "ALA", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE, sidechain_atoms: &["CB"],
        backbone_bonds: AMINO_BACKBONE_BONDS, sidechain_bonds: &[("CA", "CB", Single)],
    },
    "ARG" => StructuralFamily {
        one_letter: 'R', three_letter: "ARG", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE,
        sidechain_atoms: &["CB", "CG", "CD", "NE", "CZ", "NH1", "NH2"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[
            ("CA", "CB", Single), ("CB", "CG", Single), ("CG", "CD", Single),
            ("CD", "NE", Single), ("NE", "CZ", Single), ("CZ", "NH1", Single),
            ("CZ", "NH2", Double),
        ],
    },
    "ASN" => StructuralFamily {
        one_letter: 'N', three_letter: "ASN", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE, sidechain_atoms: &["CB", "CG", "OD1", "ND2"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[
            ("CA", "CB", Single), ("CB", "CG", Single), ("CG", "OD1", Double),
            ("CG", "ND2", Single),
        ],
    },
    "ASP" => StructuralFamily {
        one_letter: 'D', three_letter: "ASP", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE, sidechain_atoms: &["CB", "CG", "OD1", "OD2"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[
            ("CA", "CB", Single), ("CB", "CG", Single), ("CG", "OD1", Double),
            ("CG", "OD2", Single),
        ],
    },
    "CYS" => StructuralFamily {
        one_letter: 'C', three_letter: "CYS", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE, sidechain_atoms: &["CB", "SG"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[("CA", "CB", Single), ("CB", "SG", Single)],
    },
    "GLN" => StructuralFamily {
        one_letter: 'Q', three_letter: "GLN", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE, sidechain_atoms: &["CB", "CG", "CD", "OE1", "NE2"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[
            ("CA", "CB", Single), ("CB", "CG", Single), ("CG", "CD", Single),
            ("CD", "OE1", Double), ("CD", "NE2", Single),
        ],
    },
    "GLU" => StructuralFamily {
        one_letter: 'E', three_letter: "GLU", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE, sidechain_atoms: &["CB", "CG", "CD", "OE1", "OE2"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[
            ("CA", "CB", Single), ("CB", "CG", Single), ("CG", "CD", Single),
            ("CD", "OE1", Double), ("CD", "OE2", Single),
        ],
    },
    "GLY" => StructuralFamily {
        one_letter: 'G', three_letter: "GLY", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE, sidechain_atoms: &[],
        backbone_bonds: AMINO_BACKBONE_BONDS, sidechain_bonds: &[],
    },
    "HIS" => StructuralFamily {
        one_letter: 'H', three_letter: "HIS", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE,
        sidechain_atoms: &["CB", "CG", "ND1", "CD2", "CE1", "NE2"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[
            ("CA", "CB", Single), ("CB", "CG", Single), ("CG", "ND1", Aromatic),
            ("CG", "CD2", Aromatic), ("ND1", "CE1", Aromatic), ("CD2", "NE2", Aromatic),
            ("CE1", "NE2", Aromatic),
        ],
    },
    "ILE" => StructuralFamily {
        one_letter: 'I', three_letter: "ILE", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE, sidechain_atoms: &["CB", "CG1", "CG2", "CD1"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[
            ("CA", "CB", Single), ("CB", "CG1", Single), ("CB", "CG2", Single),
            ("CG1", "CD1", Single),
        ],
    },
    "LEU" => StructuralFamily {
        one_letter: 'L', three_letter: "LEU", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE, sidechain_atoms: &["CB", "CG", "CD1", "CD2"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[
            ("CA", "CB", Single), ("CB", "CG", Single), ("CG", "CD1", Single),
            ("CG", "CD2", Single),
        ],
    },
    "LYS" => StructuralFamily {
        one_letter: 'K', three_letter: "LYS", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE, sidechain_atoms: &["CB", "CG", "CD", "CE", "NZ"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[
            ("CA", "CB", Single), ("CB", "CG", Single), ("CG", "CD", Single),
            ("CD", "CE", Single), ("CE", "NZ", Single),
        ],
    },
    "MET" => StructuralFamily {
        one_letter: 'M', three_letter: "MET", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE, sidechain_atoms: &["CB", "CG", "SD", "CE"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[
            ("CA", "CB", Single), ("CB", "CG", Single), ("CG", "SD", Single),
            ("SD", "CE", Single),
        ],
    },
    "PHE" => StructuralFamily {
        one_letter: 'F', three_letter: "PHE", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE,
        sidechain_atoms: &["CB", "CG", "CD1", "CD2", "CE1", "CE2", "CZ"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[
            ("CA", "CB", Single), ("CB", "CG", Single), ("CG", "CD1", Aromatic),
            ("CG", "CD2", Aromatic), ("CD1", "CE1", Aromatic), ("CD2", "CE2", Aromatic),
            ("CE1", "CZ", Aromatic), ("CE2", "CZ", Aromatic),
        ],
    },
    "PRO" => StructuralFamily {
        one_letter: 'P', three_letter: "PRO", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE, sidechain_atoms: &["CB", "CG", "CD"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[
            ("CA", "CB", Single), ("CB", "CG", Single), ("CG", "CD", Single),
            ("CD", "N", Single),
        ],
    },
    "SER" => StructuralFamily {
        one_letter: 'S', three_letter: "SER", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE, sidechain_atoms: &["CB", "OG"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[("CA", "CB", Single), ("CB", "OG", Single)],
    },
    "THR" => StructuralFamily {
        one_letter: 'T', three_letter: "THR", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE, sidechain_atoms: &["CB", "OG1", "CG2"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[
            ("CA", "CB", Single), ("CB", "OG1", Single), ("CB", "CG2", Single),
        ],
    },
    "TRP" => StructuralFamily {
        one_letter: 'W', three_letter: "TRP", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE,
        sidechain_atoms: &["CB", "CG", "CD1", "CD2", "NE1", "CE2", "CE3", "CZ2", "CZ3", "CH2"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[
            ("CA", "CB", Single), ("CB", "CG", Single), ("CG", "CD1", Aromatic),
            ("CG", "CD2", Aromatic), ("CD1", "NE1", Aromatic), ("NE1", "CE2", Aromatic),
            ("CD2", "CE2", Aromatic), ("CD2", "CE3", Aromatic), ("CE2", "CZ2", Aromatic),
            ("CE3", "CZ3", Aromatic), ("CZ2", "CH2", Aromatic), ("CZ3", "CH2", Aromatic),
        ],
    },
    "TYR" => StructuralFamily {
        one_letter: 'Y', three_letter: "TYR", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE,
        sidechain_atoms: &["CB", "CG", "CD1", "CD2", "CE1", "CE2", "CZ", "OH"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[
            ("CA", "CB", Single), ("CB", "CG", Single), ("CG", "CD1", Aromatic),
            ("CG", "CD2", Aromatic), ("CD1", "CE1", Aromatic), ("CD2", "CE2", Aromatic),
            ("CE1", "CZ", Aromatic), ("CE2", "CZ", Aromatic), ("CZ", "OH", Single),
        ],
    },
    "VAL" => StructuralFamily {
        one_letter: 'V', three_letter: "VAL", kind: LeafKind::AminoAcid,
        backbone_atoms: AMINO_BACKBONE, sidechain_atoms: &["CB", "CG1", "CG2"],
        backbone_bonds: AMINO_BACKBONE_BONDS,
        sidechain_bonds: &[
            ("CA", "CB", Single), ("CB", "CG1", Single), ("CB", "CG2", Single),
        ],
    },
    "A" => StructuralFamily {
        one_letter: 'A', three_letter: "A", kind: LeafKind::Nucleotide,
        backbone_atoms: RNA_BACKBONE, sidechain_atoms: ADENINE,
        backbone_bonds: RNA_BACKBONE_BONDS, sidechain_bonds: ADENINE_BONDS,
    },
    "C" => StructuralFamily {
        one_letter: 'C', three_letter: "C", kind: LeafKind::Nucleotide,
        backbone_atoms: RNA_BACKBONE, sidechain_atoms: CYTOSINE,
        backbone_bonds: RNA_BACKBONE_BONDS, sidechain_bonds: CYTOSINE_BONDS,
    },
    "G" => StructuralFamily {
        one_letter: 'G', three_letter: "G", kind: LeafKind::Nucleotide,
        backbone_atoms: RNA_BACKBONE, sidechain_atoms: GUANINE,
        backbone_bonds: RNA_BACKBONE_BONDS, sidechain_bonds: GUANINE_BONDS,
    },
    "U" => StructuralFamily {
        one_letter: 'U', three_letter: "U", kind: LeafKind::Nucleotide,
        backbone_atoms: RNA_BACKBONE, sidechain_atoms: URACIL,
        backbone_bonds: RNA_BACKBONE_BONDS, sidechain_bonds: URACIL_BONDS,
    },
    "DA" => StructuralFamily {
        one_letter: 'A', three_letter: "DA", kind: LeafKind::Nucleotide,
        backbone_atoms: DNA_BACKBONE, sidechain_atoms: ADENINE,
        backbone_bonds: DNA_BACKBONE_BONDS, sidechain_bonds: ADENINE_BONDS,
    },
    "DC" => StructuralFamily {
        one_letter: 'C', three_letter: "DC", kind: LeafKind::Nucleotide,
        backbone_atoms: DNA_BACKBONE, sidechain_atoms: CYTOSINE,
        backbone_bonds: DNA_BACKBONE_BONDS, sidechain_bonds: CYTOSINE_BONDS,
    },
    "DG" => StructuralFamily {
        one_letter: 'G', three_letter: "DG", kind: LeafKind::Nucleotide,
        backbone_atoms: DNA_BACKBONE, sidechain_atoms: GUANINE,
        backbone_bonds: DNA_BACKBONE_BONDS, sidechain_bonds: GUANINE_BONDS,
    },
    "DT" => StructuralFamily {
        one_letter: 'T', three_letter: "DT", kind: LeafKind::Nucleotide,
        backbone_atoms: DNA_BACKBONE, sidechain_atoms: THYMINE,
        backbone_bonds: DNA_BACKBONE_BONDS, sidechain_bonds: THYMINE_BONDS,
    },
};
