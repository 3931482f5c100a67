use phf::{Set, phf_set};

static BACKBONE_ATOM_NAMES: Set<&'static str> = phf_set! {
    "N", "H", "HN", "CA", "HA", "C", "O", "OXT", "H1", "H2", "H3", "NT",
    "HT1", "HT2", "HT3", "OT1", "OT2", "HC", "HOXT", "HA1", "HA2", "HA3", "1HA", "2HA",
    "P", "OP1", "OP2", "OP3", "O1P", "O2P", "O5'", "C5'", "C4'", "O4'", "C3'", "O3'",
    "C2'", "O2'", "C1'", "H5'", "H5''", "H4'", "H3'", "H2'", "H2''", "HO2'", "H1'",
};

static MAIN_CHAIN_ATOM_NAMES: Set<&'static str> = phf_set! { "N", "CA", "C", "O" };

/// Backbone atoms of amino acids (including termini and hydrogens) and nucleotides
/// (the sugar-phosphate moiety).
pub fn is_backbone_atom(atom_name: &str) -> bool {
    BACKBONE_ATOM_NAMES.contains(atom_name.trim())
}

/// The four heavy main-chain atoms N, CA, C and O of an amino acid.
pub fn is_main_chain_atom(atom_name: &str) -> bool {
    MAIN_CHAIN_ATOM_NAMES.contains(atom_name.trim())
}
