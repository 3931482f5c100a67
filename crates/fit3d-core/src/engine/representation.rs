use super::superimposition::superimpose_points;
use crate::core::models::leaf::LeafSubstructure;
use crate::core::utils::geometry::centroid;
use crate::core::utils::identifiers::is_backbone_atom;
use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Backbone N, CA, C and the CB of an ideal alanine; superimposed onto a glycine backbone
/// they give the position of its virtual CB.
const REFERENCE_ALANINE_BACKBONE: [(&str, [f64; 3]); 3] = [
    ("N", [-0.966, 0.493, 1.500]),
    ("CA", [0.257, 0.418, 0.692]),
    ("C", [-0.094, 0.017, -0.716]),
];
const REFERENCE_ALANINE_CB: [f64; 3] = [1.204, -0.620, 1.296];

/// Reduces a leaf to a single representative point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepresentationScheme {
    AlphaCarbon,
    BetaCarbon,
    Centroid,
    SidechainCentroid,
    LastHeavySidechainAtom,
}

impl RepresentationScheme {
    /// The representative point of `leaf`. Every scheme falls back to the heavy-atom centroid
    /// when its atom is missing; `None` only for a leaf without atoms.
    pub fn represent(&self, leaf: &LeafSubstructure) -> Option<Point3<f64>> {
        let point = match self {
            Self::AlphaCarbon => leaf.atom("CA").map(|a| a.position),
            Self::BetaCarbon => leaf
                .atom("CB")
                .map(|a| a.position)
                .or_else(|| virtual_beta_carbon(leaf)),
            Self::Centroid => None,
            Self::SidechainCentroid => {
                let points: Vec<_> = leaf
                    .atoms()
                    .iter()
                    .filter(|a| !a.is_hydrogen() && !is_backbone_atom(&a.name))
                    .map(|a| a.position)
                    .collect();
                centroid(&points)
            }
            Self::LastHeavySidechainAtom => leaf
                .family()
                .sidechain_atoms
                .iter()
                .rev()
                .filter_map(|name| leaf.atom(name))
                .find(|a| !a.is_hydrogen())
                .map(|a| a.position),
        };
        point.or_else(|| heavy_atom_centroid(leaf))
    }
}

/// Centroid of the heavy atoms, or of all atoms when the leaf only holds hydrogens.
pub fn heavy_atom_centroid(leaf: &LeafSubstructure) -> Option<Point3<f64>> {
    let heavy: Vec<_> = leaf
        .atoms()
        .iter()
        .filter(|a| !a.is_hydrogen())
        .map(|a| a.position)
        .collect();
    centroid(&heavy).or_else(|| centroid(&leaf.positions().collect::<Vec<_>>()))
}

/// Places a CB on a glycine (or any leaf with N, CA and C) by fitting the reference alanine
/// backbone onto it.
pub fn virtual_beta_carbon(leaf: &LeafSubstructure) -> Option<Point3<f64>> {
    let mut target = Vec::with_capacity(REFERENCE_ALANINE_BACKBONE.len());
    let mut reference = Vec::with_capacity(REFERENCE_ALANINE_BACKBONE.len());
    for (name, [x, y, z]) in REFERENCE_ALANINE_BACKBONE {
        target.push(leaf.atom(name)?.position);
        reference.push(Point3::new(x, y, z));
    }
    let fit = superimpose_points(&target, &reference).ok()?;
    let [x, y, z] = REFERENCE_ALANINE_CB;
    Some(fit.apply(&Point3::new(x, y, z)))
}

impl fmt::Display for RepresentationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AlphaCarbon => "ca",
            Self::BetaCarbon => "cb",
            Self::Centroid => "centroid",
            Self::SidechainCentroid => "sidechain-centroid",
            Self::LastHeavySidechainAtom => "last-heavy-sidechain",
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown representation scheme '{0}'")]
pub struct ParseRepresentationError(pub String);

impl FromStr for RepresentationScheme {
    type Err = ParseRepresentationError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ca" | "alpha-carbon" => Ok(Self::AlphaCarbon),
            "cb" | "beta-carbon" => Ok(Self::BetaCarbon),
            "centroid" => Ok(Self::Centroid),
            "sidechain-centroid" => Ok(Self::SidechainCentroid),
            "last-heavy-sidechain" => Ok(Self::LastHeavySidechainAtom),
            _ => Err(ParseRepresentationError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::pdb::PdbFile;

    const RESIDUES: &str = "\
ATOM      1  N   ALA A   1      -0.966   0.493   1.500  1.00  0.00           N
ATOM      2  CA  ALA A   1       0.257   0.418   0.692  1.00  0.00           C
ATOM      3  C   ALA A   1      -0.094   0.017  -0.716  1.00  0.00           C
ATOM      4  O   ALA A   1      -1.056  -0.682  -0.923  1.00  0.00           O
ATOM      5  CB  ALA A   1       1.204  -0.620   1.296  1.00  0.00           C
ATOM      6  N   GLY A   2       5.000   0.000   0.000  1.00  0.00           N
ATOM      7  CA  GLY A   2       6.458   0.000   0.000  1.00  0.00           C
ATOM      8  C   GLY A   2       7.009   1.420   0.000  1.00  0.00           C
ATOM      9  O   GLY A   2       6.246   2.389   0.000  1.00  0.00           O
ATOM     10  N   LYS A   3      10.000   0.000   0.000  1.00  0.00           N
ATOM     11  CA  LYS A   3      11.000   0.000   0.000  1.00  0.00           C
ATOM     12  CB  LYS A   3      11.000   1.000   0.000  1.00  0.00           C
ATOM     13  CG  LYS A   3      11.000   2.000   0.000  1.00  0.00           C
ATOM     14  NZ  LYS A   3      11.000   3.000   0.000  1.00  0.00           N
ATOM     15  HZ1 LYS A   3      11.000   4.000   0.000  1.00  0.00           H
";

    fn leaves() -> Vec<LeafSubstructure> {
        PdbFile::read_from_str(RESIDUES).unwrap().leaves().cloned().collect()
    }

    #[test]
    fn alpha_carbon_scheme_returns_ca() {
        let leaves = leaves();
        let p = RepresentationScheme::AlphaCarbon.represent(&leaves[2]).unwrap();
        assert_eq!(p, Point3::new(11.0, 0.0, 0.0));
    }

    #[test]
    fn beta_carbon_of_alanine_is_its_own_cb() {
        let leaves = leaves();
        let p = RepresentationScheme::BetaCarbon.represent(&leaves[0]).unwrap();
        assert_eq!(p, Point3::new(1.204, -0.620, 1.296));
    }

    #[test]
    fn virtual_cb_of_glycine_is_deterministic_and_near_ca() {
        let leaves = leaves();
        let gly = &leaves[1];
        let first = RepresentationScheme::BetaCarbon.represent(gly).unwrap();
        let second = RepresentationScheme::BetaCarbon.represent(gly).unwrap();
        assert_eq!(first, second);

        let ca = gly.atom("CA").unwrap().position;
        let bond = (first - ca).norm();
        assert!((bond - 1.53).abs() < 0.1, "CA-CB distance {}", bond);
    }

    #[test]
    fn virtual_cb_on_reference_frame_reproduces_reference_cb() {
        let leaves = leaves();
        let p = virtual_beta_carbon(&leaves[0]).unwrap();
        assert!((p - Point3::new(1.204, -0.620, 1.296)).norm() < 1e-6);
    }

    #[test]
    fn last_heavy_sidechain_atom_skips_hydrogens() {
        let leaves = leaves();
        let p = RepresentationScheme::LastHeavySidechainAtom
            .represent(&leaves[2])
            .unwrap();
        assert_eq!(p, Point3::new(11.0, 3.0, 0.0));
    }

    #[test]
    fn sidechain_centroid_of_glycine_falls_back_to_heavy_centroid() {
        let leaves = leaves();
        let gly = &leaves[1];
        let fallback = heavy_atom_centroid(gly).unwrap();
        assert_eq!(
            RepresentationScheme::SidechainCentroid.represent(gly),
            Some(fallback)
        );
    }

    #[test]
    fn centroid_ignores_hydrogens() {
        let leaves = leaves();
        let p = RepresentationScheme::Centroid.represent(&leaves[2]).unwrap();
        assert!((p - Point3::new(10.8, 1.2, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn schemes_round_trip_through_strings() {
        for scheme in [
            RepresentationScheme::AlphaCarbon,
            RepresentationScheme::BetaCarbon,
            RepresentationScheme::Centroid,
            RepresentationScheme::SidechainCentroid,
            RepresentationScheme::LastHeavySidechainAtom,
        ] {
            assert_eq!(scheme.to_string().parse::<RepresentationScheme>(), Ok(scheme));
        }
        assert!("cg".parse::<RepresentationScheme>().is_err());
    }
}
