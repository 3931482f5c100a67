use super::representation::RepresentationScheme;
use crate::core::models::atom::Atom;
use crate::core::models::leaf::LeafSubstructure;
use crate::core::utils::geometry::{calculate_rmsd, centroid};
use crate::core::utils::identifiers::{is_backbone_atom, is_main_chain_atom};
use itertools::Itertools;
use nalgebra::{Matrix3, Point3, Rotation3, Vector3};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

const RMSD_CROSS_CHECK_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SuperimpositionError {
    #[error("Cannot superimpose empty point sets")]
    Empty,
    #[error("Point set lengths differ: reference has {reference}, candidate has {candidate}")]
    LengthMismatch { reference: usize, candidate: usize },
    #[error("Leaf pair {reference} / {candidate} shares no selected atoms")]
    NoCommonAtoms { reference: String, candidate: String },
    #[error("Leaf {leaf} has no atoms to derive a representative point from")]
    NoRepresentativePoint { leaf: String },
    #[error("No admissible assignment of candidate leaves to reference leaves")]
    NoAdmissiblePermutation,
    #[error("Singular value decomposition did not produce both singular vector matrices")]
    Decomposition,
}

/// Which atoms of a leaf take part in a fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AtomSelection {
    #[default]
    All,
    Heavy,
    /// The main-chain atoms N, CA, C and O.
    Backbone,
    AlphaCarbon,
    Sidechain,
}

impl AtomSelection {
    pub fn accepts(self, atom: &Atom) -> bool {
        match self {
            Self::All => true,
            Self::Heavy => !atom.is_hydrogen(),
            Self::Backbone => is_main_chain_atom(&atom.name),
            Self::AlphaCarbon => atom.name == "CA",
            Self::Sidechain => !is_backbone_atom(&atom.name),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown atom selection '{0}'")]
pub struct ParseAtomSelectionError(pub String);

impl FromStr for AtomSelection {
    type Err = ParseAtomSelectionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "heavy" => Ok(Self::Heavy),
            "backbone" => Ok(Self::Backbone),
            "ca" | "alpha-carbon" => Ok(Self::AlphaCarbon),
            "sidechain" | "side-chain" => Ok(Self::Sidechain),
            _ => Err(ParseAtomSelectionError(s.to_string())),
        }
    }
}

/// A rigid-body transform `x -> R * x + t` that maps candidate points onto reference points.
#[derive(Debug, Clone, PartialEq)]
pub struct Superimposition {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
    pub rmsd: f64,
    pub reference: Vec<Point3<f64>>,
    /// Candidate points after the transform, in the same order as `reference`.
    pub mapped_candidate: Vec<Point3<f64>>,
}

impl Superimposition {
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.translation
    }

    pub fn fitted_atom_count(&self) -> usize {
        self.reference.len()
    }
}

/// Finds the optimal rotation and translation of `candidate` onto `reference` (Kabsch).
///
/// The sign correction on the smallest singular value is always applied, so the result is a
/// proper rotation even for mirrored inputs.
pub fn superimpose_points(
    reference: &[Point3<f64>],
    candidate: &[Point3<f64>],
) -> Result<Superimposition, SuperimpositionError> {
    if reference.len() != candidate.len() {
        return Err(SuperimpositionError::LengthMismatch {
            reference: reference.len(),
            candidate: candidate.len(),
        });
    }
    let (Some(reference_center), Some(candidate_center)) = (centroid(reference), centroid(candidate))
    else {
        return Err(SuperimpositionError::Empty);
    };
    let n = reference.len();

    if n == 1 {
        return Ok(Superimposition {
            rotation: Rotation3::identity(),
            translation: reference_center - candidate_center,
            rmsd: 0.0,
            reference: reference.to_vec(),
            mapped_candidate: reference.to_vec(),
        });
    }

    let mut covariance = Matrix3::zeros();
    let mut squared_norms = 0.0;
    for (r, c) in reference.iter().zip(candidate) {
        let r = r - reference_center;
        let c = c - candidate_center;
        covariance += r * c.transpose();
        squared_norms += r.norm_squared() + c.norm_squared();
    }

    let svd = covariance.svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return Err(SuperimpositionError::Decomposition);
    };
    let sign = if (u * v_t).determinant() < 0.0 { -1.0 } else { 1.0 };
    let correction = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, sign));
    let rotation = Rotation3::from_matrix_unchecked(u * correction * v_t);
    let translation = reference_center.coords - rotation * candidate_center.coords;

    let mapped_candidate: Vec<Point3<f64>> = candidate
        .iter()
        .map(|p| rotation * p + translation)
        .collect();
    let rmsd = calculate_rmsd(reference, &mapped_candidate).unwrap_or(0.0);

    let s = &svd.singular_values;
    let closed_form_msd =
        ((squared_norms - 2.0 * (s[0] + s[1] + sign * s[2])) / n as f64).max(0.0);
    if (closed_form_msd.sqrt() - rmsd).abs() > RMSD_CROSS_CHECK_TOLERANCE {
        warn!(
            direct = rmsd,
            closed_form = closed_form_msd.sqrt(),
            "RMSD cross-check mismatch."
        );
    }

    Ok(Superimposition {
        rotation,
        translation,
        rmsd,
        reference: reference.to_vec(),
        mapped_candidate,
    })
}

/// Result of fitting one ordered leaf sequence onto another.
#[derive(Debug, Clone)]
pub struct SubstructureSuperimposition {
    pub superimposition: Superimposition,
    /// The candidate leaves in fitted order with every atom transformed.
    pub mapped_leaves: Vec<LeafSubstructure>,
    /// For each reference position, the index of the candidate leaf assigned to it.
    pub assignment: Vec<usize>,
}

impl SubstructureSuperimposition {
    pub fn rmsd(&self) -> f64 {
        self.superimposition.rmsd
    }

    pub fn fitted_atom_count(&self) -> usize {
        self.superimposition.fitted_atom_count()
    }
}

/// Fits leaf sequences either atom-by-atom under an [`AtomSelection`] or through one
/// representative point per leaf.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SubstructureSuperimposer {
    pub selection: AtomSelection,
    pub representation: Option<RepresentationScheme>,
}

impl SubstructureSuperimposer {
    pub fn new(selection: AtomSelection) -> Self {
        Self {
            selection,
            representation: None,
        }
    }

    pub fn with_representation(scheme: RepresentationScheme) -> Self {
        Self {
            selection: AtomSelection::All,
            representation: Some(scheme),
        }
    }

    /// Atom names present in both leaves under the selection, in the reference leaf's order.
    pub fn common_atom_names<'r>(
        &self,
        reference: &'r LeafSubstructure,
        candidate: &LeafSubstructure,
    ) -> Vec<&'r str> {
        reference
            .atoms()
            .iter()
            .filter(|a| self.selection.accepts(a))
            .filter(|a| candidate.atom(&a.name).is_some_and(|c| self.selection.accepts(c)))
            .map(|a| a.name.as_str())
            .collect()
    }

    /// Whether a candidate leaf can be fitted against a reference leaf at all.
    pub fn is_compatible(&self, reference: &LeafSubstructure, candidate: &LeafSubstructure) -> bool {
        match self.representation {
            Some(_) => candidate.atom_count() > 0,
            None => !self.common_atom_names(reference, candidate).is_empty(),
        }
    }

    fn collect_points(
        &self,
        reference: &[&LeafSubstructure],
        candidate: &[&LeafSubstructure],
    ) -> Result<(Vec<Point3<f64>>, Vec<Point3<f64>>), SuperimpositionError> {
        let mut reference_points = Vec::new();
        let mut candidate_points = Vec::new();
        for (r, c) in reference.iter().zip(candidate) {
            if let Some(scheme) = self.representation {
                let point_of = |leaf: &LeafSubstructure| {
                    scheme
                        .represent(leaf)
                        .ok_or_else(|| SuperimpositionError::NoRepresentativePoint {
                            leaf: leaf.to_string(),
                        })
                };
                reference_points.push(point_of(r)?);
                candidate_points.push(point_of(c)?);
                continue;
            }

            let names = self.common_atom_names(r, c);
            if names.is_empty() {
                return Err(SuperimpositionError::NoCommonAtoms {
                    reference: r.to_string(),
                    candidate: c.to_string(),
                });
            }
            for name in names {
                if let (Some(ra), Some(ca)) = (r.atom(name), c.atom(name)) {
                    reference_points.push(ra.position);
                    candidate_points.push(ca.position);
                }
            }
        }
        Ok((reference_points, candidate_points))
    }

    /// Fits `candidate[i]` onto `reference[i]` for every position and transforms every atom
    /// of the candidate leaves, not only the fitted ones.
    pub fn superimpose(
        &self,
        reference: &[&LeafSubstructure],
        candidate: &[&LeafSubstructure],
    ) -> Result<SubstructureSuperimposition, SuperimpositionError> {
        if reference.len() != candidate.len() {
            return Err(SuperimpositionError::LengthMismatch {
                reference: reference.len(),
                candidate: candidate.len(),
            });
        }
        if reference.is_empty() {
            return Err(SuperimpositionError::Empty);
        }

        let (reference_points, candidate_points) = self.collect_points(reference, candidate)?;
        let superimposition = superimpose_points(&reference_points, &candidate_points)?;
        let mapped_leaves = candidate
            .iter()
            .map(|leaf| leaf.transformed(&superimposition.rotation, &superimposition.translation))
            .collect();

        Ok(SubstructureSuperimposition {
            superimposition,
            mapped_leaves,
            assignment: (0..candidate.len()).collect(),
        })
    }

    /// Evaluates every admissible ordering of `candidate` against `reference` and returns
    /// the one with the lowest RMSD. Ties keep the first ordering in permutation order.
    pub fn ideal_superimpose<F>(
        &self,
        reference: &[&LeafSubstructure],
        candidate: &[&LeafSubstructure],
        admissible: F,
    ) -> Result<SubstructureSuperimposition, SuperimpositionError>
    where
        F: Fn(&LeafSubstructure, &LeafSubstructure) -> bool,
    {
        if reference.len() != candidate.len() {
            return Err(SuperimpositionError::LengthMismatch {
                reference: reference.len(),
                candidate: candidate.len(),
            });
        }
        if reference.is_empty() {
            return Err(SuperimpositionError::Empty);
        }

        let mut best: Option<SubstructureSuperimposition> = None;
        for order in (0..candidate.len()).permutations(candidate.len()) {
            let admissible_order = order.iter().enumerate().all(|(position, &index)| {
                admissible(reference[position], candidate[index])
                    && self.is_compatible(reference[position], candidate[index])
            });
            if !admissible_order {
                continue;
            }
            let ordered: Vec<&LeafSubstructure> = order.iter().map(|&i| candidate[i]).collect();
            let mut result = self.superimpose(reference, &ordered)?;
            if best.as_ref().is_none_or(|b| result.rmsd() < b.rmsd()) {
                result.assignment = order;
                best = Some(result);
            }
        }
        best.ok_or(SuperimpositionError::NoAdmissiblePermutation)
    }

    /// [`Self::ideal_superimpose`] with the default predicate: any pair that shares a
    /// selected atom.
    pub fn ideal_superimpose_any(
        &self,
        reference: &[&LeafSubstructure],
        candidate: &[&LeafSubstructure],
    ) -> Result<SubstructureSuperimposition, SuperimpositionError> {
        self.ideal_superimpose(reference, candidate, |_, _| true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::pdb::PdbFile;
    use crate::core::utils::geometry::rotation_from_axis_angle;

    const TRIAD: &str = "\
ATOM      1  N   HIS A  57      10.000  10.000  10.000  1.00  0.00           N
ATOM      2  CA  HIS A  57      11.458  10.000  10.000  1.00  0.00           C
ATOM      3  C   HIS A  57      12.009  11.420  10.000  1.00  0.00           C
ATOM      4  O   HIS A  57      11.246  12.389  10.000  1.00  0.00           O
ATOM      5  N   ASP A 102      14.000  13.000  11.000  1.00  0.00           N
ATOM      6  CA  ASP A 102      15.100  13.900  11.300  1.00  0.00           C
ATOM      7  C   ASP A 102      16.400  13.200  11.700  1.00  0.00           C
ATOM      8  O   ASP A 102      16.500  12.000  11.900  1.00  0.00           O
ATOM      9  N   SER A 195       9.000  15.000  12.000  1.00  0.00           N
ATOM     10  CA  SER A 195       9.800  16.200  12.400  1.00  0.00           C
ATOM     11  C   SER A 195      11.200  15.900  12.900  1.00  0.00           C
ATOM     12  O   SER A 195      11.700  14.800  12.800  1.00  0.00           O
";

    fn triad() -> Vec<LeafSubstructure> {
        PdbFile::read_from_str(TRIAD).unwrap().leaves().cloned().collect()
    }

    fn moved(leaves: &[LeafSubstructure]) -> Vec<LeafSubstructure> {
        let rotation = rotation_from_axis_angle(&Vector3::new(1.0, 2.0, 3.0), 73.0);
        let translation = Vector3::new(-4.0, 7.5, 2.25);
        leaves
            .iter()
            .map(|l| l.transformed(&rotation, &translation))
            .collect()
    }

    fn refs(leaves: &[LeafSubstructure]) -> Vec<&LeafSubstructure> {
        leaves.iter().collect()
    }

    #[test]
    fn rigidly_moved_copy_superimposes_with_zero_rmsd() {
        let reference = triad();
        let candidate = moved(&reference);
        let superimposer = SubstructureSuperimposer::new(AtomSelection::All);
        let result = superimposer
            .superimpose(&refs(&reference), &refs(&candidate))
            .unwrap();

        assert!(result.rmsd() < 1e-9);
        assert_eq!(result.fitted_atom_count(), 12);
        for (r, c) in reference.iter().zip(&result.mapped_leaves) {
            for atom in r.atoms() {
                let mapped = c.atom(&atom.name).unwrap().position;
                assert!((mapped - atom.position).norm() < 1e-9);
            }
        }
    }

    #[test]
    fn mirrored_input_still_yields_proper_rotation() {
        let reference = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ];
        let mirrored: Vec<_> = reference.iter().map(|p| Point3::new(p.x, p.y, -p.z)).collect();
        let result = superimpose_points(&reference, &mirrored).unwrap();
        assert!((result.rotation.matrix().determinant() - 1.0).abs() < 1e-9);
        assert!(result.rmsd > 0.01);
    }

    #[test]
    fn single_point_gives_identity_and_zero_rmsd() {
        let result =
            superimpose_points(&[Point3::new(1.0, 2.0, 3.0)], &[Point3::new(-1.0, 0.0, 5.0)])
                .unwrap();
        assert_eq!(result.rotation, Rotation3::identity());
        assert_eq!(result.translation, Vector3::new(2.0, 2.0, -2.0));
        assert_eq!(result.rmsd, 0.0);
    }

    #[test]
    fn two_points_coincide_after_transform() {
        let reference = [Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 2.0)];
        let candidate = [Point3::new(5.0, 5.0, 5.0), Point3::new(7.0, 5.0, 5.0)];
        let result = superimpose_points(&reference, &candidate).unwrap();
        for (r, c) in reference.iter().zip(&candidate) {
            assert!((result.apply(c) - r).norm() < 1e-9);
        }
    }

    #[test]
    fn mismatched_or_empty_inputs_are_rejected() {
        assert_eq!(
            superimpose_points(&[Point3::origin()], &[]),
            Err(SuperimpositionError::LengthMismatch {
                reference: 1,
                candidate: 0
            })
        );
        assert_eq!(superimpose_points(&[], &[]), Err(SuperimpositionError::Empty));
    }

    #[test]
    fn atom_selection_restricts_fitted_atoms() {
        let reference = triad();
        let candidate = moved(&reference);
        let ca = SubstructureSuperimposer::new(AtomSelection::AlphaCarbon)
            .superimpose(&refs(&reference), &refs(&candidate))
            .unwrap();
        assert_eq!(ca.fitted_atom_count(), 3);
        let backbone = SubstructureSuperimposer::new(AtomSelection::Backbone)
            .superimpose(&refs(&reference), &refs(&candidate))
            .unwrap();
        assert_eq!(backbone.fitted_atom_count(), 12);
    }

    #[test]
    fn ideal_superimposition_recovers_shuffled_order() {
        let reference = triad();
        let mut candidate = moved(&reference);
        candidate.rotate_left(1);
        let superimposer = SubstructureSuperimposer::new(AtomSelection::AlphaCarbon);

        let result = superimposer
            .ideal_superimpose_any(&refs(&reference), &refs(&candidate))
            .unwrap();
        assert!(result.rmsd() < 1e-9);
        assert_eq!(result.assignment, vec![2, 0, 1]);
        assert_eq!(result.mapped_leaves[0].code(), "HIS");
    }

    #[test]
    fn ideal_superimposition_honours_predicate() {
        let reference = triad();
        let candidate = moved(&reference);
        let superimposer = SubstructureSuperimposer::new(AtomSelection::AlphaCarbon);
        let result = superimposer.ideal_superimpose(&refs(&reference), &refs(&candidate), |r, c| {
            r.code() != c.code()
        });
        let assignment = result.unwrap().assignment;
        assert!(assignment.iter().enumerate().all(|(i, &j)| i != j));

        let none = superimposer.ideal_superimpose(&refs(&reference), &refs(&candidate), |_, _| false);
        assert_eq!(none.unwrap_err(), SuperimpositionError::NoAdmissiblePermutation);
    }

    const MOTIF_HDS_01: &str = include_str!("../../tests/fixtures/motif_HDS_01.pdb");
    const MOTIF_HDS_02: &str = include_str!("../../tests/fixtures/motif_HDS_02.pdb");

    fn fixture(text: &str) -> Vec<LeafSubstructure> {
        PdbFile::read_from_str(text).unwrap().leaves().cloned().collect()
    }

    #[test]
    fn catalytic_triad_fixtures_align_with_fixed_rmsd() {
        let first = fixture(MOTIF_HDS_01);
        let second = fixture(MOTIF_HDS_02);

        let ca = SubstructureSuperimposer::new(AtomSelection::AlphaCarbon)
            .ideal_superimpose_any(&refs(&first), &refs(&second))
            .unwrap();
        assert_eq!(ca.fitted_atom_count(), 3);
        assert_eq!(ca.assignment, vec![0, 1, 2]);
        assert!((ca.rmsd() - 0.643_971_536_705_805_3).abs() < 1e-9, "rmsd = {}", ca.rmsd());

        let backbone = SubstructureSuperimposer::new(AtomSelection::Backbone)
            .superimpose(&refs(&first), &refs(&second))
            .unwrap();
        assert_eq!(backbone.fitted_atom_count(), 12);
        assert!((backbone.rmsd() - 0.414_949_650_826_635).abs() < 1e-9);

        let all = SubstructureSuperimposer::new(AtomSelection::All)
            .superimpose(&refs(&first), &refs(&second))
            .unwrap();
        assert_eq!(all.fitted_atom_count(), 15);
        assert!((all.rmsd() - 0.379_285_968_481_709).abs() < 1e-9);
    }

    #[test]
    fn rmsd_is_symmetric() {
        let first = fixture(MOTIF_HDS_01);
        let second = fixture(MOTIF_HDS_02);
        let superimposer = SubstructureSuperimposer::new(AtomSelection::All);
        let forward = superimposer.superimpose(&refs(&first), &refs(&second)).unwrap();
        let backward = superimposer.superimpose(&refs(&second), &refs(&first)).unwrap();
        assert!((forward.rmsd() - backward.rmsd()).abs() < 1e-9);
    }

    #[test]
    fn transformed_candidate_reproduces_reported_rmsd() {
        let first = fixture(MOTIF_HDS_01);
        let second = fixture(MOTIF_HDS_02);
        let superimposer = SubstructureSuperimposer::new(AtomSelection::Backbone);
        let result = superimposer.superimpose(&refs(&first), &refs(&second)).unwrap();

        let mut squared = 0.0;
        let mut count = 0;
        for (r, c) in first.iter().zip(&result.mapped_leaves) {
            for name in superimposer.common_atom_names(r, c) {
                let delta = r.atom(name).unwrap().position - c.atom(name).unwrap().position;
                squared += delta.norm_squared();
                count += 1;
            }
        }
        let remeasured = (squared / count as f64).sqrt();
        assert_eq!(count, 12);
        assert!((remeasured - result.rmsd()).abs() < 1e-9);
    }

    #[test]
    fn atom_selection_parses_from_strings() {
        assert_eq!("CA".parse::<AtomSelection>().unwrap(), AtomSelection::AlphaCarbon);
        assert_eq!("backbone".parse::<AtomSelection>().unwrap(), AtomSelection::Backbone);
        assert!("nonsense".parse::<AtomSelection>().is_err());
    }
}
