use crate::core::models::leaf::{LeafIdentifier, LeafSubstructure};
use crate::core::models::structure::Structure;
use crate::core::utils::geometry::max_pairwise_distance;
use crate::engine::candidates::{MotifPosition, ValidCandidateGenerator};
use crate::engine::config::Fit3DConfig;
use crate::engine::environment::LeafEnvironment;
use crate::engine::error::AlignmentError;
use crate::engine::exchange::ExchangeGroup;
use crate::engine::matches::Fit3DMatch;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::representation::RepresentationScheme;
use crate::engine::substitution::SubstitutionMatrix;
use crate::engine::superimposition::{SubstructureSuperimposer, SubstructureSuperimposition};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, instrument, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Searches a single target structure for occurrences of the query motif.
///
/// Matches are returned sorted by RMSD; matches with equal RMSD keep the order in which
/// their leaf sets were discovered.
#[instrument(skip_all, name = "fit3d_alignment", fields(structure = %target.id()))]
pub fn run(
    motif: &[LeafSubstructure],
    target: &Structure,
    config: &Fit3DConfig,
    reporter: &ProgressReporter,
) -> Result<Vec<Fit3DMatch>, AlignmentError> {
    validate_motif(motif, config)?;
    align_target(motif, target, config, 0, reporter)
}

/// Rejects motifs the search cannot fit: empty ones and ones with a leaf that contributes
/// nothing under the configured atom selection.
pub(crate) fn validate_motif(
    motif: &[LeafSubstructure],
    config: &Fit3DConfig,
) -> Result<(), AlignmentError> {
    if motif.is_empty() {
        return Err(AlignmentError::EmptyMotif);
    }
    for leaf in motif {
        let usable = match config.representation {
            Some(_) => leaf.atom_count() > 0,
            None => leaf.atoms().iter().any(|a| config.atom_selection.accepts(a)),
        };
        if !usable {
            return Err(AlignmentError::MotifLeafWithoutAtoms {
                leaf: leaf.to_string(),
            });
        }
    }
    Ok(())
}

/// Builds the admissible family keys for every motif position.
pub(crate) fn motif_positions(
    motif: &[LeafSubstructure],
    config: &Fit3DConfig,
) -> Vec<MotifPosition> {
    motif
        .iter()
        .enumerate()
        .map(|(index, leaf)| {
            let key = leaf.family_key();
            let mut position = MotifPosition::new(key);
            if let Some(extra) = config.exchanges.get(&index) {
                position = position.with_exchanges(extra.iter().cloned());
            }
            if config.use_exchange_groups {
                position = position.with_exchanges(ExchangeGroup::families_for(key));
            }
            position
        })
        .collect()
}

pub(crate) fn align_target(
    motif: &[LeafSubstructure],
    target: &Structure,
    config: &Fit3DConfig,
    target_index: usize,
    reporter: &ProgressReporter,
) -> Result<Vec<Fit3DMatch>, AlignmentError> {
    let target_leaves: Vec<&LeafSubstructure> = target
        .first_model()
        .map(|model| model.leaves().collect())
        .unwrap_or_default();
    if target_leaves.is_empty() {
        return Err(AlignmentError::EmptyTarget {
            target: target.id().to_string(),
        });
    }

    // === Phase 1: Environment extraction ===
    reporter.report(Progress::PhaseStart {
        name: "Environment Extraction",
    });
    let positions = motif_positions(motif, config);
    let generator = ValidCandidateGenerator::new(positions);
    let scheme = config
        .representation
        .unwrap_or(RepresentationScheme::AlphaCarbon);

    let motif_points: Vec<_> = motif.iter().filter_map(|l| scheme.represent(l)).collect();
    let radius = max_pairwise_distance(&motif_points) + config.distance_tolerance;

    let (admitted, admitted_points): (Vec<&LeafSubstructure>, Vec<_>) = target_leaves
        .iter()
        .filter(|leaf| generator.admits(leaf))
        .filter_map(|leaf| scheme.represent(leaf).map(|point| (*leaf, point)))
        .unzip();
    let environment = LeafEnvironment::new(&admitted_points);
    debug!(
        "Target has {} leaves, {} admissible; neighbourhood radius {:.3} A.",
        target_leaves.len(),
        admitted.len(),
        radius
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Candidate generation ===
    reporter.report(Progress::PhaseStart {
        name: "Candidate Generation",
    });
    let leaf_sets = collect_leaf_sets(&generator, &environment, &admitted, motif.len(), radius);
    debug!("Generated {} distinct candidate leaf sets.", leaf_sets.len());
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Superimposition ===
    reporter.report(Progress::PhaseStart {
        name: "Superimposition",
    });
    let superimposer = match config.representation {
        Some(scheme) => SubstructureSuperimposer::with_representation(scheme),
        None => SubstructureSuperimposer::new(config.atom_selection),
    };
    let motif_refs: Vec<&LeafSubstructure> = motif.iter().collect();
    let position_of: HashMap<&LeafIdentifier, &MotifPosition> = motif
        .iter()
        .map(LeafSubstructure::id)
        .zip(generator.positions())
        .collect();

    #[cfg(not(feature = "parallel"))]
    let iterator = leaf_sets.iter();
    #[cfg(feature = "parallel")]
    let iterator = leaf_sets.par_iter();

    let fits: Vec<Option<SubstructureSuperimposition>> = iterator
        .map(|set| {
            let candidate: Vec<&LeafSubstructure> = set.iter().map(|&i| admitted[i]).collect();
            let result = superimposer.ideal_superimpose(&motif_refs, &candidate, |r, c| {
                position_of
                    .get(r.id())
                    .is_some_and(|p| p.accepts(c.family_key()))
            });
            match result {
                Ok(fit) => Some(fit),
                Err(e) => {
                    trace!("Skipping candidate set {:?}: {}", set, e);
                    None
                }
            }
        })
        .collect();
    reporter.report(Progress::PhaseFinish);

    // === Phase 4: Filtering and ranking ===
    let mut matches = Vec::new();
    for (discovery_index, fit) in fits.into_iter().flatten().enumerate() {
        if fit.rmsd() > config.rmsd_cutoff {
            continue;
        }
        let substitution_score = config.substitution_min_score.map(|_| {
            SubstitutionMatrix::Blosum62.score_alignment(
                motif
                    .iter()
                    .zip(&fit.mapped_leaves)
                    .map(|(m, c)| (m.family_key(), c.family_key())),
            )
        });
        if let (Some(score), Some(minimum)) = (substitution_score, config.substitution_min_score) {
            if score < minimum {
                trace!("Rejecting match with substitution score {} < {}.", score, minimum);
                continue;
            }
        }
        matches.push(Fit3DMatch {
            target: target.id().to_string(),
            target_index,
            discovery_index,
            rmsd: fit.rmsd(),
            p_value: None,
            fitted_atom_count: fit.fitted_atom_count(),
            substitution_score,
            leaves: fit.mapped_leaves,
        });
    }
    matches.sort_by(|a, b| a.rmsd.total_cmp(&b.rmsd));

    info!(
        "Found {} match(es) within {:.2} A RMSD.",
        matches.len(),
        config.rmsd_cutoff
    );
    Ok(matches)
}

/// Distinct unordered leaf sets (as sorted indices into `admitted`) that admit at least one
/// valid mapping, in order of first discovery.
fn collect_leaf_sets(
    generator: &ValidCandidateGenerator,
    environment: &LeafEnvironment,
    admitted: &[&LeafSubstructure],
    motif_size: usize,
    radius: f64,
) -> Vec<Vec<usize>> {
    let mut seen = BTreeSet::new();
    let mut sets = Vec::new();
    for center in 0..environment.len() {
        let neighbours = environment.around(center, radius);
        if neighbours.len() < motif_size {
            continue;
        }
        let local: Vec<&LeafSubstructure> = neighbours.iter().map(|&i| admitted[i]).collect();
        for mapping in generator.generate(&local) {
            let mut set: Vec<usize> = mapping.iter().map(|&i| neighbours[i]).collect();
            set.sort_unstable();
            if seen.insert(set.clone()) {
                sets.push(set);
            }
        }
    }
    sets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::pdb::PdbFile;
    use crate::core::utils::geometry::rotation_from_axis_angle;
    use crate::engine::config::Fit3DConfigBuilder;
    use crate::engine::superimposition::AtomSelection;
    use nalgebra::Vector3;

    const MOTIF: &str = "\
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

    fn motif() -> Vec<LeafSubstructure> {
        PdbFile::read_from_str(MOTIF).unwrap().leaves().cloned().collect()
    }

    /// The motif moved rigidly far away, plus a decoy serine elsewhere in chain B.
    fn target() -> Structure {
        let rotation = rotation_from_axis_angle(&Vector3::new(0.3, -1.0, 0.5), 117.0);
        let translation = Vector3::new(25.0, -12.0, 40.0);
        let mut leaves: Vec<LeafSubstructure> = motif()
            .iter()
            .map(|l| l.transformed(&rotation, &translation))
            .collect();
        let decoy = PdbFile::read_from_str(
            "ATOM      1  N   SER B 300      80.000  80.000  80.000  1.00  0.00           N\n\
             ATOM      2  CA  SER B 300      81.000  80.000  80.000  1.00  0.00           C\n\
             ATOM      3  C   SER B 300      81.500  81.300  80.000  1.00  0.00           C\n\
             ATOM      4  O   SER B 300      81.000  82.300  80.000  1.00  0.00           O\n",
        )
        .unwrap();
        leaves.extend(decoy.leaves().cloned());
        let mut structure = Structure::from_leaves("", leaves);
        structure.set_id("2XYZ");
        structure
    }

    #[test]
    fn finds_rigidly_moved_motif_with_zero_rmsd() {
        let matches = run(&motif(), &target(), &Fit3DConfig::default(), &ProgressReporter::new())
            .unwrap();
        assert_eq!(matches.len(), 1);
        let found = &matches[0];
        assert!(found.rmsd < 1e-6, "rmsd = {}", found.rmsd);
        assert_eq!(found.fitted_atom_count, 12);
        assert_eq!(found.target, "2XYZ");
        let serials: Vec<i32> = found.leaf_ids().map(|id| id.serial).collect();
        assert_eq!(serials, vec![57, 102, 195]);
    }

    #[test]
    fn matched_leaves_are_transformed_onto_the_motif() {
        let motif = motif();
        let matches =
            run(&motif, &target(), &Fit3DConfig::default(), &ProgressReporter::new()).unwrap();
        for (query, hit) in motif.iter().zip(&matches[0].leaves) {
            let q = query.atom("CA").unwrap().position;
            let h = hit.atom("CA").unwrap().position;
            assert!((q - h).norm() < 1e-6);
        }
    }

    #[test]
    fn triad_fixture_is_found_in_second_fixture() {
        let query: Vec<LeafSubstructure> =
            PdbFile::read_from_str(include_str!("../../tests/fixtures/motif_HDS_01.pdb"))
                .unwrap()
                .leaves()
                .cloned()
                .collect();
        let target =
            PdbFile::read_from_str(include_str!("../../tests/fixtures/motif_HDS_02.pdb")).unwrap();
        let matches = run(&query, &target, &Fit3DConfig::default(), &ProgressReporter::new())
            .unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].label(), "2HDS_E-40_E-88_E-171");
        assert_eq!(matches[0].fitted_atom_count, 15);
        assert!((matches[0].rmsd - 0.379_285_968_481_709).abs() < 1e-9);
    }

    #[test]
    fn alpha_carbon_selection_fits_three_atoms() {
        let config = Fit3DConfigBuilder::new()
            .atom_selection(AtomSelection::AlphaCarbon)
            .build()
            .unwrap();
        let matches = run(&motif(), &target(), &config, &ProgressReporter::new()).unwrap();
        assert_eq!(matches[0].fitted_atom_count, 3);
    }

    #[test]
    fn exchanges_admit_substituted_families() {
        let thr_target = PdbFile::read_from_str(&MOTIF.replace("SER A 195", "THR A 195")).unwrap();

        let strict = run(&motif(), &thr_target, &Fit3DConfig::default(), &ProgressReporter::new())
            .unwrap();
        assert!(strict.is_empty());

        let config = Fit3DConfigBuilder::new().exchange(2, ["THR"]).build().unwrap();
        let relaxed = run(&motif(), &thr_target, &config, &ProgressReporter::new()).unwrap();
        assert_eq!(relaxed.len(), 1);

        let grouped = Fit3DConfigBuilder::new()
            .use_exchange_groups(true)
            .build()
            .unwrap();
        let by_group = run(&motif(), &thr_target, &grouped, &ProgressReporter::new()).unwrap();
        assert_eq!(by_group.len(), 1);
    }

    #[test]
    fn substitution_filter_rejects_low_scoring_matches() {
        let thr_target = PdbFile::read_from_str(&MOTIF.replace("SER A 195", "THR A 195")).unwrap();
        let config = Fit3DConfigBuilder::new()
            .exchange(2, ["THR"])
            .substitution_min_score(100)
            .build()
            .unwrap();
        assert!(run(&motif(), &thr_target, &config, &ProgressReporter::new())
            .unwrap()
            .is_empty());

        let config = Fit3DConfigBuilder::new()
            .exchange(2, ["THR"])
            .substitution_min_score(0)
            .build()
            .unwrap();
        let matches = run(&motif(), &thr_target, &config, &ProgressReporter::new()).unwrap();
        // HIS-HIS 8, ASP-ASP 6, SER-THR 1
        assert_eq!(matches[0].substitution_score, Some(15));
    }

    #[test]
    fn rmsd_cutoff_discards_distorted_candidates() {
        let distorted = PdbFile::read_from_str(
            &MOTIF.replace(
                "ATOM     10  CA  SER A 195       9.800  16.200  12.400",
                "ATOM     10  CA  SER A 195      12.800  19.200  15.400",
            ),
        )
        .unwrap();
        let loose = run(&motif(), &distorted, &Fit3DConfig::default(), &ProgressReporter::new())
            .unwrap();
        assert_eq!(loose.len(), 1);
        assert!(loose[0].rmsd > 0.1);

        let config = Fit3DConfigBuilder::new().rmsd_cutoff(0.1).build().unwrap();
        let tight = run(&motif(), &distorted, &config, &ProgressReporter::new()).unwrap();
        assert!(tight.is_empty());
    }

    #[test]
    fn rejects_empty_motif_and_empty_target() {
        let config = Fit3DConfig::default();
        assert!(matches!(
            run(&[], &target(), &config, &ProgressReporter::new()),
            Err(AlignmentError::EmptyMotif)
        ));
        assert!(matches!(
            run(&motif(), &Structure::new("EMPTY"), &config, &ProgressReporter::new()),
            Err(AlignmentError::EmptyTarget { .. })
        ));
    }

    #[test]
    fn rejects_motif_leaf_without_selected_atoms() {
        let config = Fit3DConfigBuilder::new()
            .atom_selection(AtomSelection::Sidechain)
            .build()
            .unwrap();
        assert!(matches!(
            run(&motif(), &target(), &config, &ProgressReporter::new()),
            Err(AlignmentError::MotifLeafWithoutAtoms { .. })
        ));
    }

    #[test]
    fn representation_scheme_fits_one_point_per_leaf() {
        let config = Fit3DConfigBuilder::new()
            .representation(RepresentationScheme::Centroid)
            .build()
            .unwrap();
        let matches = run(&motif(), &target(), &config, &ProgressReporter::new()).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].fitted_atom_count, 3);
        assert!(matches[0].rmsd < 1e-6);
    }

    #[test]
    fn overlapping_environments_report_each_leaf_set_once() {
        let config = Fit3DConfigBuilder::new()
            .distance_tolerance(50.0)
            .build()
            .unwrap();
        let matches = run(&motif(), &target(), &config, &ProgressReporter::new()).unwrap();
        let mut sets: Vec<Vec<i32>> = matches
            .iter()
            .map(|m| {
                let mut s: Vec<i32> = m.leaf_ids().map(|id| id.serial).collect();
                s.sort_unstable();
                s
            })
            .collect();
        let before = sets.len();
        sets.dedup();
        assert_eq!(before, sets.len());
    }
}
