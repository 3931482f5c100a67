use super::align::{align_target, validate_motif};
use crate::core::io::pdb::{PdbError, PdbFile};
use crate::core::io::traits::MolecularFile;
use crate::core::models::leaf::LeafSubstructure;
use crate::core::models::structure::Structure;
use crate::engine::config::BatchConfig;
use crate::engine::error::{AlignmentError, BatchError};
use crate::engine::matches::Fit3DMatch;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::statistics::build_model;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A target structure waiting to be searched.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetSource {
    File(PathBuf),
    /// PDB text held in memory; the label names the structure when it has no header id.
    Text { label: String, content: String },
}

impl TargetSource {
    pub fn label(&self) -> String {
        match self {
            Self::File(path) => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Self::Text { label, .. } => label.clone(),
        }
    }

    fn load(&self) -> Result<Structure, PdbError> {
        let mut structure = match self {
            Self::File(path) => PdbFile::read_from_path(path)?,
            Self::Text { content, .. } => PdbFile::read_from_str(content)?,
        };
        if structure.id().is_empty() {
            structure.set_id(self.label());
        }
        Ok(structure)
    }
}

impl From<PathBuf> for TargetSource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

/// Hands out every queued target exactly once, tagged with its queue position.
struct StructureQueue {
    inner: Mutex<std::iter::Enumerate<std::vec::IntoIter<TargetSource>>>,
}

impl StructureQueue {
    fn new(targets: Vec<TargetSource>) -> Self {
        Self {
            inner: Mutex::new(targets.into_iter().enumerate()),
        }
    }

    fn next(&self) -> Option<(usize, TargetSource)> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next()
    }
}

#[derive(Debug, Error)]
enum JobError {
    #[error("failed to read structure: {0}")]
    Read(#[from] PdbError),
    #[error("{0}")]
    Alignment(#[from] AlignmentError),
}

#[derive(Debug)]
enum JobOutcome {
    Searched(Vec<Fit3DMatch>),
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    /// Matches over all targets, sorted by RMSD, queue position and discovery order.
    pub matches: Vec<Fit3DMatch>,
    pub searched: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Searches every target for the query motif on a worker pool and ranks the merged matches.
///
/// A target that cannot be read or searched contributes no matches; the batch only fails
/// when every target failed.
#[instrument(skip_all, name = "fit3d_batch", fields(targets = targets.len()))]
pub fn run(
    motif: &[LeafSubstructure],
    targets: Vec<TargetSource>,
    config: &BatchConfig,
    reporter: &ProgressReporter,
) -> Result<BatchResult, BatchError> {
    // === Phase 0: Validation ===
    if targets.is_empty() {
        return Err(BatchError::NoTargets);
    }
    validate_motif(motif, &config.alignment)?;
    let total = targets.len();
    let queue = StructureQueue::new(targets);

    // === Phase 1: Target search ===
    reporter.report(Progress::PhaseStart {
        name: "Searching Targets",
    });
    reporter.report(Progress::TaskStart {
        total: total as u64,
    });
    info!("Searching {} target structure(s).", total);
    let outcomes = execute_jobs(total, &queue, motif, config, reporter)?;
    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Merge ===
    let mut result = BatchResult::default();
    for outcome in outcomes {
        match outcome {
            JobOutcome::Searched(matches) => {
                result.searched += 1;
                result.matches.extend(matches);
            }
            JobOutcome::Skipped => result.skipped += 1,
            JobOutcome::Failed => result.failed += 1,
        }
    }
    if result.failed == total {
        return Err(BatchError::AllTargetsFailed { count: total });
    }
    result.matches.sort_by(Fit3DMatch::merge_order);

    // === Phase 3: Statistics ===
    if let Some(kind) = config.statistical_model {
        if result.searched > 0 {
            reporter.report(Progress::PhaseStart {
                name: "Statistical Evaluation",
            });
            let model = build_model(kind, config.alignment.rmsd_cutoff, result.searched)?;
            model.calculate_p_values(&mut result.matches)?;
            reporter.report(Progress::PhaseFinish);
        }
    }

    info!(
        "Batch finished: {} match(es) from {} searched, {} skipped, {} failed target(s).",
        result.matches.len(),
        result.searched,
        result.skipped,
        result.failed
    );
    Ok(result)
}

#[cfg(feature = "parallel")]
fn execute_jobs(
    jobs: usize,
    queue: &StructureQueue,
    motif: &[LeafSubstructure],
    config: &BatchConfig,
    reporter: &ProgressReporter,
) -> Result<Vec<JobOutcome>, BatchError> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if config.threads > 0 {
        builder = builder.num_threads(config.threads);
    }
    let pool = builder
        .build()
        .map_err(|e| BatchError::ThreadPool(e.to_string()))?;
    debug!("Worker pool ready with {} thread(s).", pool.current_num_threads());

    Ok(pool.install(|| {
        (0..jobs)
            .into_par_iter()
            .map(|_| run_job(queue, motif, config, reporter))
            .collect()
    }))
}

#[cfg(not(feature = "parallel"))]
fn execute_jobs(
    jobs: usize,
    queue: &StructureQueue,
    motif: &[LeafSubstructure],
    config: &BatchConfig,
    reporter: &ProgressReporter,
) -> Result<Vec<JobOutcome>, BatchError> {
    Ok((0..jobs)
        .map(|_| run_job(queue, motif, config, reporter))
        .collect())
}

fn run_job(
    queue: &StructureQueue,
    motif: &[LeafSubstructure],
    config: &BatchConfig,
    reporter: &ProgressReporter,
) -> JobOutcome {
    // One job is submitted per queued target, so the queue cannot run dry here.
    let Some((index, source)) = queue.next() else {
        return JobOutcome::Skipped;
    };
    let label = source.label();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        search_target(index, &source, motif, config)
    }));
    let outcome = match outcome {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            warn!(structure = %label, "Target failed and contributes no matches: {}", e);
            JobOutcome::Failed
        }
        Err(_) => {
            warn!(structure = %label, "Search panicked; target contributes no matches.");
            JobOutcome::Failed
        }
    };
    reporter.report(Progress::StatusUpdate { text: label });
    reporter.report(Progress::TaskIncrement);
    outcome
}

fn search_target(
    index: usize,
    source: &TargetSource,
    motif: &[LeafSubstructure],
    config: &BatchConfig,
) -> Result<JobOutcome, JobError> {
    let structure = source.load()?;
    if let Some(rule) = config.skip_rules.iter().find(|r| r.applies(&structure)) {
        info!(structure = %structure.id(), "Skipping target ({}).", rule);
        return Ok(JobOutcome::Skipped);
    }
    let matches = align_target(
        motif,
        &structure,
        &config.alignment,
        index,
        &ProgressReporter::new(),
    )?;
    Ok(JobOutcome::Searched(matches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::utils::geometry::rotation_from_axis_angle;
    use crate::engine::config::{BatchConfigBuilder, Fit3DConfig, SkipRule};
    use crate::engine::statistics::StatisticalModelKind;
    use nalgebra::{Rotation3, Vector3};
    use std::sync::atomic::{AtomicU64, Ordering};

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

    /// The motif rigidly moved, with its first leaf shifted so every target yields a
    /// distinct RMSD.
    fn target_text(seed: usize) -> String {
        let rotation =
            rotation_from_axis_angle(&Vector3::new(1.0, seed as f64, 0.5), 20.0 * seed as f64);
        let translation = Vector3::new(seed as f64 * 3.0, -5.0, 7.0);
        let mut leaves: Vec<LeafSubstructure> = motif()
            .iter()
            .map(|l| l.transformed(&rotation, &translation))
            .collect();
        let nudge = Vector3::new(0.05 * seed as f64, 0.0, 0.0);
        leaves[0] = leaves[0].transformed(&Rotation3::identity(), &nudge);
        let structure = Structure::from_leaves(format!("T{:03}", seed), leaves);
        PdbFile::write_to_string(&structure).unwrap()
    }

    fn targets(count: usize) -> Vec<TargetSource> {
        (0..count)
            .map(|seed| TargetSource::Text {
                label: format!("target-{}", seed),
                content: target_text(seed),
            })
            .collect()
    }

    fn config(threads: usize) -> BatchConfig {
        BatchConfigBuilder::new()
            .alignment(Fit3DConfig::default())
            .threads(threads)
            .build()
            .unwrap()
    }

    #[test]
    fn finds_one_match_per_target_sorted_by_rmsd() {
        let result = run(&motif(), targets(5), &config(2), &ProgressReporter::new()).unwrap();
        assert_eq!(result.searched, 5);
        assert_eq!(result.matches.len(), 5);
        assert!(result.matches.windows(2).all(|w| w[0].rmsd <= w[1].rmsd));
        assert_eq!(result.matches[0].target_index, 0);
    }

    #[test]
    fn pool_size_does_not_change_merged_results() {
        let sequential = run(&motif(), targets(8), &config(1), &ProgressReporter::new()).unwrap();
        let parallel = run(&motif(), targets(8), &config(4), &ProgressReporter::new()).unwrap();
        let key = |r: &BatchResult| -> Vec<(String, usize)> {
            r.matches
                .iter()
                .map(|m| (m.label(), m.target_index))
                .collect()
        };
        assert_eq!(key(&sequential), key(&parallel));
        for (a, b) in sequential.matches.iter().zip(&parallel.matches) {
            assert!((a.rmsd - b.rmsd).abs() < 1e-12);
        }
    }

    #[test]
    fn unreadable_targets_are_logged_and_skipped() {
        let mut queue = targets(2);
        queue.push(TargetSource::Text {
            label: "broken".into(),
            content: "ATOM      1  CA  ALA A   1      xx.xxx   0.000   0.000  1.00  0.00           C\n"
                .into(),
        });
        queue.push(TargetSource::File(PathBuf::from("/nonexistent/missing.pdb")));
        let result = run(&motif(), queue, &config(2), &ProgressReporter::new()).unwrap();
        assert_eq!(result.searched, 2);
        assert_eq!(result.failed, 2);
        assert_eq!(result.matches.len(), 2);
    }

    #[test]
    fn batch_fails_only_when_every_target_failed() {
        let queue = vec![TargetSource::File(PathBuf::from("/nonexistent/a.pdb"))];
        assert!(matches!(
            run(&motif(), queue, &config(1), &ProgressReporter::new()),
            Err(BatchError::AllTargetsFailed { count: 1 })
        ));
        assert!(matches!(
            run(&motif(), Vec::new(), &config(1), &ProgressReporter::new()),
            Err(BatchError::NoTargets)
        ));
    }

    #[test]
    fn skip_rules_filter_reduced_targets() {
        let mut queue = targets(1);
        queue.push(TargetSource::Text {
            label: "ca-trace".into(),
            content: "ATOM      1  CA  HIS A   1       0.000   0.000   0.000  1.00  0.00           C\n\
                      ATOM      2  CA  ASP A   2       3.800   0.000   0.000  1.00  0.00           C\n\
                      ATOM      3  CA  SER A   3       3.800   3.800   0.000  1.00  0.00           C\n"
                .into(),
        });
        let config = BatchConfigBuilder::new()
            .alignment(Fit3DConfig::default())
            .skip_rule(SkipRule::AlphaCarbonOnly)
            .build()
            .unwrap();
        let result = run(&motif(), queue, &config, &ProgressReporter::new()).unwrap();
        assert_eq!(result.skipped, 1);
        assert_eq!(result.searched, 1);
    }

    #[test]
    fn statistical_model_assigns_p_values_to_merged_matches() {
        let config = BatchConfigBuilder::new()
            .alignment(Fit3DConfig::default())
            .statistical_model(StatisticalModelKind::Fofanov)
            .build()
            .unwrap();
        let result = run(&motif(), targets(6), &config, &ProgressReporter::new()).unwrap();
        assert!(result.matches.iter().all(|m| m.p_value.is_some()));
        assert!(
            result
                .matches
                .iter()
                .all(|m| (0.0..=1.0).contains(&m.p_value.unwrap()))
        );
    }

    #[test]
    fn reporter_counts_every_target() {
        let increments = AtomicU64::new(0);
        let total = AtomicU64::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| match event {
            Progress::TaskStart { total: t } => total.store(t, Ordering::SeqCst),
            Progress::TaskIncrement => {
                increments.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }));
        let mut queue = targets(3);
        queue.push(TargetSource::File(PathBuf::from("/nonexistent/b.pdb")));
        run(&motif(), queue, &config(2), &reporter).unwrap();
        assert_eq!(total.load(Ordering::SeqCst), 4);
        assert_eq!(increments.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn file_targets_fall_back_to_their_stem_as_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("7ABC.pdb");
        std::fs::write(&path, MOTIF).unwrap();
        let result = run(
            &motif(),
            vec![TargetSource::from(path)],
            &config(1),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert_eq!(result.matches[0].target, "7ABC");
    }
}
