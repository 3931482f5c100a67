use crate::cli::SearchArgs;
use crate::config::{PartialSearchConfig, SearchSettings};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use fit3d::{
    core::io::{pdb::PdbFile, traits::MolecularFile},
    core::models::leaf::LeafSubstructure,
    engine::progress::ProgressReporter,
    workflows::{
        self,
        batch::{BatchResult, TargetSource},
        output,
    },
};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const SUMMARY_FILE_NAME: &str = "summary.csv";
const PRINTED_MATCHES: usize = 10;

pub fn run(args: SearchArgs, threads: Option<usize>, quiet: bool) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialSearchConfig::from_file(path)?,
        None => PartialSearchConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let settings = partial_config.merge_with_cli(&args, threads)?;

    info!("Loading query motif from {:?}", &args.motif);
    let motif = load_motif(&args.motif)?;
    let targets = collect_targets(&args.targets)?;
    info!(
        "Motif has {} leaves; {} target structure(s) queued.",
        motif.len(),
        targets.len()
    );

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let result = workflows::batch::run(&motif, targets, &settings.batch, &reporter)?;
    print_summary(&result);

    if let Some(dir) = &args.output {
        write_results(&result, dir, &settings)?;
    }
    Ok(())
}

fn load_motif(path: &Path) -> Result<Vec<LeafSubstructure>> {
    let structure = PdbFile::read_from_path(path).map_err(|e| CliError::FileParsing {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    let leaves: Vec<LeafSubstructure> = structure
        .first_model()
        .map(|model| model.leaves().cloned().collect())
        .unwrap_or_default();
    if leaves.is_empty() {
        return Err(CliError::Argument(format!(
            "Motif file '{}' contains no leaves.",
            path.display()
        )));
    }
    Ok(leaves)
}

/// Expands directories into their `.pdb` files (sorted by name) and keeps files as given.
fn collect_targets(paths: &[PathBuf]) -> Result<Vec<TargetSource>> {
    let mut targets = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut files: Vec<PathBuf> = fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && has_pdb_extension(p))
                .collect();
            files.sort();
            if files.is_empty() {
                warn!("Directory {:?} contains no PDB files.", path);
            }
            targets.extend(files.into_iter().map(TargetSource::File));
        } else {
            targets.push(TargetSource::File(path.clone()));
        }
    }
    if targets.is_empty() {
        return Err(CliError::Argument(
            "No target structures were found.".to_string(),
        ));
    }
    Ok(targets)
}

fn has_pdb_extension(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdb") || ext.eq_ignore_ascii_case("ent"))
}

fn print_summary(result: &BatchResult) {
    println!(
        "Searched {} target(s): {} match(es), {} skipped, {} failed.",
        result.searched,
        result.matches.len(),
        result.skipped,
        result.failed
    );
    for fit in result.matches.iter().take(PRINTED_MATCHES) {
        match fit.p_value {
            Some(p) => println!("  {:>8.4}  p={:<10.3e} {}", fit.rmsd, p, fit.label()),
            None => println!("  {:>8.4}  {}", fit.rmsd, fit.label()),
        }
    }
    if result.matches.len() > PRINTED_MATCHES {
        println!("  ... and {} more.", result.matches.len() - PRINTED_MATCHES);
    }
}

fn write_results(result: &BatchResult, dir: &Path, settings: &SearchSettings) -> Result<()> {
    fs::create_dir_all(dir)?;

    let limit = settings.max_structures.unwrap_or(result.matches.len());
    for fit in result.matches.iter().take(limit) {
        output::write_match_structure(fit, dir)?;
    }

    let summary_path = dir.join(SUMMARY_FILE_NAME);
    output::write_summary_csv(&result.matches, BufWriter::new(File::create(&summary_path)?))?;
    info!(
        "Wrote {} match structure(s) and {}",
        limit.min(result.matches.len()),
        summary_path.display()
    );
    println!("Results written to {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use tempfile::tempdir;

    const MOTIF_HDS_01: &str =
        include_str!("../../../fit3d-core/tests/fixtures/motif_HDS_01.pdb");
    const MOTIF_HDS_02: &str =
        include_str!("../../../fit3d-core/tests/fixtures/motif_HDS_02.pdb");

    fn search_args(argv: &[&str]) -> SearchArgs {
        let mut full = vec!["fit3d", "search"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Commands::Search(args) => args,
        }
    }

    #[test]
    fn collect_targets_expands_directories_in_name_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.pdb"), "").unwrap();
        fs::write(dir.path().join("a.PDB"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        let single = dir.path().join("single.ent");
        fs::write(&single, "").unwrap();

        let targets = collect_targets(&[dir.path().to_path_buf()]).unwrap();
        let labels: Vec<String> = targets.iter().map(TargetSource::label).collect();
        assert_eq!(labels, vec!["a", "b", "single"]);

        let explicit = collect_targets(&[single]).unwrap();
        assert_eq!(explicit.len(), 1);
    }

    #[test]
    fn collect_targets_rejects_empty_input() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            collect_targets(&[dir.path().to_path_buf()]),
            Err(CliError::Argument(_))
        ));
    }

    #[test]
    fn load_motif_reports_unparsable_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("motif.pdb");
        fs::write(
            &path,
            "ATOM      1  CA  HIS A  57      xx.xxx  10.000  10.000  1.00  0.00           C\n",
        )
        .unwrap();
        assert!(matches!(
            load_motif(&path),
            Err(CliError::FileParsing { .. })
        ));

        fs::write(&path, "END\n").unwrap();
        assert!(matches!(load_motif(&path), Err(CliError::Argument(_))));
    }

    #[test]
    fn search_writes_match_structures_and_summary() {
        let dir = tempdir().unwrap();
        let motif_path = dir.path().join("motif_HDS_01.pdb");
        let targets = dir.path().join("targets");
        let output_dir = dir.path().join("out");
        fs::create_dir_all(&targets).unwrap();
        fs::write(&motif_path, MOTIF_HDS_01).unwrap();
        fs::write(targets.join("motif_HDS_02.pdb"), MOTIF_HDS_02).unwrap();
        fs::write(targets.join("broken.pdb"), "ATOM  xxxxx\n").unwrap();

        let args = search_args(&[
            "-m",
            motif_path.to_str().unwrap(),
            targets.to_str().unwrap(),
            "-o",
            output_dir.to_str().unwrap(),
        ]);
        run(args, Some(2), true).unwrap();

        let summary = fs::read_to_string(output_dir.join(SUMMARY_FILE_NAME)).unwrap();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "label,rmsd,pvalue");
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("2HDS_E-40_E-88_E-171,0.3792"));

        let written: Vec<String> = fs::read_dir(&output_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".pdb"))
            .collect();
        assert_eq!(written, vec!["0.3793_2HDS_E-40_E-88_E-171.pdb"]);
    }
}
