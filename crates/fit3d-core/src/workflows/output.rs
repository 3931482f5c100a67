use crate::core::io::pdb::{PdbError, PdbFile};
use crate::core::io::traits::MolecularFile;
use crate::core::models::structure::Structure;
use crate::engine::matches::Fit3DMatch;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write match structure to '{path}': {source}")]
    Structure { path: PathBuf, source: PdbError },
    #[error("Failed to write match summary: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Serialize)]
struct SummaryRecord<'a> {
    label: &'a str,
    rmsd: f64,
    pvalue: Option<f64>,
}

/// File name of a match structure, e.g. `0.1234_1ABC_A-57_A-102_A-195.pdb`.
pub fn match_file_name(fit: &Fit3DMatch) -> String {
    format!("{:.4}_{}.pdb", fit.rmsd, fit.label())
}

/// Writes the transformed candidate leaves of a match as a PDB file inside `dir` and returns
/// the path written.
pub fn write_match_structure(fit: &Fit3DMatch, dir: &Path) -> Result<PathBuf, OutputError> {
    let path = dir.join(match_file_name(fit));
    let structure = Structure::from_leaves(fit.target.clone(), fit.leaves.iter().cloned());
    PdbFile::write_to_path(&structure, &path).map_err(|source| OutputError::Structure {
        path: path.clone(),
        source,
    })?;
    debug!("Wrote match structure to {}", path.display());
    Ok(path)
}

/// Writes a `label,rmsd,pvalue` line per match; the p-value field is empty when unset.
pub fn write_summary_csv<W: Write>(matches: &[Fit3DMatch], writer: W) -> Result<(), OutputError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for fit in matches {
        let label = fit.label();
        csv_writer.serialize(SummaryRecord {
            label: &label,
            rmsd: fit.rmsd,
            pvalue: fit.p_value,
        })?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
