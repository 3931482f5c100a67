use clap::{Args, Parser, Subcommand};
use fit3d::engine::config::SkipRule;
use fit3d::engine::representation::RepresentationScheme;
use fit3d::engine::statistics::StatisticalModelKind;
use fit3d::engine::superimposition::AtomSelection;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Fit3D CLI - search macromolecular structures for occurrences of a small structural motif.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Number of worker threads for the target search.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search one or more target structures for a query motif.
    Search(SearchArgs),
}

/// Arguments for the `search` subcommand.
#[derive(Args, Debug)]
pub struct SearchArgs {
    // --- Core Arguments ---
    /// PDB file holding the query motif; every leaf of its first model is used.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub motif: PathBuf,

    /// Target PDB files, or directories whose `.pdb` files are all searched.
    #[arg(required = true, value_name = "TARGET")]
    pub targets: Vec<PathBuf>,

    /// Directory receiving one PDB file per match and the CSV summary.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Alignment Overrides ---
    /// Maximal RMSD (in Angstrom) of a reported match.
    #[arg(short = 'r', long, value_name = "FLOAT")]
    pub rmsd_cutoff: Option<f64>,

    /// Added to the motif extent when extracting target environments.
    #[arg(long, value_name = "FLOAT")]
    pub distance_tolerance: Option<f64>,

    /// Atoms used for fitting: all, heavy, backbone, ca or sidechain.
    #[arg(short = 'a', long, value_name = "SELECTION")]
    pub atoms: Option<AtomSelection>,

    /// Fit one representative point per leaf instead of atoms:
    /// ca, cb, centroid, sidechain-centroid or last-heavy-sidechain.
    #[arg(long, value_name = "SCHEME")]
    pub representation: Option<RepresentationScheme>,

    /// Admit members of the exchange groups of every motif family.
    #[arg(long)]
    pub exchange_groups: bool,

    /// Minimum summed BLOSUM62 score of a match against the motif.
    #[arg(long, value_name = "INT", allow_hyphen_values = true)]
    pub min_substitution_score: Option<i32>,

    // --- Batch Overrides ---
    /// Attach p-values using the given model: fofanov or stark.
    #[arg(short = 's', long, value_name = "MODEL")]
    pub statistics: Option<StatisticalModelKind>,

    /// Skip reduced targets: ca-only or backbone-only. Can be used multiple times.
    #[arg(long = "skip", value_name = "RULE")]
    pub skip_rules: Vec<SkipRule>,

    /// Write at most this many match structures (best RMSD first).
    #[arg(long, value_name = "INT")]
    pub max_structures: Option<usize>,
}
