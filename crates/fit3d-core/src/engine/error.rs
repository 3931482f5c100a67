use thiserror::Error;

use super::config::ConfigError;
use super::statistics::StatisticsError;
use super::superimposition::SuperimpositionError;

#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error("Query motif contains no leaves")]
    EmptyMotif,

    #[error("Motif leaf {leaf} has no atoms under the configured atom selection")]
    MotifLeafWithoutAtoms { leaf: String },

    #[error("Target structure '{target}' contains no leaves")]
    EmptyTarget { target: String },

    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Superimposition failed: {source}")]
    Superimposition {
        #[from]
        source: SuperimpositionError,
    },
}

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("No target structures were queued")]
    NoTargets,

    #[error("All {count} target(s) failed; no matches could be collected")]
    AllTargetsFailed { count: usize },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("Query motif is unusable: {source}")]
    Motif {
        #[from]
        source: AlignmentError,
    },

    #[error("Statistical evaluation failed: {source}")]
    Statistics {
        #[from]
        source: StatisticsError,
    },
}
