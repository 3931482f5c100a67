use crate::cli::SearchArgs;
use crate::error::{CliError, Result};
use fit3d::engine::config as core_config;
use fit3d::engine::config::SkipRule;
use fit3d::engine::representation::RepresentationScheme;
use fit3d::engine::statistics::StatisticalModelKind;
use fit3d::engine::superimposition::AtomSelection;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
struct PartialExchange {
    /// Zero-based index of the motif leaf.
    position: usize,
    families: Vec<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialAlignmentConfig {
    rmsd_cutoff: Option<f64>,
    distance_tolerance: Option<f64>,
    atoms: Option<String>,
    representation: Option<String>,
    exchange_groups: Option<bool>,
    min_substitution_score: Option<i32>,
    #[serde(default)]
    exchanges: Vec<PartialExchange>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialBatchConfig {
    statistics: Option<String>,
    #[serde(default)]
    skip: Vec<String>,
    max_structures: Option<usize>,
}

/// Search settings read from a TOML file; every value may be overridden on the command line.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialSearchConfig {
    alignment: Option<PartialAlignmentConfig>,
    batch: Option<PartialBatchConfig>,
}

/// The merged settings of one `search` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub batch: core_config::BatchConfig,
    pub max_structures: Option<usize>,
}

impl PartialSearchConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn merge_with_cli(
        mut self,
        args: &SearchArgs,
        threads: Option<usize>,
    ) -> Result<SearchSettings> {
        let alignment = self.alignment.take().unwrap_or_default();
        let batch = self.batch.take().unwrap_or_default();

        let exchange_groups = args.exchange_groups || alignment.exchange_groups.unwrap_or(false);
        let mut builder =
            core_config::Fit3DConfigBuilder::new().use_exchange_groups(exchange_groups);
        if let Some(cutoff) = args.rmsd_cutoff.or(alignment.rmsd_cutoff) {
            builder = builder.rmsd_cutoff(cutoff);
        }
        if let Some(tolerance) = args.distance_tolerance.or(alignment.distance_tolerance) {
            builder = builder.distance_tolerance(tolerance);
        }
        if let Some(selection) =
            Self::resolve::<AtomSelection>(args.atoms, alignment.atoms, "alignment.atoms")?
        {
            builder = builder.atom_selection(selection);
        }
        if let Some(scheme) = Self::resolve::<RepresentationScheme>(
            args.representation,
            alignment.representation,
            "alignment.representation",
        )? {
            builder = builder.representation(scheme);
        }
        if let Some(score) = args.min_substitution_score.or(alignment.min_substitution_score) {
            builder = builder.substitution_min_score(score);
        }
        for exchange in alignment.exchanges {
            builder = builder.exchange(
                exchange.position,
                exchange.families.iter().map(|f| f.to_ascii_uppercase()),
            );
        }
        let alignment_config = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let mut batch_builder = core_config::BatchConfigBuilder::new()
            .alignment(alignment_config)
            .threads(threads.unwrap_or(0));
        if let Some(model) = Self::resolve::<StatisticalModelKind>(
            args.statistics,
            batch.statistics,
            "batch.statistics",
        )? {
            batch_builder = batch_builder.statistical_model(model);
        }
        let file_rules = batch
            .skip
            .iter()
            .map(|rule| Self::parse_value::<SkipRule>(rule, "batch.skip"))
            .collect::<Result<Vec<_>>>()?;
        for rule in file_rules.into_iter().chain(args.skip_rules.iter().copied()) {
            batch_builder = batch_builder.skip_rule(rule);
        }

        Ok(SearchSettings {
            batch: batch_builder
                .build()
                .map_err(|e| CliError::Config(e.to_string()))?,
            max_structures: args.max_structures.or(batch.max_structures),
        })
    }

    /// A command-line value wins over the file's string value, which is parsed on demand.
    fn resolve<T>(cli: Option<T>, file: Option<String>, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match (cli, file) {
            (Some(value), _) => Ok(Some(value)),
            (None, Some(text)) => Self::parse_value(&text, key).map(Some),
            (None, None) => Ok(None),
        }
    }

    fn parse_value<T>(text: &str, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        text.parse()
            .map_err(|e| CliError::Config(format!("Invalid value for `{}`: {}", key, e)))
    }
}
