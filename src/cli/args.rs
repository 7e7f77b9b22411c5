//! Command line argument parsing for the syncoll CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::{ForceMode, PersistenceKind};
use crate::query::Relation;

/// syncoll - syntactic collocations from dependency-parsed corpora
#[derive(Parser, Debug, Clone)]
#[command(name = "syncoll")]
#[command(about = "Syntactic collocation extraction and candidate ranking")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct SyncollArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long = "format", default_value = "human", global = true)]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Path to the JSON configuration file
    #[arg(short, long, env = "SYNCOLL_CONFIG", value_name = "CONFIG_FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl SyncollArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Aggregate a vertical file into a corpus' collocation tables
    Import(ImportArgs),

    /// Recompute co-occurrence scores of an imported corpus
    #[command(name = "update-coocc")]
    UpdateCoOcc(UpdateCoOccArgs),

    /// Rank collocation candidates of a word
    Query(QueryArgs),

    /// Load and validate the configuration
    #[command(name = "check-config")]
    CheckConfig,

    /// Show version information
    Version,
}

/// Arguments of the import command
#[derive(Parser, Debug, Clone)]
pub struct ImportArgs {
    /// Corpus identifier as configured
    #[arg(value_name = "CORPUS_ID")]
    pub corpus_id: String,

    /// Vertical file to import
    #[arg(value_name = "VERTICAL_FILE")]
    pub vertical_path: PathBuf,

    /// Co-occurrence window radius (overrides the configuration)
    #[arg(long)]
    pub span: Option<usize>,

    /// Recreate the corpus tables before importing
    #[arg(short, long)]
    pub force: bool,

    /// What --force does with existing tables
    #[arg(long)]
    pub force_mode: Option<ForceModeArg>,

    /// Rows per INSERT statement (overrides the configuration)
    #[arg(short, long)]
    pub batch_size: Option<usize>,
}

/// Arguments of the update-coocc command
#[derive(Parser, Debug, Clone)]
pub struct UpdateCoOccArgs {
    /// Corpus identifier as configured
    #[arg(value_name = "CORPUS_ID")]
    pub corpus_id: String,

    /// Vertical file the corpus was imported from
    #[arg(value_name = "VERTICAL_FILE")]
    pub vertical_path: PathBuf,

    /// Co-occurrence window radius (overrides the configuration)
    #[arg(long)]
    pub span: Option<usize>,

    /// Rows per UPDATE chunk (overrides the configuration)
    #[arg(short, long)]
    pub batch_size: Option<usize>,
}

/// Arguments of the query command
#[derive(Parser, Debug, Clone)]
pub struct QueryArgs {
    /// Corpus identifier as configured
    #[arg(value_name = "CORPUS_ID")]
    pub corpus_id: String,

    /// Relation to search
    #[arg(value_name = "RELATION")]
    pub relation: RelationArg,

    /// Lemma of the query word
    #[arg(value_name = "WORD")]
    pub word: String,

    /// Part of speech of the query word
    #[arg(short, long)]
    pub pos: Option<String>,

    /// Maximum number of candidates
    #[arg(short = 'n', long)]
    pub max_items: Option<usize>,

    /// Minimum joint frequency of a candidate
    #[arg(long)]
    pub min_freq: Option<i64>,

    /// Persistence strategy (overrides the configuration)
    #[arg(long)]
    pub persistence: Option<PersistenceArg>,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceModeArg {
    Drop,
    Truncate,
}

impl From<ForceModeArg> for ForceMode {
    fn from(arg: ForceModeArg) -> Self {
        match arg {
            ForceModeArg::Drop => ForceMode::Drop,
            ForceModeArg::Truncate => ForceMode::Truncate,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceArg {
    Precomputed,
    RawSums,
    MaterializedView,
}

impl From<PersistenceArg> for PersistenceKind {
    fn from(arg: PersistenceArg) -> Self {
        match arg {
            PersistenceArg::Precomputed => PersistenceKind::Precomputed,
            PersistenceArg::RawSums => PersistenceKind::RawSums,
            PersistenceArg::MaterializedView => PersistenceKind::MaterializedView,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationArg {
    NounModifiedBy,
    ModifiersOf,
    VerbsSubject,
    VerbsObject,
}

impl From<RelationArg> for Relation {
    fn from(arg: RelationArg) -> Self {
        match arg {
            RelationArg::NounModifiedBy => Relation::NounsModifiedBy,
            RelationArg::ModifiersOf => Relation::ModifiersOf,
            RelationArg::VerbsSubject => Relation::VerbsSubject,
            RelationArg::VerbsObject => Relation::VerbsObject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_command() {
        let args = SyncollArgs::try_parse_from([
            "syncoll",
            "-c",
            "conf.json",
            "import",
            "ud_en",
            "/data/ud_en.vrt",
            "--force",
            "--force-mode",
            "truncate",
            "--span",
            "3",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("conf.json")));
        if let Command::Import(import_args) = args.command {
            assert_eq!(import_args.corpus_id, "ud_en");
            assert_eq!(import_args.vertical_path, PathBuf::from("/data/ud_en.vrt"));
            assert!(import_args.force);
            assert_eq!(import_args.force_mode, Some(ForceModeArg::Truncate));
            assert_eq!(import_args.span, Some(3));
            assert_eq!(import_args.batch_size, None);
        } else {
            panic!("Expected Import command");
        }
    }

    #[test]
    fn test_query_command() {
        let args = SyncollArgs::try_parse_from([
            "syncoll",
            "query",
            "ud_en",
            "verbs-object",
            "ball",
            "--pos",
            "NOUN",
            "-n",
            "5",
            "--persistence",
            "materialized-view",
        ])
        .unwrap();

        if let Command::Query(query_args) = args.command {
            assert_eq!(Relation::from(query_args.relation), Relation::VerbsObject);
            assert_eq!(query_args.word, "ball");
            assert_eq!(query_args.pos.as_deref(), Some("NOUN"));
            assert_eq!(query_args.max_items, Some(5));
            assert_eq!(
                query_args.persistence.map(PersistenceKind::from),
                Some(PersistenceKind::MaterializedView)
            );
        } else {
            panic!("Expected Query command");
        }
    }

    #[test]
    fn test_verbosity_levels() {
        let args = SyncollArgs::try_parse_from(["syncoll", "version"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = SyncollArgs::try_parse_from(["syncoll", "-vv", "version"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        let args = SyncollArgs::try_parse_from(["syncoll", "--quiet", "version"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args = SyncollArgs::try_parse_from(["syncoll", "--format", "json", "check-config"]).unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
        assert!(matches!(args.command, Command::CheckConfig));
    }
}
