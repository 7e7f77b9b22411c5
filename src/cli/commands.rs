//! Command implementations for the syncoll CLI.

use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::{Config, CorpusProps};
use crate::error::{Result, SyncollError};
use crate::import::{ImportOptions, import_corpus, update_co_occ};
use crate::query::{QueryEngine, Relation, Word};
use crate::storage::Database;

/// Execute a CLI command.
pub fn execute_command(args: SyncollArgs) -> Result<()> {
    match &args.command {
        Command::Import(import_args) => run_import(import_args, &args),
        Command::UpdateCoOcc(update_args) => run_update_co_occ(update_args, &args),
        Command::Query(query_args) => run_query(query_args, &args),
        Command::CheckConfig => check_config(&args),
        Command::Version => output_result(
            "Version",
            &VersionInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: crate::VERSION.to_string(),
            },
            &args,
        ),
    }
}

/// Load and validate the configuration named on the command line.
fn load_config(cli_args: &SyncollArgs) -> Result<Config> {
    let path = cli_args.config.as_deref().ok_or_else(|| {
        SyncollError::config("no configuration file given (use --config or SYNCOLL_CONFIG)")
    })?;
    let mut conf = Config::load(path)?;
    conf.validate_and_defaults()?;
    Ok(conf)
}

fn corpus_props<'a>(conf: &'a Config, corpus_id: &str) -> Result<&'a CorpusProps> {
    conf.corpora
        .get_corpus_props(corpus_id)
        .ok_or_else(|| SyncollError::corpus_not_found(corpus_id))
}

fn check_vertical(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SyncollError::invalid_argument(format!(
            "vertical file {} not found",
            path.display()
        )))
    }
}

fn run_import(args: &ImportArgs, cli_args: &SyncollArgs) -> Result<()> {
    let conf = load_config(cli_args)?;
    let corpus = corpus_props(&conf, &args.corpus_id)?;
    check_vertical(&args.vertical_path)?;

    let mut opts = ImportOptions::from_conf(&conf.import);
    opts.force = args.force;
    if let Some(mode) = args.force_mode {
        opts.force_mode = mode.into();
    }
    if let Some(span) = args.span {
        opts.span = span;
    }
    if let Some(batch_size) = args.batch_size {
        opts.batch_size = batch_size.max(1);
    }
    info!(
        "importing {} from {} (span {}, force {})",
        corpus.name,
        args.vertical_path.display(),
        opts.span,
        opts.force
    );

    let db = Database::open(&conf.db)?;
    let report = import_corpus(&db, corpus, &args.vertical_path, &opts)?;
    output_result("Import finished", &report, cli_args)
}

fn run_update_co_occ(args: &UpdateCoOccArgs, cli_args: &SyncollArgs) -> Result<()> {
    let conf = load_config(cli_args)?;
    let corpus = corpus_props(&conf, &args.corpus_id)?;
    check_vertical(&args.vertical_path)?;

    let mut opts = ImportOptions::from_conf(&conf.import);
    if let Some(span) = args.span {
        opts.span = span;
    }
    if let Some(batch_size) = args.batch_size {
        opts.batch_size = batch_size.max(1);
    }

    let db = Database::open(&conf.db)?;
    let report = update_co_occ(&db, corpus, &args.vertical_path, &opts)?;
    output_result("Co-occurrence scores updated", &report, cli_args)
}

fn run_query(args: &QueryArgs, cli_args: &SyncollArgs) -> Result<()> {
    let mut conf = load_config(cli_args)?;
    if let Some(persistence) = args.persistence {
        conf.query.persistence = persistence.into();
    }
    let db = Arc::new(Database::open(&conf.db)?);
    let engine = QueryEngine::new(db, &conf)?;

    let mut word = Word::new(args.word.clone());
    if let Some(pos) = &args.pos {
        word = word.with_pos(pos.clone());
    }
    let relation = Relation::from(args.relation);
    let ans = engine.rank_candidates(
        &args.corpus_id,
        &word,
        relation,
        args.min_freq.unwrap_or(conf.query.min_freq),
        args.max_items.unwrap_or(conf.query.default_max_items),
    )?;
    output_result(
        &format!("{relation} candidates of {}", word.v),
        &ans,
        cli_args,
    )
}

fn check_config(cli_args: &SyncollArgs) -> Result<()> {
    let conf = load_config(cli_args)?;
    let summary = ConfigSummary {
        source: conf.source_path().map(|p| p.display().to_string()),
        db_path: conf.db.path.display().to_string(),
        corpora: conf.corpora.iter().map(|c| c.name.clone()).collect(),
        persistence: serde_json::to_value(conf.query.persistence)?
            .as_str()
            .unwrap_or_default()
            .to_string(),
        fetch_partitions: conf.query.fetch_partitions,
    };
    output_result("Configuration is valid", &summary, cli_args)
}
