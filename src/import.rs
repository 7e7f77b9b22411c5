//! Batch import of a vertical file into a corpus' aggregate tables.
//!
//! The import runs two passes over the file. The first builds the edge
//! table with both marginal sums, the second counts window co-occurrences
//! of the word pairs found by the first. Everything is then written in a
//! single transaction, which also rebuilds the candidate tables, so every
//! persistence strategy can serve the imported data.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Local};
use log::info;
use serde::{Deserialize, Serialize};

use crate::aggregation::{CoOccurrenceAggregator, EdgeAggregator, WordKey};
use crate::config::{CorpusProps, ForceMode, ImportConf};
use crate::error::Result;
use crate::storage::schema::{self, TableNames};
use crate::storage::{BulkWriter, Database, load_edge_words};
use crate::vertical::{TokenLayout, parse_vertical};

/// Per-run options of an import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Co-occurrence window radius.
    pub span: usize,
    /// Recreate (or empty) the tables before loading.
    pub force: bool,
    pub force_mode: ForceMode,
    pub batch_size: usize,
}

impl ImportOptions {
    pub fn from_conf(conf: &ImportConf) -> Self {
        ImportOptions {
            span: conf.co_occ_span,
            force: false,
            force_mode: conf.force_mode,
            batch_size: conf.batch_size,
        }
    }
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::from_conf(&ImportConf::default())
    }
}

/// Summary of a finished import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub corpus_id: String,
    pub vertical_path: PathBuf,
    pub tokens: usize,
    pub skipped_rows: usize,
    pub edges: usize,
    pub parent_sums: usize,
    pub child_sums: usize,
    pub co_occurrence_pairs: usize,
    pub aggregation_secs: f64,
    pub write_secs: f64,
    pub finished_at: DateTime<Local>,
}

/// Summary of a co-occurrence score update.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoOccUpdateReport {
    pub corpus_id: String,
    pub vertical_path: PathBuf,
    pub updated_rows: usize,
    pub co_occurrence_pairs: usize,
    pub duration_secs: f64,
    pub finished_at: DateTime<Local>,
}

/// Prepare the tables, check they are usable, aggregate `vertical` and
/// replace the corpus' rows.
///
/// A corpus must not be imported by two jobs at once.
pub fn import_corpus(
    db: &Database,
    corpus: &CorpusProps,
    vertical: &Path,
    opts: &ImportOptions,
) -> Result<ImportReport> {
    let tables = TableNames::new(&corpus.name)?;
    let mut conn = db.get()?;
    schema::initialize(&mut conn, &tables, opts.force, opts.force_mode)?;
    schema::test_table_ready(&mut conn, &tables)?;

    let t0 = Instant::now();
    let mut edges = EdgeAggregator::new(&corpus.syntax);
    let stats = parse_vertical(vertical, &mut edges)?;
    let skipped_rows = edges.skipped_rows();
    let data = edges.into_tables();
    info!("edge pass of {} done in {:?}", corpus.name, t0.elapsed());

    let t1 = Instant::now();
    let layout = TokenLayout::from_syntax(&corpus.syntax);
    let mut co_occ = CoOccurrenceAggregator::seeded_from(&data.edges, layout, opts.span);
    parse_vertical(vertical, &mut co_occ)?;
    let co_occ = co_occ.into_table();
    info!("co-occurrence pass of {} done in {:?}", corpus.name, t1.elapsed());
    let aggregation_secs = t0.elapsed().as_secs_f64();

    let t2 = Instant::now();
    let written = BulkWriter::new(opts.batch_size, corpus.shards).write(
        &mut conn,
        &tables,
        &data,
        Some(&co_occ),
    )?;

    Ok(ImportReport {
        corpus_id: corpus.name.clone(),
        vertical_path: vertical.to_path_buf(),
        tokens: stats.tokens,
        skipped_rows,
        edges: written.edges,
        parent_sums: written.parent_sums,
        child_sums: written.child_sums,
        co_occurrence_pairs: co_occ.len(),
        aggregation_secs,
        write_secs: t2.elapsed().as_secs_f64(),
        finished_at: Local::now(),
    })
}

/// Recompute the window co-occurrence scores of the persisted edge rows
/// without rebuilding the edges themselves.
pub fn update_co_occ(
    db: &Database,
    corpus: &CorpusProps,
    vertical: &Path,
    opts: &ImportOptions,
) -> Result<CoOccUpdateReport> {
    let t0 = Instant::now();
    let tables = TableNames::new(&corpus.name)?;
    let mut conn = db.get()?;
    let seeds = load_edge_words(&conn, &tables)?;
    info!("{}: {} persisted edges loaded", corpus.name, seeds.len());

    let layout = TokenLayout::from_syntax(&corpus.syntax);
    let mut co_occ = CoOccurrenceAggregator::with_pairs(
        layout,
        opts.span,
        seeds.iter().map(|row| {
            (
                WordKey::new(&row.lemma, &row.upos),
                WordKey::new(&row.p_lemma, &row.p_upos),
            )
        }),
    );
    parse_vertical(vertical, &mut co_occ)?;
    let co_occ = co_occ.into_table();

    let updated_rows = BulkWriter::new(opts.batch_size, corpus.shards).update_co_occurrence(
        &mut conn,
        &tables,
        &co_occ,
    )?;
    Ok(CoOccUpdateReport {
        corpus_id: corpus.name.clone(),
        vertical_path: vertical.to_path_buf(),
        updated_rows,
        co_occurrence_pairs: co_occ.len(),
        duration_secs: t0.elapsed().as_secs_f64(),
        finished_at: Local::now(),
    })
}
