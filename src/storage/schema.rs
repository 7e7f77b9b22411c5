//! Per-corpus aggregate tables.

use log::info;
use rusqlite::{Connection, OptionalExtension, params};

use crate::config::{ForceMode, validate_corpus_id};
use crate::error::{Result, SyncollError};

/// Names of all tables owned by one corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub corpus_id: String,
    pub fcolls: String,
    pub parent_sums: String,
    pub child_sums: String,
    /// Edge rows with the child marginal (candidates are children).
    pub lemma_candidates: String,
    /// Edge rows with the parent marginal (candidates are parents).
    pub p_lemma_candidates: String,
}

impl TableNames {
    pub fn new(corpus_id: &str) -> Result<Self> {
        validate_corpus_id(corpus_id)?;
        Ok(TableNames {
            corpus_id: corpus_id.to_string(),
            fcolls: format!("{corpus_id}_fcolls"),
            parent_sums: format!("{corpus_id}_parent_sums"),
            child_sums: format!("{corpus_id}_child_sums"),
            lemma_candidates: format!("{corpus_id}_lemma_candidates"),
            p_lemma_candidates: format!("{corpus_id}_p_lemma_candidates"),
        })
    }
}

pub fn create_tables(conn: &Connection, t: &TableNames) -> Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {fc} (
            id INTEGER PRIMARY KEY,
            lemma TEXT NOT NULL,
            upos TEXT NOT NULL,
            p_lemma TEXT NOT NULL,
            p_upos TEXT NOT NULL,
            deprel TEXT NOT NULL,
            freq INTEGER NOT NULL,
            log_dice_child REAL,
            log_dice_child_pos REAL,
            log_dice_parent REAL,
            log_dice_parent_pos REAL,
            co_occurrence_score REAL,
            shard INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS {fc}_lemma_idx ON {fc} (lemma, upos, deprel);
        CREATE INDEX IF NOT EXISTS {fc}_p_lemma_idx ON {fc} (p_lemma, p_upos, deprel);
        CREATE TABLE IF NOT EXISTS {ps} (
            id INTEGER PRIMARY KEY,
            p_lemma TEXT NOT NULL,
            p_upos TEXT NOT NULL,
            deprel TEXT NOT NULL,
            freq INTEGER NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS {ps}_key_idx ON {ps} (p_lemma, p_upos, deprel);
        CREATE TABLE IF NOT EXISTS {cs} (
            id INTEGER PRIMARY KEY,
            lemma TEXT NOT NULL,
            upos TEXT NOT NULL,
            deprel TEXT NOT NULL,
            freq INTEGER NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS {cs}_key_idx ON {cs} (lemma, upos, deprel);",
        fc = t.fcolls,
        ps = t.parent_sums,
        cs = t.child_sums,
    ))?;
    Ok(())
}

pub fn drop_tables(conn: &Connection, t: &TableNames) -> Result<()> {
    for table in [
        &t.lemma_candidates,
        &t.p_lemma_candidates,
        &t.fcolls,
        &t.parent_sums,
        &t.child_sums,
    ] {
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {table}"))?;
    }
    Ok(())
}

/// Delete all rows, keeping the tables.
pub fn truncate_tables(conn: &Connection, t: &TableNames) -> Result<()> {
    for table in [&t.fcolls, &t.parent_sums, &t.child_sums] {
        conn.execute(&format!("DELETE FROM {table}"), [])?;
    }
    for table in [&t.lemma_candidates, &t.p_lemma_candidates] {
        if table_exists(conn, table)? {
            conn.execute(&format!("DELETE FROM {table}"), [])?;
        }
    }
    Ok(())
}

pub fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            params![name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Prepare the corpus tables. Without `force` existing tables and their
/// rows are kept.
pub fn initialize(conn: &mut Connection, t: &TableNames, force: bool, mode: ForceMode) -> Result<()> {
    let tx = conn.transaction()?;
    if force {
        match mode {
            ForceMode::Drop => {
                info!("dropping existing tables of {} (forced)", t.corpus_id);
                drop_tables(&tx, t)?;
            }
            ForceMode::Truncate => {
                info!("truncating existing tables of {} (forced)", t.corpus_id);
                create_tables(&tx, t)?;
                truncate_tables(&tx, t)?;
            }
        }
    }
    info!("creating tables of {}", t.corpus_id);
    create_tables(&tx, t)?;
    tx.commit()?;
    Ok(())
}

/// Check that the edge table accepts and returns a row. The testing row is
/// always rolled back.
pub fn test_table_ready(conn: &mut Connection, t: &TableNames) -> Result<()> {
    let tx = conn.transaction()?;
    let inserted = tx.execute(
        &format!(
            "INSERT INTO {} (id, lemma, upos, p_lemma, p_upos, deprel, freq, shard) \
             VALUES (-1, '', '', '', '', '', 0, 0)",
            t.fcolls
        ),
        [],
    )?;
    if inserted != 1 {
        return Err(SyncollError::storage(format!(
            "problem inserting testing row - num affected rows: {inserted}"
        )));
    }
    let found: Option<i64> = tx
        .query_row(
            &format!("SELECT id FROM {} WHERE id = ?1", t.fcolls),
            params![-1],
            |row| row.get(0),
        )
        .optional()?;
    if found != Some(-1) {
        return Err(SyncollError::storage(format!(
            "testing row not readable from {}",
            t.fcolls
        )));
    }
    tx.rollback()?;
    Ok(())
}

/// Rebuild both candidate tables from the current edge rows.
pub fn refresh_candidate_views(conn: &Connection, t: &TableNames) -> Result<()> {
    let columns = "a.lemma, a.upos, a.p_lemma, a.p_upos, a.deprel, a.freq, \
                   a.co_occurrence_score, a.shard";
    conn.execute_batch(&format!(
        "DROP TABLE IF EXISTS {lc};
        CREATE TABLE {lc} AS
            SELECT {columns}, COALESCE(s.freq, 0) AS fy
            FROM {fc} AS a
            LEFT JOIN {cs} AS s ON s.lemma = a.lemma AND s.upos = a.upos AND s.deprel = a.deprel;
        CREATE INDEX {lc}_idx ON {lc} (p_lemma, p_upos, deprel);
        DROP TABLE IF EXISTS {plc};
        CREATE TABLE {plc} AS
            SELECT {columns}, COALESCE(s.freq, 0) AS fy
            FROM {fc} AS a
            LEFT JOIN {ps} AS s ON s.p_lemma = a.p_lemma AND s.p_upos = a.p_upos AND s.deprel = a.deprel;
        CREATE INDEX {plc}_idx ON {plc} (lemma, upos, deprel);",
        lc = t.lemma_candidates,
        plc = t.p_lemma_candidates,
        fc = t.fcolls,
        cs = t.child_sums,
        ps = t.parent_sums,
    ))?;
    info!("candidate views of {} refreshed", t.corpus_id);
    Ok(())
}
