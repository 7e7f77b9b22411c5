//! Transactional, chunked replacement of a corpus' aggregate tables.

use std::hash::Hash;
use std::time::Instant;

use ahash::AHashMap;
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};

use crate::aggregation::{AggregatedTables, CoOccurrenceTable, EdgeKey, EdgeTable, SumKey};
use crate::config::DEFAULT_BATCH_SIZE;
use crate::error::{Result, SyncollError};
use crate::scoring::log_dice;
use crate::storage::schema::{TableNames, refresh_candidate_views};

/// SQLite's default limit of bound parameters per statement.
const MAX_VARIABLES: usize = 32766;

const FCOLLS_COLUMNS: [&str; 12] = [
    "lemma",
    "upos",
    "p_lemma",
    "p_upos",
    "deprel",
    "freq",
    "log_dice_child",
    "log_dice_child_pos",
    "log_dice_parent",
    "log_dice_parent_pos",
    "co_occurrence_score",
    "shard",
];

fn lookup<K: Eq + Hash>(map: &AHashMap<K, i64>, key: &K) -> i64 {
    map.get(key).copied().unwrap_or(0)
}

type Key3<'a> = (&'a str, &'a str, &'a str);
type Key4<'a> = (&'a str, &'a str, &'a str, &'a str);

/// Query word marginals over the edge table, summed the way the query
/// engine sums them: restricted to the relation and to the candidate POS,
/// optionally to the query word's own POS.
///
/// `child*` serve queries whose word is the child of the edge, `parent*`
/// queries whose word is the parent.
#[derive(Debug, Default)]
struct WordMarginals<'a> {
    child: AHashMap<Key3<'a>, i64>,
    child_pos: AHashMap<Key4<'a>, i64>,
    parent: AHashMap<Key3<'a>, i64>,
    parent_pos: AHashMap<Key4<'a>, i64>,
}

/// (lemma, deprel, p_upos)
fn child_key(k: &EdgeKey) -> Key3<'_> {
    (k.lemma.as_str(), k.deprel.as_str(), k.p_upos.as_str())
}

/// (lemma, upos, deprel, p_upos)
fn child_pos_key(k: &EdgeKey) -> Key4<'_> {
    (k.lemma.as_str(), k.upos.as_str(), k.deprel.as_str(), k.p_upos.as_str())
}

/// (p_lemma, deprel, upos)
fn parent_key(k: &EdgeKey) -> Key3<'_> {
    (k.p_lemma.as_str(), k.deprel.as_str(), k.upos.as_str())
}

/// (p_lemma, p_upos, deprel, upos)
fn parent_pos_key(k: &EdgeKey) -> Key4<'_> {
    (k.p_lemma.as_str(), k.p_upos.as_str(), k.deprel.as_str(), k.upos.as_str())
}

impl<'a> WordMarginals<'a> {
    fn new(edges: &'a EdgeTable) -> Self {
        let mut ans = WordMarginals::default();
        for (k, freq) in edges.iter() {
            *ans.child.entry(child_key(k)).or_insert(0) += freq;
            *ans.child_pos.entry(child_pos_key(k)).or_insert(0) += freq;
            *ans.parent.entry(parent_key(k)).or_insert(0) += freq;
            *ans.parent_pos.entry(parent_pos_key(k)).or_insert(0) += freq;
        }
        ans
    }

    /// The four stored scores of an edge, in `FCOLLS_COLUMNS` order.
    fn scores(&self, k: &EdgeKey, freq: i64, data: &AggregatedTables) -> [f64; 4] {
        let parent_fy = data.parent_sums.get(&k.parent()).unwrap_or(0);
        let child_fy = data.child_sums.get(&k.child()).unwrap_or(0);
        [
            log_dice(freq, lookup(&self.child, &child_key(k)), parent_fy),
            log_dice(freq, lookup(&self.child_pos, &child_pos_key(k)), parent_fy),
            log_dice(freq, lookup(&self.parent, &parent_key(k)), child_fy),
            log_dice(freq, lookup(&self.parent_pos, &parent_pos_key(k)), child_fy),
        ]
    }
}

/// Rows written per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub edges: usize,
    pub parent_sums: usize,
    pub child_sums: usize,
}

/// Collects rows and flushes them as multi-row INSERT statements.
struct ChunkedInsert<'a> {
    conn: &'a Connection,
    table: &'a str,
    columns: &'a [&'a str],
    rows_per_stmt: usize,
    pending_rows: usize,
    args: Vec<Value>,
    written: usize,
}

impl<'a> ChunkedInsert<'a> {
    fn new(conn: &'a Connection, table: &'a str, columns: &'a [&'a str], batch_size: usize) -> Self {
        let rows_per_stmt = batch_size.clamp(1, MAX_VARIABLES / columns.len());
        ChunkedInsert {
            conn,
            table,
            columns,
            rows_per_stmt,
            pending_rows: 0,
            args: Vec::with_capacity(rows_per_stmt * columns.len()),
            written: 0,
        }
    }

    fn push(&mut self, row: impl IntoIterator<Item = Value>) -> Result<()> {
        let before = self.args.len();
        self.args.extend(row);
        if self.args.len() - before != self.columns.len() {
            return Err(SyncollError::internal(format!(
                "row for {} has {} values, expected {}",
                self.table,
                self.args.len() - before,
                self.columns.len()
            )));
        }
        self.pending_rows += 1;
        if self.pending_rows == self.rows_per_stmt {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending_rows == 0 {
            return Ok(());
        }
        let row_marks = format!("({})", vec!["?"; self.columns.len()].join(", "));
        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.table,
            self.columns.join(", "),
            vec![row_marks.as_str(); self.pending_rows].join(", ")
        );
        self.conn
            .execute(&sql, params_from_iter(self.args.iter()))
            .map_err(SyncollError::from_db)?;
        debug!("written {} rows bulk into {}", self.pending_rows, self.table);
        self.written += self.pending_rows;
        self.pending_rows = 0;
        self.args.clear();
        Ok(())
    }

    fn finish(mut self) -> Result<usize> {
        self.flush()?;
        Ok(self.written)
    }
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

/// Replaces the aggregate tables of one corpus.
#[derive(Debug, Clone)]
pub struct BulkWriter {
    batch_size: usize,
    shards: u32,
}

impl Default for BulkWriter {
    fn default() -> Self {
        BulkWriter {
            batch_size: DEFAULT_BATCH_SIZE,
            shards: 1,
        }
    }
}

impl BulkWriter {
    pub fn new(batch_size: usize, shards: u32) -> Self {
        BulkWriter {
            batch_size: batch_size.max(1),
            shards: shards.max(1),
        }
    }

    /// Delete the corpus' rows, insert the aggregated tables and rebuild the
    /// candidate tables, all in one transaction. On any error nothing is
    /// changed.
    pub fn write(
        &self,
        conn: &mut Connection,
        tables: &TableNames,
        data: &AggregatedTables,
        co_occ: Option<&CoOccurrenceTable>,
    ) -> Result<WriteStats> {
        let t0 = Instant::now();
        let tx = conn.transaction()?;
        for table in [&tables.fcolls, &tables.parent_sums, &tables.child_sums] {
            tx.execute(&format!("DELETE FROM {table}"), [])
                .map_err(SyncollError::from_db)?;
        }

        let marginals = WordMarginals::new(&data.edges);
        let mut edges = ChunkedInsert::new(&tx, &tables.fcolls, &FCOLLS_COLUMNS, self.batch_size);
        for (key, freq) in data.edges.sorted() {
            let [child, child_pos, parent, parent_pos] = marginals.scores(key, freq, data);
            let co_occ_score = co_occ.map_or(Value::Null, |table| {
                Value::Real(table.score(&key.lemma, &key.upos, &key.p_lemma, &key.p_upos))
            });
            edges.push([
                text(&key.lemma),
                text(&key.upos),
                text(&key.p_lemma),
                text(&key.p_upos),
                text(&key.deprel),
                Value::Integer(freq),
                Value::Real(child),
                Value::Real(child_pos),
                Value::Real(parent),
                Value::Real(parent_pos),
                co_occ_score,
                Value::Integer(i64::from(key.shard(self.shards))),
            ])?;
        }
        let edges = edges.finish()?;

        let parent_sums = write_sums(
            &tx,
            &tables.parent_sums,
            &["p_lemma", "p_upos", "deprel", "freq"],
            data.parent_sums.sorted(),
            self.batch_size,
        )?;
        let child_sums = write_sums(
            &tx,
            &tables.child_sums,
            &["lemma", "upos", "deprel", "freq"],
            data.child_sums.sorted(),
            self.batch_size,
        )?;

        refresh_candidate_views(&tx, tables)?;
        tx.commit()?;
        let stats = WriteStats {
            edges,
            parent_sums,
            child_sums,
        };
        info!(
            "{}: written {} edges, {} parent sums, {} child sums in {:?}",
            tables.corpus_id,
            stats.edges,
            stats.parent_sums,
            stats.child_sums,
            t0.elapsed()
        );
        Ok(stats)
    }

    /// Recompute `co_occurrence_score` of all persisted edge rows. Returns
    /// the number of updated rows.
    pub fn update_co_occurrence(
        &self,
        conn: &mut Connection,
        tables: &TableNames,
        co_occ: &CoOccurrenceTable,
    ) -> Result<usize> {
        let t0 = Instant::now();
        let tx = conn.transaction()?;
        let rows = load_edge_words(&tx, tables)?;
        let mut updated = 0;
        {
            let mut stmt = tx.prepare_cached(&format!(
                "UPDATE {} SET co_occurrence_score = ?1 WHERE id = ?2",
                tables.fcolls
            ))?;
            for chunk in rows.chunks(self.batch_size) {
                for row in chunk {
                    let score = co_occ.score(&row.lemma, &row.upos, &row.p_lemma, &row.p_upos);
                    updated += stmt
                        .execute(params![score, row.id])
                        .map_err(SyncollError::from_db)?;
                }
                debug!("updated {} co-occurrence scores in {}", chunk.len(), tables.fcolls);
            }
        }
        refresh_candidate_views(&tx, tables)?;
        tx.commit()?;
        info!(
            "{}: updated {updated} co-occurrence scores in {:?}",
            tables.corpus_id,
            t0.elapsed()
        );
        Ok(updated)
    }
}

fn write_sums(
    conn: &Connection,
    table: &str,
    columns: &[&str],
    rows: Vec<(&SumKey, i64)>,
    batch_size: usize,
) -> Result<usize> {
    let mut insert = ChunkedInsert::new(conn, table, columns, batch_size);
    for (key, freq) in rows {
        insert.push([
            text(&key.lemma),
            text(&key.upos),
            text(&key.deprel),
            Value::Integer(freq),
        ])?;
    }
    insert.finish()
}

/// Word pair of a persisted edge row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeWords {
    pub id: i64,
    pub lemma: String,
    pub upos: String,
    pub p_lemma: String,
    pub p_upos: String,
}

/// All edge rows of a corpus, ordered by id.
pub fn load_edge_words(conn: &Connection, tables: &TableNames) -> Result<Vec<EdgeWords>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, lemma, upos, p_lemma, p_upos FROM {} ORDER BY id",
        tables.fcolls
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok(EdgeWords {
            id: row.get(0)?,
            lemma: row.get(1)?,
            upos: row.get(2)?,
            p_lemma: row.get(3)?,
            p_upos: row.get(4)?,
        })
    })?;
    let mut ans = Vec::new();
    for row in rows {
        ans.push(row?);
    }
    Ok(ans)
}
