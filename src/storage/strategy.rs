//! Interchangeable ways of supplying the candidate marginals.
//!
//! The query engine talks to a [`PersistenceStrategy`] only. Each
//! strategy answers the same two questions (the query word's own marginal
//! and the candidate rows with the partner marginal) from a different
//! physical layout.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

use log::debug;
use rusqlite::{Connection, params_from_iter};

use crate::config::PersistenceKind;
use crate::error::{Result, SyncollError};
use crate::query::Direction;
use crate::storage::predicate::{Column, PredicateBuilder};
use crate::storage::schema::TableNames;

/// Which edge rows a query is interested in.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFilter {
    pub direction: Direction,
    /// Lemma of the query word.
    pub lemma: String,
    /// Part of speech of the query word, if given.
    pub upos: Option<String>,
    /// Stored relation values; a row matches any of them.
    pub deprels: Vec<String>,
    /// Required part of speech of the candidates (empty = any).
    pub candidate_upos: String,
    pub min_freq: i64,
    /// Shard range `[from, to)` for partitioned fetches.
    pub shard_range: Option<(u32, u32)>,
}

impl CandidateFilter {
    /// Columns holding (query word lemma, query word POS, candidate lemma,
    /// candidate POS).
    fn columns(&self) -> (Column, Column, Column, Column) {
        match self.direction {
            Direction::Parents => (Column::Lemma, Column::Upos, Column::PLemma, Column::PUpos),
            Direction::Children => (Column::PLemma, Column::PUpos, Column::Lemma, Column::Upos),
        }
    }

    /// Predicates fixing the query word side of the relation.
    pub fn word_predicates(&self, alias: Option<&'static str>) -> PredicateBuilder {
        let (word_lemma, word_upos, _, cand_upos) = self.columns();
        let builder = match alias {
            Some(alias) => PredicateBuilder::new().with_alias(alias),
            None => PredicateBuilder::new(),
        };
        builder
            .eq_str(word_lemma, &self.lemma)
            .eq_opt(word_upos, self.upos.as_deref())
            .any_of(Column::Deprel, &self.deprels)
            .eq_opt(cand_upos, Some(self.candidate_upos.as_str()))
    }

    /// Predicates selecting the candidate rows.
    pub fn row_predicates(&self, alias: Option<&'static str>) -> PredicateBuilder {
        self.word_predicates(alias)
            .ge(Column::Freq, self.min_freq)
            .shard_range(self.shard_range)
    }

    pub fn with_shard_range(&self, range: (u32, u32)) -> Self {
        CandidateFilter {
            shard_range: Some(range),
            ..self.clone()
        }
    }
}

/// One candidate row.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub lemma: String,
    pub upos: String,
    pub deprel: String,
    /// Part of speech of the query word on this row.
    pub word_upos: String,
    /// Joint frequency (Fxy).
    pub freq: i64,
    /// Candidate's own marginal (Fy); zero where the strategy stores the
    /// score instead.
    pub fy: i64,
    /// Association score stored at import time, if the strategy reads one.
    pub score: Option<f64>,
    pub co_occ_score: Option<f64>,
}

impl Candidate {
    /// Order in which storage returns candidates.
    pub fn retrieval_key(&self) -> (&str, &str, &str, &str) {
        (&self.lemma, &self.upos, &self.deprel, &self.word_upos)
    }
}

/// Storage-side half of the candidate query.
pub trait PersistenceStrategy: Send + Sync + Debug {
    fn kind(&self) -> PersistenceKind;

    /// Candidate rows ordered by [`Candidate::retrieval_key`].
    fn fetch_candidates(
        &self,
        conn: &Connection,
        tables: &TableNames,
        filter: &CandidateFilter,
    ) -> Result<Vec<Candidate>>;

    /// Marginal frequency of the query word over the filtered relation.
    fn marginal_freq(
        &self,
        conn: &Connection,
        tables: &TableNames,
        filter: &CandidateFilter,
    ) -> Result<i64> {
        let (where_sql, args) = filter.word_predicates(None).build();
        let sql = format!(
            "SELECT COALESCE(SUM(freq), 0) FROM {} WHERE {where_sql}",
            tables.fcolls
        );
        debug!("going to SELECT cumulative freq.: {sql} ({} args)", args.len());
        let t0 = Instant::now();
        let ans = conn
            .query_row(&sql, params_from_iter(args.iter()), |row| row.get(0))
            .map_err(SyncollError::from_db)?;
        debug!(".... DONE (select cumulative freq.) in {:?}", t0.elapsed());
        Ok(ans)
    }
}

/// Build the strategy selected by configuration.
pub fn strategy_for(kind: PersistenceKind) -> Arc<dyn PersistenceStrategy> {
    match kind {
        PersistenceKind::Precomputed => Arc::new(PrecomputedScores),
        PersistenceKind::RawSums => Arc::new(RawSums),
        PersistenceKind::MaterializedView => Arc::new(MaterializedView),
    }
}

fn query_candidates(
    conn: &Connection,
    sql: &str,
    args: &[rusqlite::types::Value],
) -> Result<Vec<Candidate>> {
    debug!("going to SELECT candidates: {sql} ({} args)", args.len());
    let t0 = Instant::now();
    let mut stmt = conn.prepare(sql).map_err(SyncollError::from_db)?;
    let rows = stmt
        .query_map(params_from_iter(args.iter()), |row| {
            Ok(Candidate {
                lemma: row.get(0)?,
                upos: row.get(1)?,
                deprel: row.get(2)?,
                word_upos: row.get(3)?,
                freq: row.get(4)?,
                fy: row.get(5)?,
                score: row.get(6)?,
                co_occ_score: row.get(7)?,
            })
        })
        .map_err(SyncollError::from_db)?;
    let mut ans = Vec::with_capacity(100);
    for row in rows {
        ans.push(row.map_err(SyncollError::from_db)?);
    }
    debug!(
        ".... DONE (SELECT candidates) {} rows in {:?}",
        ans.len(),
        t0.elapsed()
    );
    Ok(ans)
}

/// `SELECT` list shared by all strategies; `fy` and `score` vary.
fn select_list(filter: &CandidateFilter, fy: &str, score: &str) -> String {
    let (_, word_upos, cand_lemma, cand_upos) = filter.columns();
    format!(
        "a.{cand_lemma}, a.{cand_upos}, a.deprel, a.{word_upos}, a.freq, {fy}, {score}, \
         a.co_occurrence_score"
    )
}

const ORDER_BY: &str = "ORDER BY 1, 2, 3, 4";

/// Score computed per query from raw frequencies and the marginal sum
/// tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSums;

impl PersistenceStrategy for RawSums {
    fn kind(&self) -> PersistenceKind {
        PersistenceKind::RawSums
    }

    fn fetch_candidates(
        &self,
        conn: &Connection,
        tables: &TableNames,
        filter: &CandidateFilter,
    ) -> Result<Vec<Candidate>> {
        let join = match filter.direction {
            Direction::Parents => format!(
                "LEFT JOIN {} AS s ON s.p_lemma = a.p_lemma AND s.p_upos = a.p_upos \
                 AND s.deprel = a.deprel",
                tables.parent_sums
            ),
            Direction::Children => format!(
                "LEFT JOIN {} AS s ON s.lemma = a.lemma AND s.upos = a.upos \
                 AND s.deprel = a.deprel",
                tables.child_sums
            ),
        };
        let (where_sql, args) = filter.row_predicates(Some("a")).build();
        let sql = format!(
            "SELECT {} FROM {} AS a {join} WHERE {where_sql} {ORDER_BY}",
            select_list(filter, "COALESCE(s.freq, 0)", "NULL"),
            tables.fcolls
        );
        query_candidates(conn, &sql, &args)
    }
}

/// Score read from the logDice columns written at import time.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecomputedScores;

impl PrecomputedScores {
    /// Column whose stored score was computed with the marginal this
    /// filter's query word has.
    pub fn score_column(filter: &CandidateFilter) -> &'static str {
        match (filter.direction, filter.upos.is_some()) {
            (Direction::Parents, false) => "log_dice_child",
            (Direction::Parents, true) => "log_dice_child_pos",
            (Direction::Children, false) => "log_dice_parent",
            (Direction::Children, true) => "log_dice_parent_pos",
        }
    }
}

impl PersistenceStrategy for PrecomputedScores {
    fn kind(&self) -> PersistenceKind {
        PersistenceKind::Precomputed
    }

    fn fetch_candidates(
        &self,
        conn: &Connection,
        tables: &TableNames,
        filter: &CandidateFilter,
    ) -> Result<Vec<Candidate>> {
        let (where_sql, args) = filter.row_predicates(Some("a")).build();
        let sql = format!(
            "SELECT {} FROM {} AS a WHERE {where_sql} {ORDER_BY}",
            select_list(filter, "0", &format!("a.{}", Self::score_column(filter))),
            tables.fcolls
        );
        query_candidates(conn, &sql, &args)
    }
}

/// Partner marginals read from the candidate tables rebuilt by each load.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterializedView;

impl PersistenceStrategy for MaterializedView {
    fn kind(&self) -> PersistenceKind {
        PersistenceKind::MaterializedView
    }

    fn fetch_candidates(
        &self,
        conn: &Connection,
        tables: &TableNames,
        filter: &CandidateFilter,
    ) -> Result<Vec<Candidate>> {
        let view = match filter.direction {
            Direction::Parents => &tables.p_lemma_candidates,
            Direction::Children => &tables.lemma_candidates,
        };
        let (where_sql, args) = filter.row_predicates(Some("a")).build();
        let sql = format!(
            "SELECT {} FROM {view} AS a WHERE {where_sql} {ORDER_BY}",
            select_list(filter, "a.fy", "NULL")
        );
        query_candidates(conn, &sql, &args)
    }
}
