//! Candidate ranking.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;

use crate::config::{Config, CorporaConf, CorpusProps, QueryConf};
use crate::cql;
use crate::error::{Result, SyncollError};
use crate::query::fanout::FanOut;
use crate::query::relation::Relation;
use crate::query::result::{FreqDistrib, FreqDistribItem};
use crate::query::word::Word;
use crate::scoring::{log_dice, sanitize};
use crate::storage::{
    Candidate, CandidateFilter, Database, PersistenceStrategy, TableNames, strategy_for,
};

/// Split the shard key space `[0, shards)` into at most `partitions`
/// contiguous ranges. Partition `i` of `n` covers
/// `[i * shards / n, (i + 1) * shards / n)`.
pub fn shard_partitions(shards: u32, partitions: usize) -> Vec<(u32, u32)> {
    let shards = u64::from(shards.max(1));
    let n = (partitions.max(1) as u64).min(shards);
    (0..n)
        .map(|i| ((i * shards / n) as u32, ((i + 1) * shards / n) as u32))
        .collect()
}

/// Turn candidates into result items ordered by descending association
/// score. Equal scores keep their retrieval order.
pub fn rank(candidates: Vec<Candidate>, fx: i64, corpus_size: i64) -> Vec<FreqDistribItem> {
    let mut items: Vec<FreqDistribItem> = candidates
        .into_iter()
        .map(|cand| {
            let coll_weight = match cand.score {
                Some(score) => sanitize(score),
                None => log_dice(cand.freq, fx, cand.fy),
            };
            FreqDistribItem {
                ipm: if corpus_size > 0 {
                    cand.freq as f64 / corpus_size as f64 * 1e6
                } else {
                    0.0
                },
                word: cand.lemma,
                freq: cand.freq,
                coll_weight,
                co_occ_score: cand.co_occ_score,
            }
        })
        .collect();
    items.sort_by(|a, b| b.coll_weight.total_cmp(&a.coll_weight));
    items
}

/// Answers candidate queries against the persisted tables. Shared by all
/// requests; holds no per-request state.
#[derive(Debug)]
pub struct QueryEngine {
    db: Arc<Database>,
    corpora: CorporaConf,
    strategy: Arc<dyn PersistenceStrategy>,
    conf: QueryConf,
    request_timeout: Duration,
    fanout: Option<FanOut>,
}

impl QueryEngine {
    pub fn new(db: Arc<Database>, conf: &Config) -> Result<Self> {
        let fanout = if conf.query.fetch_partitions > 1 {
            let workers = if conf.query.fetch_workers == 0 {
                num_cpus::get()
            } else {
                conf.query.fetch_workers
            };
            Some(FanOut::new(workers)?)
        } else {
            None
        };
        Ok(QueryEngine {
            db,
            corpora: conf.corpora.clone(),
            strategy: strategy_for(conf.query.persistence),
            conf: conf.query.clone(),
            request_timeout: conf.request_timeout(),
            fanout,
        })
    }

    /// Replace the configured persistence strategy.
    pub fn with_strategy(mut self, strategy: Arc<dyn PersistenceStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> &dyn PersistenceStrategy {
        self.strategy.as_ref()
    }

    pub fn corpora(&self) -> &CorporaConf {
        &self.corpora
    }

    pub fn query_conf(&self) -> &QueryConf {
        &self.conf
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    fn corpus(&self, corpus_id: &str) -> Result<&CorpusProps> {
        self.corpora
            .get_corpus_props(corpus_id)
            .ok_or_else(|| SyncollError::corpus_not_found(corpus_id))
    }

    /// Rank the candidates standing in `relation` to `word`.
    ///
    /// The word is validated before any storage access. Storage failures
    /// abort the whole query.
    pub fn rank_candidates(
        &self,
        corpus_id: &str,
        word: &Word,
        relation: Relation,
        min_freq: i64,
        max_items: usize,
    ) -> Result<FreqDistrib> {
        word.validate()?;
        let corpus = self.corpus(corpus_id)?;
        let tables = TableNames::new(corpus_id)?;
        let deadline = Instant::now() + self.request_timeout;
        let t0 = Instant::now();

        let filter = CandidateFilter {
            direction: relation.direction(),
            lemma: word.v.clone(),
            upos: word.pos().map(str::to_string),
            deprels: relation.deprels(&corpus.syntax),
            candidate_upos: relation.candidate_upos(&corpus.syntax).to_string(),
            min_freq,
            shard_range: None,
        };

        let conn = self.db.get_with_deadline(deadline)?;
        let fx = self.strategy.marginal_freq(&conn, &tables, &filter)?;
        let candidates = match &self.fanout {
            Some(fanout) if corpus.shards > 1 => {
                drop(conn);
                self.fetch_sharded(fanout, corpus.shards, &tables, &filter, deadline)?
            }
            _ => self.strategy.fetch_candidates(&conn, &tables, &filter)?,
        };
        debug!(
            "{corpus_id}/{relation}: fx = {fx}, {} candidates in {:?}",
            candidates.len(),
            t0.elapsed()
        );

        let mut ans = FreqDistrib {
            freqs: rank(candidates, fx, corpus.size),
            corpus_size: corpus.size,
            examples_query_tpl: cql::example_query(&corpus.syntax, relation, word, "%s"),
            error: None,
        };
        ans.cut(max_items);
        Ok(ans)
    }

    /// Rank with the configured default minimum frequency.
    pub fn rank_candidates_default(
        &self,
        corpus_id: &str,
        word: &Word,
        relation: Relation,
        max_items: usize,
    ) -> Result<FreqDistrib> {
        self.rank_candidates(corpus_id, word, relation, self.conf.min_freq, max_items)
    }

    fn fetch_sharded(
        &self,
        fanout: &FanOut,
        shards: u32,
        tables: &TableNames,
        filter: &CandidateFilter,
        deadline: Instant,
    ) -> Result<Vec<Candidate>> {
        let tasks: Vec<_> = shard_partitions(shards, self.conf.fetch_partitions)
            .into_iter()
            .map(|range| {
                let db = Arc::clone(&self.db);
                let strategy = Arc::clone(&self.strategy);
                let tables = tables.clone();
                let filter = filter.with_shard_range(range);
                move || -> Result<Vec<Candidate>> {
                    let conn = db.get_with_deadline(deadline)?;
                    strategy.fetch_candidates(&conn, &tables, &filter)
                }
            })
            .collect();
        let mut merged: Vec<Candidate> = fanout.run(tasks, deadline)?.into_iter().flatten().collect();
        merged.sort_by(|a, b| a.retrieval_key().cmp(&b.retrieval_key()));
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(lemma: &str, freq: i64, fy: i64) -> Candidate {
        Candidate {
            lemma: lemma.to_string(),
            upos: "NOUN".to_string(),
            deprel: "nmod".to_string(),
            word_upos: "NOUN".to_string(),
            freq,
            fy,
            score: None,
            co_occ_score: None,
        }
    }

    #[test]
    fn test_partitions_cover_key_space() {
        assert_eq!(shard_partitions(8, 4), vec![(0, 2), (2, 4), (4, 6), (6, 8)]);
        assert_eq!(shard_partitions(5, 2), vec![(0, 2), (2, 5)]);
        assert_eq!(shard_partitions(2, 8), vec![(0, 1), (1, 2)]);
        assert_eq!(shard_partitions(1, 0), vec![(0, 1)]);
    }

    #[test]
    fn test_rank_is_stable() {
        let items = rank(
            vec![cand("a", 1, 10), cand("b", 5, 10), cand("c", 1, 10)],
            10,
            1_000_000,
        );
        let words: Vec<_> = items.iter().map(|i| i.word.as_str()).collect();
        assert_eq!(words, vec!["b", "a", "c"]);
        assert_eq!(items[0].ipm, 5.0);
        assert_eq!(items[0].coll_weight, log_dice(5, 10, 10));
    }

    #[test]
    fn test_rank_prefers_stored_score() {
        let mut stored = cand("a", 1, 0);
        stored.score = Some(f64::INFINITY);
        let items = rank(vec![cand("b", 5, 10), stored], 10, 0);
        assert_eq!(items[0].word, "a");
        assert_eq!(items[0].coll_weight, crate::scoring::LOG_DICE_MAX);
        assert_eq!(items[0].ipm, 0.0);
    }
}
