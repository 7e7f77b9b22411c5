//! Second pass: window co-occurrence of word pairs that already stand in
//! a dependency relation.
//!
//! Only seeded pairs are counted, which keeps the table as small as the
//! edge table instead of growing with the square of the vocabulary. A
//! pair with no dependency edge can therefore never gain a score.

use std::collections::VecDeque;

use ahash::AHashMap;
use log::{info, warn};

use crate::aggregation::tables::{EdgeTable, WordKey};
use crate::error::Result;
use crate::scoring::log_dice;
use crate::vertical::{TokenLayout, TokenProcessor, TokenRow};

type WordId = u32;

/// Interned seed vocabulary shared by the aggregator and its result.
#[derive(Debug, Clone, Default)]
struct Vocabulary {
    ids: AHashMap<WordKey, WordId>,
}

impl Vocabulary {
    fn intern(&mut self, key: WordKey) -> WordId {
        let next = self.ids.len() as WordId;
        *self.ids.entry(key).or_insert(next)
    }

    fn lookup(&self, lemma: &str, upos: &str) -> Option<WordId> {
        self.ids.get(&WordKey::new(lemma, upos)).copied()
    }

    fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Counts window co-occurrences of seeded (focus, neighbour) pairs and
/// the occurrences of the seeded words.
#[derive(Debug)]
pub struct CoOccurrenceAggregator {
    layout: TokenLayout,
    span: usize,
    vocab: Vocabulary,
    pairs: AHashMap<(WordId, WordId), i64>,
    token_counts: Vec<i64>,
    /// Last `2 * span + 1` tokens; `None` for words outside the seeds.
    window: VecDeque<Option<WordId>>,
    skipped_rows: usize,
}

impl CoOccurrenceAggregator {
    /// Seed with `(child, parent)` pairs. Every pair starts at zero.
    pub fn with_pairs<I>(layout: TokenLayout, span: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (WordKey, WordKey)>,
    {
        let mut vocab = Vocabulary::default();
        let mut seeded = AHashMap::new();
        for (word, co_word) in pairs {
            let a = vocab.intern(word);
            let b = vocab.intern(co_word);
            seeded.insert((a, b), 0);
        }
        let token_counts = vec![0; vocab.len()];
        CoOccurrenceAggregator {
            layout,
            span,
            vocab,
            pairs: seeded,
            token_counts,
            window: VecDeque::with_capacity(2 * span + 1),
            skipped_rows: 0,
        }
    }

    /// Seed from the dependency edges of the first pass.
    pub fn seeded_from(edges: &EdgeTable, layout: TokenLayout, span: usize) -> Self {
        Self::with_pairs(
            layout,
            span,
            edges.iter().map(|(k, _)| {
                (
                    WordKey::new(&k.lemma, &k.upos),
                    WordKey::new(&k.p_lemma, &k.p_upos),
                )
            }),
        )
    }

    fn width(&self) -> usize {
        2 * self.span + 1
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn into_table(self) -> CoOccurrenceTable {
        info!(
            "cooccurrence table done: {} pairs, {} words",
            self.pairs.len(),
            self.vocab.len()
        );
        CoOccurrenceTable {
            vocab: self.vocab,
            pairs: self.pairs,
            token_counts: self.token_counts,
        }
    }
}

impl TokenProcessor for CoOccurrenceAggregator {
    fn proc_token(&mut self, row: &TokenRow) -> Result<()> {
        let Some((lemma, upos)) = self.layout.lemma_upos(row) else {
            warn!(
                "Too few token columns on line {} ({} < {})",
                row.line,
                row.len(),
                self.layout.min_columns()
            );
            self.skipped_rows += 1;
            return Ok(());
        };
        let id = self.vocab.lookup(lemma, upos);
        if let Some(id) = id {
            self.token_counts[id as usize] += 1;
        }

        if self.window.len() == self.width() {
            self.window.pop_front();
        }
        self.window.push_back(id);
        if self.window.len() < self.width() {
            return Ok(());
        }

        let Some(focus) = self.window[self.span] else {
            return Ok(());
        };
        for (i, near) in self.window.iter().enumerate() {
            if i == self.span {
                continue;
            }
            if let Some(near) = near {
                if let Some(freq) = self.pairs.get_mut(&(focus, *near)) {
                    *freq += 1;
                }
            }
        }
        Ok(())
    }
}

/// Result of the co-occurrence pass.
#[derive(Debug, Clone, Default)]
pub struct CoOccurrenceTable {
    vocab: Vocabulary,
    pairs: AHashMap<(WordId, WordId), i64>,
    token_counts: Vec<i64>,
}

impl CoOccurrenceTable {
    /// Number of tracked pairs, including those never seen in a window.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Window frequency of a seeded pair, `None` for unseeded pairs.
    pub fn pair_freq(&self, lemma: &str, upos: &str, co_lemma: &str, co_upos: &str) -> Option<i64> {
        let a = self.vocab.lookup(lemma, upos)?;
        let b = self.vocab.lookup(co_lemma, co_upos)?;
        self.pairs.get(&(a, b)).copied()
    }

    /// Occurrence count of a seeded word.
    pub fn token_count(&self, lemma: &str, upos: &str) -> Option<i64> {
        self.vocab
            .lookup(lemma, upos)
            .map(|id| self.token_counts[id as usize])
    }

    /// Window-based logDice of a pair. Unknown pairs and words count as
    /// zero.
    pub fn score(&self, lemma: &str, upos: &str, co_lemma: &str, co_upos: &str) -> f64 {
        let fxy = self.pair_freq(lemma, upos, co_lemma, co_upos).unwrap_or(0);
        let fx = self.token_count(lemma, upos).unwrap_or(0);
        let fy = self.token_count(co_lemma, co_upos).unwrap_or(0);
        log_dice(fxy, fx, fy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::EdgeKey;
    use crate::config::SyntaxProps;
    use crate::vertical::{VerticalReader, parse_vertical_reader};
    use std::io::Cursor;

    fn layout() -> TokenLayout {
        TokenLayout::from_syntax(&SyntaxProps::universal_dependencies())
    }

    fn word(lemma: &str, upos: &str) -> String {
        format!("{lemma}\t{lemma}\t_\t{upos}\t_\t_\t_\t_\t_\tdep\t0\t-\t-\n")
    }

    fn run(agg: &mut CoOccurrenceAggregator, words: &[(&str, &str)]) {
        let input: String = words.iter().map(|(l, u)| word(l, u)).collect();
        parse_vertical_reader(VerticalReader::new(Cursor::new(input)), agg).unwrap();
    }

    fn seeded(span: usize) -> CoOccurrenceAggregator {
        let mut edges = EdgeTable::new();
        edges.add(EdgeKey::new("team", "NOUN", "leader", "NOUN", "nmod"), 1);
        CoOccurrenceAggregator::seeded_from(&edges, layout(), span)
    }

    #[test]
    fn test_counts_only_seeded_pairs() {
        let mut agg = seeded(1);
        run(
            &mut agg,
            &[
                ("the", "DET"),
                ("team", "NOUN"),
                ("leader", "NOUN"),
                ("team", "NOUN"),
                ("won", "VERB"),
            ],
        );
        let table = agg.into_table();
        // windows: [the team leader] [team leader team] [leader team won]
        // focus team: the,leader -> 1 ; focus leader: no seeded (leader, team)
        // focus team: leader,won -> 1
        assert_eq!(table.pair_freq("team", "NOUN", "leader", "NOUN"), Some(2));
        assert_eq!(table.pair_freq("leader", "NOUN", "team", "NOUN"), None);
        assert_eq!(table.pair_freq("team", "NOUN", "the", "DET"), None);
        assert_eq!(table.token_count("team", "NOUN"), Some(2));
        assert_eq!(table.token_count("leader", "NOUN"), Some(1));
        assert_eq!(table.token_count("won", "VERB"), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_incomplete_window_scores_nothing() {
        let mut agg = seeded(2);
        run(&mut agg, &[("team", "NOUN"), ("leader", "NOUN"), ("x", "X")]);
        let table = agg.into_table();
        assert_eq!(table.pair_freq("team", "NOUN", "leader", "NOUN"), Some(0));
        assert_eq!(table.token_count("team", "NOUN"), Some(1));
        // 0 / (1 + 1)
        assert_eq!(
            table.score("team", "NOUN", "leader", "NOUN"),
            crate::scoring::LOG_DICE_MIN
        );
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut agg = seeded(1);
        run(
            &mut agg,
            &[
                ("leader", "NOUN"),
                ("x", "X"),
                ("team", "NOUN"),
                ("y", "Y"),
            ],
        );
        // the only window centred on `team` is [x team y]
        let table = agg.into_table();
        assert_eq!(table.pair_freq("team", "NOUN", "leader", "NOUN"), Some(0));
    }

    #[test]
    fn test_score_matches_log_dice() {
        let mut agg = seeded(1);
        run(
            &mut agg,
            &[
                ("x", "X"),
                ("team", "NOUN"),
                ("leader", "NOUN"),
                ("x", "X"),
            ],
        );
        let table = agg.into_table();
        assert_eq!(
            table.score("team", "NOUN", "leader", "NOUN"),
            log_dice(1, 1, 1)
        );
        assert_eq!(table.score("nope", "X", "leader", "NOUN"), log_dice(0, 0, 1));
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let mut agg = seeded(1);
        let input = "team\tteam\n".to_string() + &word("team", "NOUN");
        parse_vertical_reader(VerticalReader::new(Cursor::new(input)), &mut agg).unwrap();
        assert_eq!(agg.skipped_rows(), 1);
        assert_eq!(agg.into_table().token_count("team", "NOUN"), Some(1));
    }
}
