//! Frequency tables keyed by composite keys.

use std::hash::Hash;

use ahash::AHashMap;

/// Key of a dependency edge: word X (as POS) stands in relation `deprel`
/// to parent word Y (as POS).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub lemma: String,
    pub upos: String,
    pub p_lemma: String,
    pub p_upos: String,
    pub deprel: String,
}

impl EdgeKey {
    pub fn new(lemma: &str, upos: &str, p_lemma: &str, p_upos: &str, deprel: &str) -> Self {
        EdgeKey {
            lemma: lemma.to_string(),
            upos: upos.to_string(),
            p_lemma: p_lemma.to_string(),
            p_upos: p_upos.to_string(),
            deprel: deprel.to_string(),
        }
    }

    /// Marginal key of the child side.
    pub fn child(&self) -> SumKey {
        SumKey::new(&self.lemma, &self.upos, &self.deprel)
    }

    /// Marginal key of the parent side.
    pub fn parent(&self) -> SumKey {
        SumKey::new(&self.p_lemma, &self.p_upos, &self.deprel)
    }

    /// Stable shard number in `[0, shards)`.
    pub fn shard(&self, shards: u32) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        for part in [&self.lemma, &self.upos, &self.p_lemma, &self.p_upos, &self.deprel] {
            hasher.update(part.as_bytes());
            hasher.update(&[0]);
        }
        hasher.finalize() % shards.max(1)
    }
}

/// Key of a marginal sum. For parent sums the fields hold the parent's
/// lemma and POS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SumKey {
    pub lemma: String,
    pub upos: String,
    pub deprel: String,
}

impl SumKey {
    pub fn new(lemma: &str, upos: &str, deprel: &str) -> Self {
        SumKey {
            lemma: lemma.to_string(),
            upos: upos.to_string(),
            deprel: deprel.to_string(),
        }
    }
}

/// A word identified by lemma and part of speech.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WordKey {
    pub lemma: String,
    pub upos: String,
}

impl WordKey {
    pub fn new(lemma: &str, upos: &str) -> Self {
        WordKey {
            lemma: lemma.to_string(),
            upos: upos.to_string(),
        }
    }
}

/// Accumulating frequency table. Values only ever grow.
#[derive(Debug, Clone)]
pub struct FreqTable<K: Eq + Hash> {
    items: AHashMap<K, i64>,
}

impl<K: Eq + Hash> Default for FreqTable<K> {
    fn default() -> Self {
        FreqTable {
            items: AHashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Ord + Clone> FreqTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `val` to the frequency of `key`, inserting it if needed.
    pub fn add(&mut self, key: K, val: i64) {
        *self.items.entry(key).or_insert(0) += val;
    }

    pub fn get(&self, key: &K) -> Option<i64> {
        self.items.get(key).copied()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.items.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all frequencies.
    pub fn total(&self) -> i64 {
        self.items.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, i64)> {
        self.items.iter().map(|(k, v)| (k, *v))
    }

    /// Entries ordered by key; makes writes reproducible.
    pub fn sorted(&self) -> Vec<(&K, i64)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

pub type EdgeTable = FreqTable<EdgeKey>;
pub type SumTable = FreqTable<SumKey>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulation() {
        let mut table = EdgeTable::new();
        let key = EdgeKey::new("team", "NOUN", "leader", "NOUN", "nmod");
        table.add(key.clone(), 1);
        table.add(key.clone(), 2);
        table.add(EdgeKey::new("team", "NOUN", "captain", "NOUN", "nmod"), 1);

        assert_eq!(table.get(&key), Some(3));
        assert_eq!(table.len(), 2);
        assert_eq!(table.total(), 4);
    }

    #[test]
    fn test_no_delimiter_collisions() {
        // "a:b" + "c" vs "a" + "b:c" would collide under naive joining
        let mut table = SumTable::new();
        table.add(SumKey::new("a:b", "c", "nmod"), 1);
        table.add(SumKey::new("a", "b:c", "nmod"), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_sorted_entries() {
        let mut table = SumTable::new();
        table.add(SumKey::new("zebra", "NOUN", "nsubj"), 1);
        table.add(SumKey::new("apple", "NOUN", "nsubj"), 5);
        let sorted = table.sorted();
        assert_eq!(sorted[0].0.lemma, "apple");
        assert_eq!(sorted[1].1, 1);
    }

    #[test]
    fn test_shard_is_stable_and_bounded() {
        let key = EdgeKey::new("team", "NOUN", "leader", "NOUN", "nmod");
        let shard = key.shard(16);
        assert!(shard < 16);
        assert_eq!(shard, key.clone().shard(16));
        assert_eq!(key.shard(1), 0);
        assert_eq!(key.shard(0), 0);
    }
}
