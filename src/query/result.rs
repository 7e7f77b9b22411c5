//! Response payload of a candidate query.

use serde::{Deserialize, Serialize};

/// One ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreqDistribItem {
    pub word: String,
    pub freq: i64,
    /// Instances per million tokens.
    pub ipm: f64,
    pub coll_weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co_occ_score: Option<f64>,
}

/// Ranked candidates of one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreqDistrib {
    pub freqs: Vec<FreqDistribItem>,
    pub corpus_size: i64,
    /// Example search query with `%s` in place of the candidate.
    pub examples_query_tpl: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FreqDistrib {
    pub fn len(&self) -> usize {
        self.freqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    /// Keep at most `max_items` leading items.
    pub fn cut(&mut self, max_items: usize) {
        self.freqs.truncate(max_items);
    }

    /// Words in ranking order.
    pub fn words(&self) -> Vec<&str> {
        self.freqs.iter().map(|item| item.word.as_str()).collect()
    }
}
