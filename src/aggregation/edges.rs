//! First pass: dependency edges and their marginal sums.

use log::{info, warn};

use crate::aggregation::deprel::{RelationClass, relation_classes};
use crate::aggregation::tables::{EdgeKey, EdgeTable, SumKey, SumTable};
use crate::config::SyntaxProps;
use crate::error::Result;
use crate::vertical::{TokenLayout, TokenProcessor, TokenRow};

/// Output of the edge pass.
#[derive(Debug, Clone, Default)]
pub struct AggregatedTables {
    pub edges: EdgeTable,
    /// Keyed by (p_lemma, p_upos, deprel).
    pub parent_sums: SumTable,
    /// Keyed by (lemma, upos, deprel).
    pub child_sums: SumTable,
}

/// Counts every token whose relation matches one of the configured
/// relation classes. Edges are keyed by the class value, so an `obj|iobj`
/// token lands once in the `obj|iobj` class.
#[derive(Debug)]
pub struct EdgeAggregator {
    layout: TokenLayout,
    classes: Vec<RelationClass>,
    tables: AggregatedTables,
    skipped_rows: usize,
}

impl EdgeAggregator {
    /// Aggregator for the noun-modifier, noun-subject and noun-object
    /// relations of a corpus.
    pub fn new(conf: &SyntaxProps) -> Self {
        Self::with_relations(TokenLayout::from_syntax(conf), &conf.relation_values())
    }

    /// Aggregator for an explicit list of relation expressions.
    pub fn with_relations<S: AsRef<str>>(layout: TokenLayout, relations: &[S]) -> Self {
        EdgeAggregator {
            layout,
            classes: relation_classes(relations),
            tables: AggregatedTables::default(),
            skipped_rows: 0,
        }
    }

    pub fn classes(&self) -> &[RelationClass] {
        &self.classes
    }

    /// Number of rows skipped for having too few columns.
    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn tables(&self) -> &AggregatedTables {
        &self.tables
    }

    pub fn into_tables(self) -> AggregatedTables {
        info!(
            "collocation table done: {} edges, {} parent sums, {} child sums",
            self.tables.edges.len(),
            self.tables.parent_sums.len(),
            self.tables.child_sums.len()
        );
        self.tables
    }
}

impl TokenProcessor for EdgeAggregator {
    fn proc_token(&mut self, row: &TokenRow) -> Result<()> {
        let Some(token) = self.layout.token(row) else {
            warn!(
                "Too few token columns on line {} ({} < {})",
                row.line,
                row.len(),
                self.layout.min_columns()
            );
            self.skipped_rows += 1;
            return Ok(());
        };
        for class in self.classes.iter().filter(|c| c.matches(token.deprel)) {
            let deprel = class.value();
            self.tables.edges.add(
                EdgeKey::new(token.lemma, token.upos, token.p_lemma, token.p_upos, deprel),
                1,
            );
            self.tables
                .parent_sums
                .add(SumKey::new(token.p_lemma, token.p_upos, deprel), 1);
            self.tables
                .child_sums
                .add(SumKey::new(token.lemma, token.upos, deprel), 1);
        }
        Ok(())
    }
}
