//! Two-pass aggregation of a vertical corpus.
//!
//! The [`EdgeAggregator`] counts dependency edges restricted to the
//! configured relation classes, together with the parent and child marginal
//! sums. Its edge table then seeds the [`CoOccurrenceAggregator`], which
//! counts window co-occurrences only for word pairs already known to form an
//! edge.

pub mod cooccurrence;
pub mod deprel;
pub mod edges;
pub mod tables;

pub use cooccurrence::{CoOccurrenceAggregator, CoOccurrenceTable};
pub use deprel::{RelationClass, deprel_atoms, expand_deprel_multivalue, relation_classes};
pub use edges::{AggregatedTables, EdgeAggregator};
pub use tables::{EdgeKey, EdgeTable, SumKey, SumTable, WordKey};
