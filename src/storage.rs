//! Persistence of the aggregate tables.
//!
//! # Layout
//!
//! Every corpus owns three tables in one SQLite database:
//!
//! - `<corpus>_fcolls`: dependency edges with their frequency, four
//!   import-time logDice scores (query word as child or parent, with or
//!   without its POS), the window co-occurrence score and a shard key
//! - `<corpus>_parent_sums` and `<corpus>_child_sums`: marginal sums
//!
//! `<corpus>_lemma_candidates` and `<corpus>_p_lemma_candidates` are
//! rebuilt inside every load transaction, whatever strategy is configured,
//! and read by the materialized-view strategy.
//!
//! # Example
//!
//! ```no_run
//! use syncoll::config::DbConf;
//! use syncoll::storage::{Database, TableNames, schema};
//!
//! # fn main() -> syncoll::error::Result<()> {
//! let db = Database::open(&DbConf::new("/tmp/colls.db"))?;
//! let tables = TableNames::new("ud_en")?;
//! let mut conn = db.get()?;
//! schema::create_tables(&conn, &tables)?;
//! schema::test_table_ready(&mut conn, &tables)?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod predicate;
pub mod schema;
pub mod strategy;
pub mod writer;

pub use connection::{Database, PooledConnection};
pub use predicate::{Column, Op, Predicate, PredicateBuilder};
pub use schema::TableNames;
pub use strategy::{
    Candidate, CandidateFilter, MaterializedView, PersistenceStrategy, PrecomputedScores,
    RawSums, strategy_for,
};
pub use writer::{BulkWriter, EdgeWords, WriteStats, load_edge_words};
