//! Candidate query engine.
//!
//! A query names a corpus, a word (lemma with an optional part of speech)
//! and a [`Relation`]. The engine fetches the query word's marginal
//! frequency and all matching edge rows through the configured
//! [`PersistenceStrategy`](crate::storage::PersistenceStrategy), scores
//! every candidate with logDice and returns the best ones.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use syncoll::config::Config;
//! use syncoll::query::{QueryEngine, Relation, Word};
//! use syncoll::storage::Database;
//!
//! # fn main() -> syncoll::error::Result<()> {
//! let mut conf = Config::load("/etc/syncoll.json")?;
//! conf.validate_and_defaults()?;
//! let db = Arc::new(Database::open(&conf.db)?);
//! let engine = QueryEngine::new(db, &conf)?;
//! let ans = engine.rank_candidates(
//!     "ud_en",
//!     &Word::new("team").with_pos("NOUN"),
//!     Relation::NounsModifiedBy,
//!     1,
//!     10,
//! )?;
//! for item in &ans.freqs {
//!     println!("{} {}", item.word, item.coll_weight);
//! }
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod fanout;
pub mod relation;
pub mod result;
pub mod word;

pub use engine::{QueryEngine, rank, shard_partitions};
pub use fanout::FanOut;
pub use relation::{Direction, Relation};
pub use result::{FreqDistrib, FreqDistribItem};
pub use word::Word;
