//! # syncoll
//!
//! Syntactic collocation extraction and candidate ranking for
//! dependency-parsed corpora.
//!
//! ## Features
//!
//! - Streaming aggregation of vertical files into edge and marginal tables
//! - Window-based co-occurrence scoring of the extracted edges
//! - Bulk loading into per-corpus SQLite tables
//! - Three interchangeable persistence strategies for candidate retrieval
//! - logDice ranking with deadline-bounded, optionally sharded fetches
//! - HTTP-shaped action layer and a command line interface

pub mod aggregation;
pub mod api;
pub mod cli;
pub mod config;
pub mod cql;
pub mod error;
pub mod import;
pub mod query;
pub mod scoring;
pub mod storage;
pub mod vertical;

pub mod prelude {
    pub use crate::config::{Config, CorpusProps, DbConf};
    pub use crate::error::{Result, SyncollError};
    pub use crate::query::{FreqDistrib, QueryEngine, Relation, Word};
    pub use crate::storage::Database;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
