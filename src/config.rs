//! Application configuration.
//!
//! The configuration is a single JSON document:
//!
//! ```json
//! {
//!   "db": {"path": "/var/lib/syncoll/colls.db", "poolSize": 8},
//!   "requestTimeoutSecs": 30,
//!   "corpora": [
//!     {"name": "intercorp_v13ud_en", "size": 123456789, "syntax": { ... }}
//!   ],
//!   "import": {"batchSize": 1000, "coOccSpan": 2, "forceMode": "drop"},
//!   "query": {"minFreq": 1, "persistence": "rawSums", "fetchPartitions": 4}
//! }
//! ```
//!
//! Missing tunables are filled in by [`Config::validate_and_defaults`].

pub mod syntax;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lazy_static::lazy_static;
use log::warn;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncollError};

pub use syntax::{PosAttrProps, SyntaxProps};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_POOL_SIZE: usize = 8;
pub const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_CO_OCC_SPAN: usize = 2;
pub const DEFAULT_MIN_FREQ: i64 = 1;
pub const DEFAULT_MAX_ITEMS: usize = 10;

lazy_static! {
    /// Corpus identifiers become table name prefixes.
    static ref CORPUS_ID_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Check that a corpus identifier can safely prefix a table name.
pub fn validate_corpus_id(corpus_id: &str) -> Result<()> {
    if CORPUS_ID_RE.is_match(corpus_id) {
        Ok(())
    } else {
        Err(SyncollError::config(format!(
            "invalid corpus identifier `{corpus_id}`"
        )))
    }
}

/// Database location and pooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbConf {
    /// Path of the SQLite database file.
    pub path: PathBuf,

    /// Maximum number of idle connections kept by the pool.
    #[serde(default)]
    pub pool_size: usize,

    /// How long a statement waits for a competing writer's lock.
    #[serde(default)]
    pub busy_timeout_secs: u64,
}

impl DbConf {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        DbConf {
            path: path.into(),
            pool_size: DEFAULT_POOL_SIZE,
            busy_timeout_secs: DEFAULT_BUSY_TIMEOUT_SECS,
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }
}

/// A corpus the service knows about.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusProps {
    pub name: String,

    /// Number of tokens, used for per-million normalization.
    pub size: i64,

    pub syntax: SyntaxProps,

    /// Size of the shard key space of the edge table. Fixed at import
    /// time; queries may partition it into any number of fetch ranges.
    #[serde(default = "default_shards")]
    pub shards: u32,
}

fn default_shards() -> u32 {
    1
}

impl CorpusProps {
    pub fn validate(&self, conf_context: &str) -> Result<()> {
        validate_corpus_id(&self.name)?;
        if self.shards == 0 {
            return Err(SyncollError::config(format!(
                "`{conf_context}.shards` must be positive"
            )));
        }
        self.syntax.validate(conf_context)
    }
}

/// All configured corpora.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorporaConf(pub Vec<CorpusProps>);

impl CorporaConf {
    pub fn get_corpus_props(&self, corpus_id: &str) -> Option<&CorpusProps> {
        self.0.iter().find(|props| props.name == corpus_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CorpusProps> {
        self.0.iter()
    }
}

/// What a forced import does with existing aggregate tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForceMode {
    /// Drop and recreate the tables (picks up schema changes).
    #[default]
    Drop,
    /// Keep the tables, delete their rows.
    Truncate,
}

/// Which persistence strategy backs the candidate queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PersistenceKind {
    /// Association score stored on each edge row at import time.
    Precomputed,
    /// Score computed per query from edge frequencies and marginal sums.
    #[default]
    RawSums,
    /// Marginal sums supplied by tables rebuilt after each import.
    MaterializedView,
}

/// Tunables of the batch import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportConf {
    /// Rows per INSERT statement.
    pub batch_size: usize,

    /// Co-occurrence window radius (window width is `2 * span + 1`).
    pub co_occ_span: usize,

    pub force_mode: ForceMode,
}

impl Default for ImportConf {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            co_occ_span: DEFAULT_CO_OCC_SPAN,
            force_mode: ForceMode::Drop,
        }
    }
}

/// Tunables of the candidate query engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryConf {
    /// Edge rows with a lower frequency are not considered as candidates.
    pub min_freq: i64,

    pub default_max_items: usize,

    pub persistence: PersistenceKind,

    /// Number of concurrently fetched shard ranges (1 = no fan-out).
    pub fetch_partitions: usize,

    /// Size of the fan-out worker pool. Zero means the number of CPUs.
    pub fetch_workers: usize,
}

impl Default for QueryConf {
    fn default() -> Self {
        Self {
            min_freq: DEFAULT_MIN_FREQ,
            default_max_items: DEFAULT_MAX_ITEMS,
            persistence: PersistenceKind::RawSums,
            fetch_partitions: 1,
            fetch_workers: 0,
        }
    }
}

/// Global configuration of the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub db: DbConf,

    #[serde(default)]
    pub corpora: CorporaConf,

    #[serde(default)]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub import: ImportConf,

    #[serde(default)]
    pub query: QueryConf,

    #[serde(skip)]
    src_path: Option<PathBuf>,
}

impl Config {
    /// Create a configuration with defaults for everything but the database.
    pub fn new(db: DbConf) -> Self {
        Config {
            db,
            corpora: CorporaConf::default(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            import: ImportConf::default(),
            query: QueryConf::default(),
            src_path: None,
        }
    }

    /// Load a configuration from a JSON file. Defaults are not applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            SyncollError::config(format!("cannot load config {}: {e}", path.display()))
        })?;
        let mut conf: Config = serde_json::from_str(&raw)?;
        conf.src_path = Some(path.to_path_buf());
        Ok(conf)
    }

    /// Path the configuration was loaded from, if any.
    pub fn source_path(&self) -> Option<&Path> {
        self.src_path.as_deref()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Fill in defaults for unset tunables and validate all corpora.
    pub fn validate_and_defaults(&mut self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
            warn!(
                "requestTimeoutSecs not specified, using default: {}",
                DEFAULT_REQUEST_TIMEOUT_SECS
            );
        }
        if self.db.pool_size == 0 {
            self.db.pool_size = DEFAULT_POOL_SIZE;
            warn!("db.poolSize not specified, using default: {DEFAULT_POOL_SIZE}");
        }
        if self.db.busy_timeout_secs == 0 {
            self.db.busy_timeout_secs = DEFAULT_BUSY_TIMEOUT_SECS;
        }
        if self.import.batch_size == 0 {
            self.import.batch_size = DEFAULT_BATCH_SIZE;
            warn!("import.batchSize must be positive, using default: {DEFAULT_BATCH_SIZE}");
        }
        if self.query.default_max_items == 0 {
            self.query.default_max_items = DEFAULT_MAX_ITEMS;
        }
        if self.query.fetch_partitions == 0 {
            self.query.fetch_partitions = 1;
        }
        if self.query.fetch_workers == 0 {
            self.query.fetch_workers = num_cpus::get();
        }
        if self.corpora.0.is_empty() {
            warn!("no corpora configured");
        }
        for corpus in self.corpora.iter() {
            corpus.validate("corpora")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_json() -> String {
        let syntax = serde_json::to_string(&SyntaxProps::universal_dependencies()).unwrap();
        format!(
            r#"{{
                "db": {{"path": "/tmp/colls.db"}},
                "corpora": [{{"name": "ud_en", "size": 1000000, "syntax": {syntax}}}],
                "query": {{"persistence": "materializedView", "fetchPartitions": 4}}
            }}"#
        )
    }

    #[test]
    fn test_load_and_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", sample_json()).unwrap();
        file.flush().unwrap();

        let mut conf = Config::load(file.path()).unwrap();
        assert_eq!(conf.source_path(), Some(file.path()));
        conf.validate_and_defaults().unwrap();

        assert_eq!(conf.request_timeout(), Duration::from_secs(30));
        assert_eq!(conf.db.pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(conf.import.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(conf.import.co_occ_span, DEFAULT_CO_OCC_SPAN);
        assert_eq!(conf.import.force_mode, ForceMode::Drop);
        assert_eq!(conf.query.persistence, PersistenceKind::MaterializedView);
        assert_eq!(conf.query.fetch_partitions, 4);
        assert!(conf.query.fetch_workers > 0);

        let corpus = conf.corpora.get_corpus_props("ud_en").unwrap();
        assert_eq!(corpus.size, 1_000_000);
        assert_eq!(corpus.shards, 1);
        assert!(conf.corpora.get_corpus_props("unknown").is_none());
    }

    #[test]
    fn test_invalid_corpus_id() {
        assert!(validate_corpus_id("syn2020").is_ok());
        assert!(validate_corpus_id("_x1").is_ok());
        assert!(validate_corpus_id("1abc").is_err());
        assert!(validate_corpus_id("a;DROP TABLE x").is_err());
        assert!(validate_corpus_id("").is_err());
    }

    #[test]
    fn test_invalid_corpus_rejected_on_validation() {
        let mut conf = Config::new(DbConf::new("/tmp/x.db"));
        conf.corpora.0.push(CorpusProps {
            name: "bad-name".to_string(),
            size: 10,
            syntax: SyntaxProps::universal_dependencies(),
            shards: 1,
        });
        assert!(conf.validate_and_defaults().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load("/nonexistent/syncoll.json").unwrap_err();
        assert!(matches!(err, SyncollError::Config(_)));
    }
}
