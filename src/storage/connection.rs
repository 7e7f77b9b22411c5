//! SQLite connections with a small bounded pool and per-operation
//! deadlines.

use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::time::{Duration, Instant};

use log::debug;
use parking_lot::Mutex;
use rusqlite::Connection;

use crate::config::DbConf;
use crate::error::{Result, SyncollError};

/// How many SQLite virtual machine instructions run between two deadline
/// checks.
const PROGRESS_CHECK_OPS: i32 = 1000;

/// Shared database handle. Connections are opened lazily and kept for
/// reuse up to the configured pool size.
#[derive(Debug)]
pub struct Database {
    conf: DbConf,
    idle: Mutex<Vec<Connection>>,
}

impl Database {
    /// Open the database file, creating it if needed, and check that it
    /// accepts connections.
    pub fn open(conf: &DbConf) -> Result<Self> {
        let db = Database {
            conf: conf.clone(),
            idle: Mutex::new(Vec::with_capacity(conf.pool_size)),
        };
        let conn = db.connect()?;
        db.idle.lock().push(conn);
        debug!("database {} opened", conf.path.display());
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.conf.path
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.conf.path).map_err(|e| {
            SyncollError::storage(format!(
                "failed to open database {}: {e}",
                self.conf.path.display()
            ))
        })?;
        let busy = if self.conf.busy_timeout_secs == 0 {
            Duration::from_secs(crate::config::DEFAULT_BUSY_TIMEOUT_SECS)
        } else {
            self.conf.busy_timeout()
        };
        conn.busy_timeout(busy)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        if !mode.eq_ignore_ascii_case("wal") {
            debug!("journal mode {mode} kept for {}", self.conf.path.display());
        }
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(conn)
    }

    /// Check out a connection. It returns to the pool when dropped.
    pub fn get(&self) -> Result<PooledConnection<'_>> {
        let conn = match self.idle.lock().pop() {
            Some(conn) => conn,
            None => self.connect()?,
        };
        Ok(PooledConnection {
            db: self,
            conn: Some(conn),
        })
    }

    /// Check out a connection whose statements are interrupted once
    /// `deadline` passes.
    pub fn get_with_deadline(&self, deadline: Instant) -> Result<PooledConnection<'_>> {
        let conn = self.get()?;
        conn.set_deadline(Some(deadline));
        Ok(conn)
    }

    fn release(&self, conn: Connection) {
        let mut idle = self.idle.lock();
        if idle.len() < self.conf.pool_size.max(1) {
            idle.push(conn);
        }
    }

    /// Number of connections waiting in the pool.
    pub fn idle_connections(&self) -> usize {
        self.idle.lock().len()
    }
}

/// A connection checked out of a [`Database`].
pub struct PooledConnection<'a> {
    db: &'a Database,
    conn: Option<Connection>,
}

impl PooledConnection<'_> {
    /// Bind all following statements to `deadline`; `None` removes the
    /// bound. An expired statement fails with `SQLITE_INTERRUPT`.
    pub fn set_deadline(&self, deadline: Option<Instant>) {
        let Some(conn) = self.conn.as_ref() else {
            return;
        };
        match deadline {
            Some(deadline) => {
                conn.progress_handler(PROGRESS_CHECK_OPS, Some(move || Instant::now() >= deadline))
            }
            None => conn.progress_handler(0, None::<fn() -> bool>),
        }
    }
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // present until drop
        self.conn.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        self.set_deadline(None);
        if let Some(conn) = self.conn.take() {
            self.db.release(conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let mut conf = DbConf::new(dir.path().join("colls.db"));
        conf.pool_size = 2;
        let db = Database::open(&conf).unwrap();
        (dir, db)
    }

    #[test]
    fn test_connections_are_reused() {
        let (_dir, db) = open_temp();
        assert_eq!(db.idle_connections(), 1);
        {
            let a = db.get().unwrap();
            let b = db.get().unwrap();
            let c = db.get().unwrap();
            assert_eq!(db.idle_connections(), 0);
            let v: i64 = a.query_row("SELECT 1", [], |r| r.get(0)).unwrap();
            assert_eq!(v, 1);
            drop((b, c));
        }
        assert_eq!(db.idle_connections(), 2);
    }

    #[test]
    fn test_expired_deadline_interrupts() {
        let (_dir, db) = open_temp();
        let conn = db
            .get_with_deadline(Instant::now() - Duration::from_millis(1))
            .unwrap();
        let err = conn
            .query_row(
                "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 10000000) \
                 SELECT SUM(x) FROM c",
                [],
                |r| r.get::<_, i64>(0),
            )
            .unwrap_err();
        assert!(SyncollError::from_db(err).is_timeout());
    }

    #[test]
    fn test_deadline_is_cleared_on_release() {
        let (_dir, db) = open_temp();
        {
            let _conn = db
                .get_with_deadline(Instant::now() - Duration::from_millis(1))
                .unwrap();
        }
        let conn = db.get().unwrap();
        let v: i64 = conn
            .query_row(
                "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 10000) \
                 SELECT COUNT(*) FROM c",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(v, 10000);
    }
}
