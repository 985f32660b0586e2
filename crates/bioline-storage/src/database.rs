// SPDX-FileCopyrightText: 2026 Bioline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All writes are serialized through tokio-rusqlite's single background thread.
//! Do NOT create additional Connection instances for writes.

use std::sync::atomic::{AtomicI64, Ordering};

use bioline_core::BiolineError;
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info};

use crate::migrations::run_migrations;

/// Map a tokio-rusqlite failure into the storage error variant.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> BiolineError {
    BiolineError::Storage {
        source: Box::new(e),
    }
}

/// Handle to the SQLite database.
///
/// Wraps the single writer connection and the timestamp clock used for
/// `created_at` columns.
pub struct Database {
    conn: tokio_rusqlite::Connection,
    clock: MonotonicClock,
}

impl Database {
    /// Open (or create) the database at `path`, apply PRAGMAs, and run
    /// pending migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, BiolineError> {
        if let Some(parent) = std::path::Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(BiolineError::storage)?;
        }

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(BiolineError::storage)?;

        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "busy_timeout", 5000)?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| Ok::<_, rusqlite::Error>(run_migrations(conn)))
            .await
            .map_err(map_tr_err)??;

        // Seed the clock so restarts never hand out an older timestamp.
        let latest: Option<String> = conn
            .call(|conn| -> Result<Option<String>, rusqlite::Error> {
                conn.query_row("SELECT MAX(created_at) FROM messages", [], |row| row.get(0))
            })
            .await
            .map_err(map_tr_err)?;
        let clock = MonotonicClock::new();
        if let Some(latest) = latest.as_deref() {
            clock.observe(latest);
        }

        info!(path, wal_mode, "database opened");
        Ok(Self { conn, clock })
    }

    /// The single writer connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Next `created_at` value, strictly greater than every value issued before.
    pub fn next_timestamp(&self) -> String {
        self.clock.next()
    }

    /// Checkpoint the WAL into the main database file.
    pub async fn checkpoint(&self) -> Result<(), BiolineError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    /// Checkpoint and close the connection.
    pub async fn close(self) -> Result<(), BiolineError> {
        self.checkpoint().await?;
        self.conn.close().await.map_err(map_tr_err)
    }
}

/// Microsecond UTC clock that never repeats or goes backwards.
///
/// Two rows written within the same microsecond, or across a wall-clock
/// step backwards, still get strictly increasing values.
pub(crate) struct MonotonicClock {
    last_micros: AtomicI64,
}

impl MonotonicClock {
    pub(crate) fn new() -> Self {
        Self {
            last_micros: AtomicI64::new(i64::MIN),
        }
    }

    /// Raise the floor to an already-persisted timestamp.
    pub(crate) fn observe(&self, timestamp: &str) {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) {
            self.last_micros
                .fetch_max(parsed.timestamp_micros(), Ordering::SeqCst);
        }
    }

    pub(crate) fn next(&self) -> String {
        let now = Utc::now().timestamp_micros();
        let mut prev = self.last_micros.load(Ordering::SeqCst);
        loop {
            let candidate = now.max(prev.saturating_add(1));
            match self.last_micros.compare_exchange(
                prev,
                candidate,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return format_micros(candidate),
                Err(actual) => prev = actual,
            }
        }
    }
}

fn format_micros(micros: i64) -> String {
    DateTime::<Utc>::from_timestamp_micros(micros)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Micros, true)
}
