//! Connection bootstrap for the provenance store.
//!
//! # Responsibility
//! - Open an existing store file, or a private in-memory store.
//! - Configure pragmas and the busy timeout bounding every store query.
//! - Trigger schema migrations before returning a usable connection.
//!
//! # Invariants
//! - A missing store file is an error; the file is never created here.
//! - Returned connections have `foreign_keys=ON`, case-sensitive `LIKE`
//!   and migrations fully applied.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use crate::config::DEFAULT_QUERY_TIMEOUT;
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens the store file at `path`; `busy_timeout` bounds every lock wait.
///
/// # Errors
/// - `DbError::MissingStore` when `path` is not an existing file.
/// - `DbError::SchemaTooNew` when the file was migrated by a newer build.
pub fn open_db(path: impl AsRef<Path>, busy_timeout: Duration) -> DbResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start mode=file path={}",
        path.display()
    );

    if !path.is_file() {
        error!(
            "event=db_open module=db status=error mode=file error_code=store_missing path={}",
            path.display()
        );
        return Err(DbError::MissingStore(path.to_path_buf()));
    }

    // Without SQLITE_OPEN_CREATE a file removed after the check above still
    // fails instead of being recreated empty.
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let mut conn = Connection::open_with_flags(path, flags).map_err(|err| {
        error!(
            "event=db_open module=db status=error mode=file error_code=db_open_failed duration_ms={} error={}",
            started_at.elapsed().as_millis(),
            err
        );
        DbError::from(err)
    })?;

    finish_open(&mut conn, busy_timeout, "file", started_at)?;
    Ok(conn)
}

/// Opens a private in-memory store with the full schema and no content.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    let mut conn = Connection::open_in_memory().map_err(|err| {
        error!(
            "event=db_open module=db status=error mode=memory error_code=db_open_failed error={}",
            err
        );
        DbError::from(err)
    })?;

    finish_open(&mut conn, DEFAULT_QUERY_TIMEOUT, "memory", started_at)?;
    Ok(conn)
}

fn finish_open(
    conn: &mut Connection,
    busy_timeout: Duration,
    mode: &str,
    started_at: Instant,
) -> DbResult<()> {
    if let Err(err) = bootstrap_connection(conn, busy_timeout) {
        error!(
            "event=db_open module=db status=error mode={} error_code=db_bootstrap_failed duration_ms={} error={}",
            mode,
            started_at.elapsed().as_millis(),
            err
        );
        return Err(err);
    }

    info!(
        "event=db_open module=db status=ok mode={} duration_ms={} busy_timeout_ms={}",
        mode,
        started_at.elapsed().as_millis(),
        busy_timeout.as_millis()
    );
    Ok(())
}

fn bootstrap_connection(conn: &mut Connection, busy_timeout: Duration) -> DbResult<()> {
    // Group labels and tags are matched with `LIKE`; curated labels differ
    // by case only when they belong to different materials.
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA case_sensitive_like = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    apply_migrations(conn)?;
    Ok(())
}
