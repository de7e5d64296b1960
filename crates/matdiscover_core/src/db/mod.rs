//! SQLite bootstrap and schema migration for the provenance store.
//!
//! # Responsibility
//! - Open existing store files; never create one on behalf of a caller.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No store query runs before migrations succeed.
//! - `LIKE` comparisons are case-sensitive on every returned connection.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure to obtain a migrated store connection.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Nothing exists at the configured store path.
    MissingStore(PathBuf),
    /// The store carries a schema written by a newer build.
    SchemaTooNew { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::MissingStore(path) => {
                write!(f, "no provenance store file at `{}`", path.display())
            }
            Self::SchemaTooNew { found, supported } => write!(
                f,
                "provenance schema v{found} is newer than this build understands (v{supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::MissingStore(_) | Self::SchemaTooNew { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
