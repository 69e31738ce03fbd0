//! Catalog store bootstrap: connection opening and schema migrations.
//!
//! # Responsibility
//! - Hand out connections whose `products` schema is fully migrated.
//! - Report storage failures with enough context to tell which step failed.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A failed migration leaves the store at its previous version.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure raised while opening, migrating or querying the catalog store.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// A migration script failed; its transaction was rolled back.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// The store was written by a newer binary.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Stable code used in `error_code=` log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) if self.is_busy() => "db_busy",
            Self::Sqlite(_) => "db_sqlite",
            Self::Migration { .. } => "db_migration_failed",
            Self::UnsupportedSchemaVersion { .. } => "db_schema_too_new",
        }
    }

    /// True when SQLite gave up waiting for a lock held by another connection.
    pub fn is_busy(&self) -> bool {
        let err = match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => err,
            Self::UnsupportedSchemaVersion { .. } => return false,
        };
        matches!(
            err.sqlite_error_code(),
            Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
        )
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "catalog store error: {err}"),
            Self::Migration {
                version,
                name,
                source,
            } => write!(f, "migration {version} ({name}) failed: {source}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "catalog schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

#[cfg(test)]
mod tests {
    use super::DbError;
    use std::error::Error;

    fn sqlite_failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn busy_and_locked_failures_are_flagged() {
        let busy = DbError::Sqlite(sqlite_failure(rusqlite::ffi::SQLITE_BUSY));
        assert!(busy.is_busy());
        assert_eq!(busy.code(), "db_busy");

        let locked = DbError::Migration {
            version: 2,
            name: "products_fts",
            source: sqlite_failure(rusqlite::ffi::SQLITE_LOCKED),
        };
        assert!(locked.is_busy());
        assert_eq!(locked.code(), "db_migration_failed");
    }

    #[test]
    fn migration_error_names_the_failed_step() {
        let err = DbError::Migration {
            version: 1,
            name: "products",
            source: sqlite_failure(rusqlite::ffi::SQLITE_ERROR),
        };
        assert!(!err.is_busy());
        assert!(err.to_string().starts_with("migration 1 (products) failed"));
        assert!(err.source().is_some());
    }

    #[test]
    fn schema_too_new_has_no_source() {
        let err = DbError::UnsupportedSchemaVersion {
            db_version: 9,
            latest_supported: 2,
        };
        assert_eq!(err.code(), "db_schema_too_new");
        assert!(err.source().is_none());
    }
}
