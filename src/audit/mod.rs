//! Audit log: a local history of vault operations in `<home>/audit.db`.
//!
//! Rows carry the vault name, the operation and at most an entry id plus a
//! short detail such as the entry kind. Secret values never reach this table.
//!
//! Auditing is best-effort. A database that cannot be opened or written is
//! skipped without failing the command, and builds without the `audit-log`
//! feature make `log_audit` a no-op.

use std::path::{Path, PathBuf};

#[cfg(feature = "audit-log")]
pub use sqlite::{AuditEntry, AuditLog};

/// Location of the audit database inside a home directory.
pub fn db_path(home: &Path) -> PathBuf {
    home.join("audit.db")
}

/// Append one event to the audit log under `home`.
pub fn log_audit(home: &Path, vault: &str, op: &str, entry: Option<&str>, details: Option<&str>) {
    #[cfg(feature = "audit-log")]
    match AuditLog::open(home) {
        Some(audit) => audit.log(op, vault, entry, details),
        None => tracing::debug!(home = %home.display(), op, "audit log unavailable"),
    }

    #[cfg(not(feature = "audit-log"))]
    let _ = (home, vault, op, entry, details);
}

#[cfg(feature = "audit-log")]
mod sqlite {
    use std::path::Path;

    use chrono::{DateTime, Utc};
    use rusqlite::{params, Connection, Row};
    use tracing::warn;

    use crate::errors::{Result, VaultError};

    const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS events (
        seq        INTEGER PRIMARY KEY AUTOINCREMENT,
        at_unix    INTEGER NOT NULL,
        vault      TEXT NOT NULL,
        operation  TEXT NOT NULL,
        entry_id   TEXT,
        details    TEXT
    );
    CREATE INDEX IF NOT EXISTS events_by_vault ON events (vault, seq);";

    /// One recorded event.
    #[derive(Debug, Clone)]
    pub struct AuditEntry {
        pub id: i64,
        pub timestamp: DateTime<Utc>,
        pub operation: String,
        pub vault: String,
        pub entry_id: Option<String>,
        pub details: Option<String>,
    }

    impl AuditEntry {
        fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
            let at: i64 = row.get(1)?;
            Ok(Self {
                id: row.get(0)?,
                timestamp: DateTime::from_timestamp(at, 0).unwrap_or_default(),
                vault: row.get(2)?,
                operation: row.get(3)?,
                entry_id: row.get(4)?,
                details: row.get(5)?,
            })
        }
    }

    pub struct AuditLog {
        conn: Connection,
    }

    impl AuditLog {
        /// Open or create the database, restricted to the owner on unix.
        ///
        /// `None` means auditing is unavailable for this command.
        pub fn open(home: &Path) -> Option<Self> {
            let path = super::db_path(home);
            let conn = Connection::open(&path).ok()?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let _ = std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600));
            }

            conn.execute_batch(SCHEMA).ok()?;
            Some(Self { conn })
        }

        /// Append an event; a failed insert is only logged.
        pub fn log(
            &self,
            operation: &str,
            vault: &str,
            entry_id: Option<&str>,
            details: Option<&str>,
        ) {
            let inserted = self.conn.execute(
                "INSERT INTO events (at_unix, vault, operation, entry_id, details)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![Utc::now().timestamp(), vault, operation, entry_id, details],
            );
            if let Err(e) = inserted {
                warn!(operation, vault, error = %e, "audit insert failed");
            }
        }

        /// The `limit` newest events, optionally for a single vault.
        pub fn query(&self, limit: usize, vault: Option<&str>) -> Result<Vec<AuditEntry>> {
            let audit_err = |e: rusqlite::Error| VaultError::AuditError(e.to_string());

            let mut stmt = self
                .conn
                .prepare(
                    "SELECT seq, at_unix, vault, operation, entry_id, details
                     FROM events
                     WHERE ?1 IS NULL OR vault = ?1
                     ORDER BY seq DESC
                     LIMIT ?2",
                )
                .map_err(audit_err)?;

            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            let rows = stmt
                .query_map(params![vault, limit], AuditEntry::from_row)
                .map_err(audit_err)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(audit_err)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use tempfile::TempDir;

        #[test]
        fn open_creates_database() {
            let dir = TempDir::new().unwrap();
            assert!(AuditLog::open(dir.path()).is_some());
            assert!(super::super::db_path(dir.path()).exists());
        }

        #[test]
        fn newest_events_come_first() {
            let dir = TempDir::new().unwrap();
            let audit = AuditLog::open(dir.path()).unwrap();

            audit.log("create", "work", None, Some("vault created"));
            audit.log("add", "work", Some("1b4e28ba"), Some("password"));
            audit.log("delete", "work", Some("1b4e28ba"), Some("password"));

            let events = audit.query(10, None).unwrap();
            let ops: Vec<_> = events.iter().map(|e| e.operation.as_str()).collect();
            assert_eq!(ops, ["delete", "add", "create"]);
            assert_eq!(events[1].entry_id.as_deref(), Some("1b4e28ba"));
            assert!(events[2].entry_id.is_none());
        }

        #[test]
        fn query_honours_vault_filter_and_limit() {
            let dir = TempDir::new().unwrap();
            let audit = AuditLog::open(dir.path()).unwrap();

            for _ in 0..5 {
                audit.log("unlock", "work", None, None);
            }
            audit.log("unlock", "home", None, None);

            assert_eq!(audit.query(3, None).unwrap().len(), 3);
            let home = audit.query(10, Some("home")).unwrap();
            assert_eq!(home.len(), 1);
            assert_eq!(home[0].vault, "home");
        }

        #[test]
        fn unreachable_home_disables_auditing() {
            assert!(AuditLog::open(Path::new("/nonexistent/vaultkeep/home")).is_none());
            // The free function must not panic either.
            crate::audit::log_audit(
                Path::new("/nonexistent/vaultkeep/home"),
                "work",
                "unlock",
                None,
                None,
            );
        }

        #[cfg(unix)]
        #[test]
        fn database_is_owner_only() {
            use std::os::unix::fs::PermissionsExt;

            let dir = TempDir::new().unwrap();
            let _audit = AuditLog::open(dir.path()).unwrap();

            let mode = std::fs::metadata(super::super::db_path(dir.path()))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }
}
