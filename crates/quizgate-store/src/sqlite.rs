//! SQLite-based store implementation

use chrono::{DateTime, Local};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{AuditEvent, AuditEventType, Store, StoreError, StoreResult};

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Local-storage style key-value pairs
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

impl Store for SqliteStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.conn()?;

        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| row.get(0))
            .optional()?;

        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO kv (key, value)
            VALUES (?, ?)
            ON CONFLICT(key)
            DO UPDATE SET value = excluded.value
            "#,
            params![key, value],
        )?;

        debug!(key, "Value stored");
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM kv WHERE key = ?", [key])?;
        Ok(())
    }

    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.conn()?;
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.to_rfc3339(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Local))
                .unwrap_or_else(|_| quizgate_util::now());
            let event: AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_store() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.is_healthy());
    }

    #[test]
    fn test_key_value() {
        let store = SqliteStore::in_memory().unwrap();

        assert!(store.get("username").unwrap().is_none());

        store.set("username", "alice").unwrap();
        assert_eq!(store.get("username").unwrap().as_deref(), Some("alice"));

        // Overwrite
        store.set("username", "bob").unwrap();
        assert_eq!(store.get("username").unwrap().as_deref(), Some("bob"));

        store.remove("username").unwrap();
        assert!(store.get("username").unwrap().is_none());

        // Removing again is fine
        store.remove("username").unwrap();
    }

    #[test]
    fn test_audit_log() {
        let store = SqliteStore::in_memory().unwrap();

        store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStarted))
            .unwrap();
        store
            .append_audit(AuditEvent::new(AuditEventType::LoginSucceeded {
                username: "alice".into(),
            }))
            .unwrap();

        let events = store.get_recent_audits(10).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0].event, AuditEventType::LoginSucceeded { .. }));
        assert!(matches!(events[1].event, AuditEventType::ServiceStarted));
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quizgate.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.set("loginTime", "1700000000000").unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get("loginTime").unwrap().as_deref(), Some("1700000000000"));
    }
}
