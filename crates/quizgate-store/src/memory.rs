//! In-memory store
//!
//! Suitable for tests and for running the host without a data directory.
//! Everything is lost when the process exits.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::{AuditEvent, Store, StoreError, StoreResult};

/// In-memory store backed by a `HashMap`
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    audit: RwLock<Vec<AuditEvent>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.values.read().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let values = self.values.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.values
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.values
            .write()
            .map_err(|_| StoreError::LockPoisoned)?
            .remove(key);
        Ok(())
    }

    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let mut audit = self.audit.write().map_err(|_| StoreError::LockPoisoned)?;
        event.id = audit.len() as i64 + 1;
        audit.push(event);
        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let audit = self.audit.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(audit.iter().rev().take(limit).cloned().collect())
    }

    fn is_healthy(&self) -> bool {
        self.values.read().is_ok() && self.audit.read().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuditEventType;

    #[test]
    fn set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.set("authenticated", "true").unwrap();
        assert_eq!(store.get("authenticated").unwrap().as_deref(), Some("true"));
        assert_eq!(store.len(), 1);

        store.remove("authenticated").unwrap();
        assert!(store.get("authenticated").unwrap().is_none());
    }

    #[test]
    fn audits_newest_first() {
        let store = MemoryStore::new();
        store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStarted))
            .unwrap();
        store
            .append_audit(AuditEvent::new(AuditEventType::ServiceStopped))
            .unwrap();

        let events = store.get_recent_audits(1).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, 2);
        assert_eq!(events[0].event, AuditEventType::ServiceStopped);
    }
}
