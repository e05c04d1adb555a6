//! Store trait definitions

use crate::{AuditEvent, StoreResult};

/// Main store trait.
///
/// The key-value half mirrors browser local storage: string values, and an
/// absent key is a valid state.
pub trait Store: Send + Sync {
    // Key-value storage

    /// Read a value
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a value; removing an absent key is not an error
    fn remove(&self, key: &str) -> StoreResult<()>;

    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
