//! Session record over the well-known store keys

use chrono::{DateTime, Local};
use quizgate_util::{parse_epoch_millis, to_epoch_millis};
use tracing::warn;

use crate::{Store, StoreResult};

pub const KEY_AUTHENTICATED: &str = "authenticated";
pub const KEY_LOGIN_TIME: &str = "loginTime";
pub const KEY_LAST_ACTIVITY: &str = "lastActivity";
pub const KEY_USERNAME: &str = "username";

/// Every key that belongs to a session
pub const SESSION_KEYS: [&str; 4] = [
    KEY_AUTHENTICATED,
    KEY_LOGIN_TIME,
    KEY_LAST_ACTIVITY,
    KEY_USERNAME,
];

/// Decoded session record.
///
/// Timestamps that are present but corrupt decode to `None`, the same as
/// absent ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionRecord {
    pub authenticated: bool,
    pub login_time: Option<DateTime<Local>>,
    pub last_activity: Option<DateTime<Local>>,
    pub username: Option<String>,
}

impl SessionRecord {
    /// A freshly opened session
    pub fn opened(username: impl Into<String>, now: DateTime<Local>) -> Self {
        Self {
            authenticated: true,
            login_time: Some(now),
            last_activity: Some(now),
            username: Some(username.into()),
        }
    }

    /// Read the record as currently persisted
    pub fn load(store: &dyn Store) -> StoreResult<Self> {
        let authenticated = store.get(KEY_AUTHENTICATED)?.as_deref() == Some("true");
        let login_time = store
            .get(KEY_LOGIN_TIME)?
            .and_then(|raw| parse_epoch_millis(&raw));
        let last_activity = store
            .get(KEY_LAST_ACTIVITY)?
            .and_then(|raw| parse_epoch_millis(&raw));
        let username = store.get(KEY_USERNAME)?;

        Ok(Self {
            authenticated,
            login_time,
            last_activity,
            username,
        })
    }

    /// Write every present field
    pub fn save(&self, store: &dyn Store) -> StoreResult<()> {
        if self.authenticated {
            store.set(KEY_AUTHENTICATED, "true")?;
        } else {
            store.remove(KEY_AUTHENTICATED)?;
        }
        if let Some(login_time) = &self.login_time {
            store.set(KEY_LOGIN_TIME, &to_epoch_millis(login_time))?;
        }
        if let Some(last_activity) = &self.last_activity {
            store.set(KEY_LAST_ACTIVITY, &to_epoch_millis(last_activity))?;
        }
        if let Some(username) = &self.username {
            store.set(KEY_USERNAME, username)?;
        }
        Ok(())
    }

    /// Remove every session key.
    ///
    /// Keeps going past failures so one bad key cannot leave the rest behind;
    /// the first error is returned.
    pub fn clear(store: &dyn Store) -> StoreResult<()> {
        let mut first_error = None;
        for key in SESSION_KEYS {
            if let Err(e) = store.remove(key) {
                warn!(key, error = %e, "Failed to remove session key");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Persist a new login timestamp
pub fn store_login_time(store: &dyn Store, at: &DateTime<Local>) -> StoreResult<()> {
    store.set(KEY_LOGIN_TIME, &to_epoch_millis(at))
}

/// Persist a new last-activity timestamp
pub fn store_last_activity(store: &dyn Store, at: &DateTime<Local>) -> StoreResult<()> {
    store.set(KEY_LAST_ACTIVITY, &to_epoch_millis(at))
}
