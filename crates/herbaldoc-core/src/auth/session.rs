use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::store::{KeyValueStore, MemoryStore};

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "authToken";

/// Storage key for the cached user record (JSON text)
pub const USER_DATA_KEY: &str = "userData";

/// Auth token plus cached user record, persisted in a key-value store.
///
/// Storage failures are logged and reported as `false`/`None`; nothing here
/// returns an error. The user record is only visible while a token is stored,
/// and the two are only ever removed together by [`Session::clear_all`].
///
/// Clone is cheap and clones share the same store.
#[derive(Clone)]
pub struct Session {
    store: Arc<dyn KeyValueStore>,
}

impl Session {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    pub fn from_shared(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// A session that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    pub fn get_token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Error getting token");
                None
            }
        }
    }

    pub fn set_token(&self, token: &str) -> bool {
        match self.store.set(TOKEN_KEY, token) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Error setting token");
                false
            }
        }
    }

    pub fn get_user_data(&self) -> Option<Value> {
        self.get_token()?;

        let raw = match self.store.get(USER_DATA_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Error getting user data");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "Stored user data is not valid JSON");
                None
            }
        }
    }

    pub fn set_user_data(&self, record: &Value) -> bool {
        let result = serde_json::to_string(record)
            .map_err(anyhow::Error::from)
            .and_then(|raw| self.store.set(USER_DATA_KEY, &raw));
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Error setting user data");
                false
            }
        }
    }

    /// Remove token and user record. Both removals are attempted even if the
    /// first fails.
    pub fn clear_all(&self) -> bool {
        let mut ok = true;
        for key in [TOKEN_KEY, USER_DATA_KEY] {
            if let Err(e) = self.store.remove(key) {
                warn!(error = %e, key, "Error clearing storage");
                ok = false;
            }
        }
        debug!(ok, "Session cleared");
        ok
    }

    pub fn is_authenticated(&self) -> bool {
        self.get_token().is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}
