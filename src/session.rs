//! Session-scoped Inertia state.
//!
//! The adapter keeps exactly two pieces of state in the host application's
//! session: flash-style validation errors surfaced to the next render as the
//! `errors` prop, and a one-shot clear-history flag. The session backend
//! itself is a collaborator behind [`SessionStore`]; the middleware and the
//! renderer discover it through request extensions and degrade gracefully
//! when none is installed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

/// Session key holding flash validation errors.
pub const ERRORS_KEY: &str = "inertia_errors";

/// Session key holding the one-shot clear-history flag.
pub const CLEAR_HISTORY_KEY: &str = "inertia_clear_history";

/// Minimal get/put/remove boundary over the host session backend.
pub trait SessionStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<Value>;
    /// Write a value.
    fn put(&self, key: &str, value: Value);
    /// Remove a value, returning it if present.
    fn remove(&self, key: &str) -> Option<Value>;
}

/// Typed access to the two Inertia session keys.
#[derive(Clone)]
pub struct InertiaSession {
    store: Arc<dyn SessionStore>,
}

impl InertiaSession {
    /// Wrap a session backend.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Stash validation errors for the next request. Empty maps are ignored.
    pub fn set_errors(&self, errors: &Value) {
        let is_empty = errors.as_object().is_none_or(serde_json::Map::is_empty);
        if !is_empty {
            self.store.put(ERRORS_KEY, errors.clone());
        }
    }

    /// Read flash errors without consuming them.
    #[must_use]
    pub fn errors(&self) -> Option<Value> {
        self.store.get(ERRORS_KEY)
    }

    /// Arm the clear-history flag for the next page.
    pub fn set_clear_history(&self, clear: bool) {
        if clear {
            self.store.put(CLEAR_HISTORY_KEY, Value::Bool(true));
        } else {
            self.store.remove(CLEAR_HISTORY_KEY);
        }
    }

    /// Consume the clear-history flag.
    #[must_use]
    pub fn take_clear_history(&self) -> bool {
        self.store
            .remove(CLEAR_HISTORY_KEY)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    /// Purge both Inertia keys.
    ///
    /// Called by the middleware after a response, except when the response
    /// is a redirect or a version conflict, where the state must survive
    /// into the follow-up request.
    pub fn cleanup(&self) {
        self.store.remove(ERRORS_KEY);
        self.store.remove(CLEAR_HISTORY_KEY);
    }
}

impl std::fmt::Debug for InertiaSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InertiaSession").finish_non_exhaustive()
    }
}

/// In-memory [`SessionStore`] for tests and single-process development.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn put(&self, key: &str, value: Value) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> Option<Value> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }
}
