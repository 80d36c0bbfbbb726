//! Per-scope session identity.
//!
//! The identifier is created once per storage scope and never mutated.
//! Nonces share the identifier format but are single-use.

use crate::storage::ScopedStorage;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Storage key holding the session identifier.
pub const SESSION_STORAGE_KEY: &str = "scrybe_session_id";

/// Generate a random version-4 identifier
/// (`xxxxxxxx-xxxx-4xxx-yxxx-xxxxxxxxxxxx`, lower-case, `y` in {8,9,a,b}).
pub fn generate_id() -> String {
    Uuid::new_v4().hyphenated().to_string()
}

/// Whether `id` has the version-4 identifier shape.
pub fn is_valid_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    if bytes.len() != 36 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, &b)| match i {
        8 | 13 | 18 | 23 => b == b'-',
        14 => b == b'4',
        19 => matches!(b, b'8' | b'9' | b'a' | b'b'),
        _ => b.is_ascii_digit() || (b'a'..=b'f').contains(&b),
    })
}

/// Creates, persists and retrieves the session identifier for one scope.
#[derive(Clone)]
pub struct SessionIdentity {
    storage: Arc<dyn ScopedStorage>,
}

impl SessionIdentity {
    pub fn new(storage: Arc<dyn ScopedStorage>) -> Self {
        Self { storage }
    }

    /// A fresh identifier. Nothing is persisted.
    pub fn create(&self) -> String {
        generate_id()
    }

    /// Persist `id`. Returns whether the store accepted it.
    pub fn persist(&self, id: &str) -> bool {
        match self.storage.set(SESSION_STORAGE_KEY, id) {
            Ok(()) => true,
            Err(e) => {
                debug!("Session id not persisted: {}", e);
                false
            }
        }
    }

    /// The stored identifier, or `None` if absent, malformed or inaccessible.
    pub fn retrieve(&self) -> Option<String> {
        match self.storage.get(SESSION_STORAGE_KEY) {
            Ok(Some(id)) if is_valid_id(&id) => Some(id),
            Ok(_) => None,
            Err(e) => {
                debug!("Session id not readable: {}", e);
                None
            }
        }
    }

    /// The stored identifier, creating and persisting one on first use.
    pub fn get_or_create(&self) -> String {
        if let Some(id) = self.retrieve() {
            return id;
        }
        let id = self.create();
        self.persist(&id);
        id
    }

    /// Drop the stored identifier so the next `get_or_create` starts over.
    pub fn reset(&self) {
        if let Err(e) = self.storage.remove(SESSION_STORAGE_KEY) {
            debug!("Session id not removed: {}", e);
        }
    }
}
