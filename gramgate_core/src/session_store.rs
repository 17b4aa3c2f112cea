use crate::credential::Credential;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("persist error: {0}")]
    Persist(String),
}

/// Keyed session -> credential mapping with no cross-session visibility.
///
/// `create` replaces any credential already held for the session, so at most
/// one credential is active per session at a time.
pub trait SessionStore: Send + Sync {
    fn create(&self, session_id: &str, credential: &Credential) -> Result<(), StoreError>;
    fn read(&self, session_id: &str) -> Option<Credential>;
    fn invalidate(&self, session_id: &str);
}

/// A simple in-memory store; the default session backend.
pub struct MemorySessionStore {
    map: std::sync::Mutex<std::collections::HashMap<String, Credential>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            map: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessionStore {
    fn create(&self, session_id: &str, credential: &Credential) -> Result<(), StoreError> {
        self.map
            .lock()
            .map_err(|e| StoreError::Persist(format!("lock poisoned: {}", e)))?
            .insert(session_id.to_string(), credential.clone());
        Ok(())
    }

    fn read(&self, session_id: &str) -> Option<Credential> {
        self.map.lock().ok()?.get(session_id).cloned()
    }

    fn invalidate(&self, session_id: &str) {
        if let Ok(mut map) = self.map.lock() {
            map.remove(session_id);
        }
    }
}
