use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::Mutex as AsyncMutex;

use crate::models::Session;

/// In-memory per-user session store. The outer lock guards only map
/// access; the per-entry async mutex serializes one user's messages while
/// different users proceed independently.
pub struct SessionStore {
    inner: Mutex<HashMap<String, Arc<AsyncMutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, user_id: &str) -> Option<Arc<AsyncMutex<Session>>> {
        let mut map = self.inner.lock().unwrap();
        purge_expired(&mut map);
        map.get(user_id).cloned()
    }

    pub fn put(&self, session: Session) -> Arc<AsyncMutex<Session>> {
        let user_id = session.user_id.clone();
        let entry = Arc::new(AsyncMutex::new(session));
        self.inner.lock().unwrap().insert(user_id, entry.clone());
        entry
    }

    pub fn remove(&self, user_id: &str) {
        self.inner.lock().unwrap().remove(user_id);
    }

    /// Whether `entry` is still the live session for this user. A message
    /// queued behind a terminal transition may hold a removed entry; it
    /// must be treated as having no session at all.
    pub fn is_current(&self, user_id: &str, entry: &Arc<AsyncMutex<Session>>) -> bool {
        self.inner
            .lock()
            .unwrap()
            .get(user_id)
            .map_or(false, |current| Arc::ptr_eq(current, entry))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop idle sessions. Entries currently locked are in use and skipped.
fn purge_expired(map: &mut HashMap<String, Arc<AsyncMutex<Session>>>) {
    let now = Utc::now().naive_utc();
    map.retain(|_, entry| match entry.try_lock() {
        Ok(session) => !session.is_expired(now),
        Err(_) => true,
    });
}
