use std::{collections::HashMap, sync::Arc};

use docqa_session::Session;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Live sessions, each behind its own lock so one session's requests run in
/// order while different sessions proceed independently.
#[derive(Debug, Default, Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>>,
}

impl SessionManager {
    pub async fn insert(&self, session: Session) -> Arc<Mutex<Session>> {
        let id = session.id();
        let session = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, Arc::clone(&session));
        session
    }

    /// Insert `session` unless an entry with its id already exists, returning
    /// whichever entry ends up in the map.
    pub async fn get_or_insert(&self, session: Session) -> Arc<Mutex<Session>> {
        let id = session.id();
        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(id).or_insert_with(|| Arc::new(Mutex::new(session))))
    }

    pub async fn get(&self, session_id: Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    /// Whether `session` is still the live entry for `session_id`.
    pub async fn is_current(&self, session_id: Uuid, session: &Arc<Mutex<Session>>) -> bool {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .is_some_and(|live| Arc::ptr_eq(live, session))
    }

    pub async fn remove(&self, session_id: Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.write().await.remove(&session_id)
    }
}

