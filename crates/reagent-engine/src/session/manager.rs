//! Session Manager — lifecycle of concurrent sessions and fan-out of events
//! to subscribers.

use async_stream::stream;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::Stream;
use reagent_core::{Event, SessionStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::warn;

pub use reagent_core::SessionKey;

/// One tracked session: metadata plus its append-only event log and the
/// live subscriber queues attached to it.
pub struct ManagedSession {
    pub session_id: SessionKey,
    pub query: String,
    pub model: String,
    pub status: RwLock<SessionStatus>,
    pub created_at: DateTime<Utc>,
    pub completed_at: RwLock<Option<DateTime<Utc>>>,
    pub error: RwLock<Option<String>>,
    events: RwLock<Vec<Event>>,
    subscribers: RwLock<Vec<mpsc::UnboundedSender<Event>>>,
    subscriber_count: AtomicUsize,
}

impl ManagedSession {
    fn new(session_id: SessionKey, query: String, model: String) -> Self {
        Self {
            session_id,
            query,
            model,
            status: RwLock::new(SessionStatus::Created),
            created_at: Utc::now(),
            completed_at: RwLock::new(None),
            error: RwLock::new(None),
            events: RwLock::new(Vec::new()),
            subscribers: RwLock::new(Vec::new()),
            subscriber_count: AtomicUsize::new(0),
        }
    }

    pub async fn snapshot(&self) -> Vec<Event> {
        self.events.read().await.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::SeqCst)
    }
}

/// One process-wide instance tracking every live (and recently-completed)
/// session.
pub struct SessionManager {
    sessions: DashMap<SessionKey, Arc<ManagedSession>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Generate a `session_id` from wall-clock, create the session with
    /// `Created` status and no subscribers.
    pub fn create_session(&self, query: impl Into<String>, model: impl Into<String>) -> Arc<ManagedSession> {
        let session_id = SessionKey::generate(Utc::now());
        let session = Arc::new(ManagedSession::new(session_id.clone(), query.into(), model.into()));
        self.sessions.insert(session_id, session.clone());
        session
    }

    pub fn get_session(&self, id: &SessionKey) -> Option<Arc<ManagedSession>> {
        self.sessions.get(id).map(|s| s.clone())
    }

    /// Newest-first by `created_at`.
    pub fn list_sessions(&self, limit: usize, offset: usize) -> Vec<Arc<ManagedSession>> {
        let mut sessions: Vec<Arc<ManagedSession>> = self.sessions.iter().map(|e| e.value().clone()).collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        sessions.into_iter().skip(offset).take(limit).collect()
    }

    /// Append the event to the session's log, then broadcast it to every
    /// subscriber queue with a non-blocking send; a full or closed queue
    /// drops the event for that subscriber (logged) but never blocks the
    /// broadcaster.
    ///
    /// Returns `false` if the session no longer exists — the Background
    /// Runner uses this to discover an explicit `cleanup_session` and stop.
    pub async fn add_event(&self, id: &SessionKey, event: Event) -> bool {
        let Some(session) = self.get_session(id) else {
            return false;
        };
        session.events.write().await.push(event.clone());

        let mut subscribers = session.subscribers.write().await;
        subscribers.retain(|tx| match tx.send(event.clone()) {
            Ok(()) => true,
            Err(_) => {
                warn!(session = %id, "dropping event for a closed subscriber queue");
                false
            }
        });
        true
    }

    pub async fn update_status(&self, id: &SessionKey, status: SessionStatus) {
        let Some(session) = self.get_session(id) else {
            return;
        };
        *session.status.write().await = status;
        if matches!(status, SessionStatus::Completed | SessionStatus::Failed) {
            *session.completed_at.write().await = Some(Utc::now());
        }
    }

    pub async fn set_error(&self, id: &SessionKey, error: impl Into<String>) {
        if let Some(session) = self.get_session(id) {
            *session.error.write().await = Some(error.into());
        }
    }

    /// Subscribe to a session's event stream: replay the snapshot already
    /// recorded, then yield newly arriving events until the session is
    /// removed from the manager or the subscriber drops the stream.
    pub fn subscribe(&self, id: &SessionKey) -> impl Stream<Item = Event> {
        let session = self.get_session(id);
        stream! {
            let Some(session) = session else { return; };

            // Register the subscriber queue before reading the snapshot, holding
            // the events lock across both so no `add_event` can land in between:
            // `add_event` takes the events lock first too, so it either finishes
            // appending (and the event is in our snapshot) before we register, or
            // it blocks on our held lock until we've registered `tx` (and the
            // event reaches us via the channel instead). Either way, exactly once.
            let (tx, mut rx) = mpsc::unbounded_channel();
            let snapshot = {
                let events = session.events.write().await;
                session.subscribers.write().await.push(tx);
                session.subscriber_count.fetch_add(1, Ordering::SeqCst);
                events.clone()
            };

            for event in snapshot {
                yield event;
            }

            while let Some(event) = rx.recv().await {
                yield event;
            }

            session.subscriber_count.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Transition to `Completed` and drop the session from the manager.
    /// Persistence is the caller's responsibility (it has the repository).
    pub fn cleanup_session(&self, id: &SessionKey) -> Option<Arc<ManagedSession>> {
        self.sessions.remove(id).map(|(_, s)| s)
    }

    /// Remove every `Completed` session whose `completed_at` is older than
    /// `max_age`.
    pub async fn cleanup_old_sessions(&self, max_age: chrono::Duration) -> Vec<SessionKey> {
        let cutoff = Utc::now() - max_age;
        let mut expired = Vec::new();
        for entry in self.sessions.iter() {
            let session = entry.value();
            let status = *session.status.read().await;
            if status != SessionStatus::Completed {
                continue;
            }
            if let Some(completed_at) = *session.completed_at.read().await {
                if completed_at < cutoff {
                    expired.push(session.session_id.clone());
                }
            }
        }
        for id in &expired {
            self.sessions.remove(id);
        }
        expired
    }
}
