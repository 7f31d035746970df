//! Background Runner — executes one ReAct run as a long-lived task,
//! independent of any client, bridging `engine.solve_stream` into
//! `SessionManager::add_event` and persisting the final record.

use crate::engine::{ReActEngine, SolveContext};
use crate::session::manager::{SessionKey, SessionManager};
use futures::StreamExt;
use crate::persistence::SessionRepository;
use reagent_core::{Event, EventType, SessionStatus};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};

/// Grace period a completed session remains queryable before
/// `cleanup_old_sessions` would remove it, so late subscribers can still
/// attach and replay the snapshot.
pub fn completion_grace_period() -> chrono::Duration {
    chrono::Duration::seconds(60)
}

/// Run one ReAct session to completion, pushing every emitted event into the
/// session manager and persisting the final record. Does not block the
/// caller — spawn this with `tokio::spawn`.
pub async fn run(
    session_id: SessionKey,
    query: String,
    engine: Arc<ReActEngine>,
    context: SolveContext,
    manager: Arc<SessionManager>,
    repository: Arc<dyn SessionRepository>,
) {
    manager.update_status(&session_id, SessionStatus::Running).await;
    let started = Instant::now();

    let stream = engine.solve_stream(query.clone(), context);
    tokio::pin!(stream);

    let mut failed = false;
    let mut final_answer = None;

    while let Some(event) = stream.next().await {
        if matches!(event.kind, EventType::FinalAnswer) {
            final_answer = event.content.clone();
        }
        if matches!(event.kind, EventType::Error) {
            failed = true;
            manager.set_error(&session_id, event.content.clone().unwrap_or_default()).await;
        }

        if !manager.add_event(&session_id, event).await {
            // Session was explicitly cancelled via cleanup_session — treat
            // as a non-error close and stop feeding it further events.
            return;
        }
    }

    manager.add_event(&session_id, Event::end()).await;
    manager
        .update_status(&session_id, if failed { SessionStatus::Failed } else { SessionStatus::Completed })
        .await;

    if let Some(session) = manager.get_session(&session_id) {
        let events = session.snapshot().await;
        let record = reagent_core::SessionRecord {
            session_id: session_id.as_str().to_string(),
            timestamp: session.created_at,
            query: session.query.clone(),
            events: events.clone(),
            final_answer: final_answer.clone(),
            success: !failed,
            duration_seconds: started.elapsed().as_secs_f64(),
            model: session.model.clone(),
            status: if failed { SessionStatus::Failed } else { SessionStatus::Completed },
            created_at: session.created_at,
            completed_at: Some(chrono::Utc::now()),
            event_count: events.len(),
            error: session.error.read().await.clone(),
        };
        if let Err(e) = repository.save(&record).await {
            warn!(session = %session_id, error = %e, "failed to persist session record");
        }
    } else {
        error!(session = %session_id, "session vanished from the manager before persistence");
    }
}
