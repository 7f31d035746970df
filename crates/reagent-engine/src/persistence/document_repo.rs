//! Document-store session repository.
//!
//! Indexed by `session_id` (unique) with `created_at`-descending listing,
//! backed by an in-process `DashMap` standing in for a real document-store
//! client. The interface is identical to the file backend either way, so
//! the two are interchangeable at the call site.

use super::SessionRepository;
use async_trait::async_trait;
use dashmap::DashMap;
use reagent_core::{Result, SessionRecord};

/// Keyed by `session_id`, the one "unique index" this store needs.
pub struct DocumentSessionRepository {
    documents: DashMap<String, SessionRecord>,
}

impl Default for DocumentSessionRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSessionRepository {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }
}

#[async_trait]
impl SessionRepository for DocumentSessionRepository {
    async fn save(&self, record: &SessionRecord) -> Result<()> {
        self.documents.insert(record.session_id.clone(), record.clone());
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        Ok(self.documents.get(session_id).map(|r| r.clone()))
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<SessionRecord>> {
        let mut records: Vec<SessionRecord> = self.documents.iter().map(|e| e.value().clone()).collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records.into_iter().skip(offset).take(limit).collect())
    }

    async fn search(&self, query_text: &str) -> Result<Vec<SessionRecord>> {
        let mut matches: Vec<SessionRecord> = self
            .documents
            .iter()
            .map(|e| e.value().clone())
            .filter(|r| r.matches(query_text))
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }

    async fn delete(&self, session_id: &str) -> Result<bool> {
        Ok(self.documents.remove(session_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reagent_core::SessionStatus;

    fn sample_record(id: &str, query: &str) -> SessionRecord {
        SessionRecord {
            session_id: id.to_string(),
            timestamp: Utc::now(),
            query: query.to_string(),
            events: vec![],
            final_answer: None,
            success: true,
            duration_seconds: 0.1,
            model: "gemini-2.5-flash".to_string(),
            status: SessionStatus::Completed,
            created_at: Utc::now(),
            completed_at: Some(Utc::now()),
            event_count: 0,
            error: None,
        }
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let repo = DocumentSessionRepository::new();
        repo.save(&sample_record("chat_a", "hello")).await.unwrap();
        let fetched = repo.get("chat_a").await.unwrap().unwrap();
        assert_eq!(fetched.query, "hello");
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let repo = DocumentSessionRepository::new();
        let mut older = sample_record("chat_a", "first");
        older.created_at = Utc::now() - chrono::Duration::seconds(10);
        repo.save(&older).await.unwrap();
        repo.save(&sample_record("chat_b", "second")).await.unwrap();
        let listed = repo.list(10, 0).await.unwrap();
        assert_eq!(listed[0].session_id, "chat_b");
    }
}
