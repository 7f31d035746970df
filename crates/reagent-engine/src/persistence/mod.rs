//! Persistence Gateway — repository interface with file and document-store
//! backends, both implementing `save`/`get`/`list`/`search`/`delete` over
//! the same `SessionRecord` shape.

pub mod document_repo;
pub mod file_repo;

pub use document_repo::DocumentSessionRepository;
pub use file_repo::FileSessionRepository;

use async_trait::async_trait;
use reagent_core::{Result, SessionRecord};

/// `save`/`get`/`list`/`search`/`delete`, each expressed as a blocking-safe
/// async operation so a caller can await it from a cooperative scheduler
/// without stalling the executor.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn save(&self, record: &SessionRecord) -> Result<()>;
    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>>;
    /// Newest-first by `created_at`.
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<SessionRecord>>;
    async fn search(&self, query_text: &str) -> Result<Vec<SessionRecord>>;
    async fn delete(&self, session_id: &str) -> Result<bool>;
}
