//! File-backed session repository: one JSON file per session.
//!
//! Every I/O call is wrapped in `tokio::task::spawn_blocking` so the caller
//! can await it without stalling the executor.

use super::SessionRepository;
use async_trait::async_trait;
use reagent_core::{Error, Result, SessionRecord};
use std::path::{Path, PathBuf};

pub struct FileSessionRepository {
    dir: PathBuf,
}

impl FileSessionRepository {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }

    fn read_all(dir: &Path) -> Result<Vec<(PathBuf, std::time::SystemTime)>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                let modified = entry.metadata()?.modified()?;
                entries.push((path, modified));
            }
        }
        Ok(entries)
    }
}

#[async_trait]
impl SessionRepository for FileSessionRepository {
    async fn save(&self, record: &SessionRecord) -> Result<()> {
        let path = self.path_for(&record.session_id);
        let body = serde_json::to_vec_pretty(record)?;
        tokio::task::spawn_blocking(move || -> Result<()> {
            let tmp_path = path.with_extension("json.tmp");
            std::fs::write(&tmp_path, &body)?;
            std::fs::rename(&tmp_path, &path)?;
            Ok(())
        })
        .await
        .map_err(|e| Error::Internal(e.to_string()))?
    }

    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let path = self.path_for(session_id);
        tokio::task::spawn_blocking(move || -> Result<Option<SessionRecord>> {
            if !path.exists() {
                return Ok(None);
            }
            let body = std::fs::read(&path)?;
            Ok(Some(serde_json::from_slice(&body)?))
        })
        .await
        .map_err(|e| Error::Internal(e.to_string()))?
    }

    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<SessionRecord>> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<SessionRecord>> {
            let mut entries = Self::read_all(&dir)?;
            entries.sort_by(|a, b| b.1.cmp(&a.1));
            let mut records = Vec::new();
            for (path, _) in entries.into_iter().skip(offset).take(limit) {
                let body = std::fs::read(&path)?;
                records.push(serde_json::from_slice(&body)?);
            }
            Ok(records)
        })
        .await
        .map_err(|e| Error::Internal(e.to_string()))?
    }

    async fn search(&self, query_text: &str) -> Result<Vec<SessionRecord>> {
        let dir = self.dir.clone();
        let needle = query_text.to_string();
        tokio::task::spawn_blocking(move || -> Result<Vec<SessionRecord>> {
            let mut entries = Self::read_all(&dir)?;
            entries.sort_by(|a, b| b.1.cmp(&a.1));
            let mut matches = Vec::new();
            for (path, _) in entries {
                let body = std::fs::read(&path)?;
                let record: SessionRecord = serde_json::from_slice(&body)?;
                if record.matches(&needle) {
                    matches.push(record);
                }
            }
            Ok(matches)
        })
        .await
        .map_err(|e| Error::Internal(e.to_string()))?
    }

    async fn delete(&self, session_id: &str) -> Result<bool> {
        let path = self.path_for(session_id);
        tokio::task::spawn_blocking(move || -> Result<bool> {
            if path.exists() {
                std::fs::remove_file(&path)?;
                Ok(true)
            } else {
                Ok(false)
            }
        })
        .await
        .map_err(|e| Error::Internal(e.to_string()))?
    }
}
