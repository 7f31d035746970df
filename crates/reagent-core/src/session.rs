//! Session identity

use std::sync::{Arc, Mutex, OnceLock};

fn seen_timestamps() -> &'static Mutex<std::collections::HashMap<String, u32>> {
    static SEEN: OnceLock<Mutex<std::collections::HashMap<String, u32>>> = OnceLock::new();
    SEEN.get_or_init(|| Mutex::new(std::collections::HashMap::new()))
}

/// Session identifier — cheaply cloneable, hashable for use as a map key.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct SessionKey(Arc<str>);

impl SessionKey {
    pub fn new(s: impl Into<String>) -> Self {
        Self(Arc::from(s.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generate a new key from the current wall-clock time: `chat_YYYYMMDD_HHMMSS`.
    ///
    /// Collisions within the same second are disambiguated with a `-N` suffix
    /// from a process-wide counter, since the source format alone is not
    /// unique under concurrent creation within the same second.
    pub fn generate(now: chrono::DateTime<chrono::Utc>) -> Self {
        let base = now.format("chat_%Y%m%d_%H%M%S").to_string();
        let mut seen = seen_timestamps().lock().unwrap();
        let count = seen.entry(base.clone()).or_insert(0);
        let n = *count;
        *count += 1;
        if n == 0 {
            Self::new(base)
        } else {
            Self::new(format!("{base}-{n}"))
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SessionKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
