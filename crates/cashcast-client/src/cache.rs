use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::settings::EngineSettings;

/// TTL cache for read-command payloads.
///
/// Keys are scoped by organization (`projections:{org}:...`) so a write can
/// drop every cached view of that organization with one prefix.
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, Value)>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(settings: &EngineSettings) -> Self {
        Self::new(Duration::from_secs(settings.cache_ttl_seconds))
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.lock();
        let expired = entries.get(key)?.0.elapsed() > self.ttl;
        if expired {
            entries.remove(key);
            return None;
        }
        tracing::debug!(key, "response cache hit");
        entries.get(key).map(|(_, value)| value.clone())
    }

    pub fn put(&self, key: &str, value: Value) {
        self.lock()
            .insert(key.to_string(), (Instant::now(), value));
    }

    /// Drops every entry whose key starts with `prefix`; returns how many.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, (Instant, Value)>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

pub fn projections_prefix(organization_id: &str) -> String {
    format!("projections:{organization_id}:")
}
