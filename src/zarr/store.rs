use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use futures::future::BoxFuture;
use futures::FutureExt;
use crate::error::{Result, ViewerError};
/// `Ok(None)` means the key does not exist in the store.
pub type StoreFuture<'a> = BoxFuture<'a, Result<Option<Vec<u8>>>>;
/// Key/value view of a Zarr hierarchy. Keys are relative paths such as
/// `probe/.zgroup` or `templates_array/5.0.0`.
pub trait ArrayStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a>;
    /// Human readable location, used in log lines.
    fn location(&self) -> String;
}
/// In-memory store useful for tests and deterministic playback.
#[derive(Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
    failing: HashSet<String>,
    stalled: HashSet<String>,
    latency: Option<Duration>,
    requests: Mutex<HashMap<String, usize>>,
}
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.entries.insert(key.into(), value.into());
    }
    pub fn insert_json(&mut self, key: impl Into<String>, value: &serde_json::Value) {
        self.insert(key, value.to_string().into_bytes());
    }
    pub fn remove(&mut self, key: &str) -> Option<Vec<u8>> {
        self.entries.remove(key)
    }
    /// Every read of `key` fails with a fetch error.
    pub fn fail_key(&mut self, key: impl Into<String>) {
        self.failing.insert(key.into());
    }
    /// Reads of `key` never complete.
    pub fn stall_key(&mut self, key: impl Into<String>) {
        self.stalled.insert(key.into());
    }
    /// Delay applied before every read completes.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
    /// Number of reads issued for `key` so far.
    pub fn request_count(&self, key: &str) -> usize {
        self.requests
            .lock()
            .map(|r| r.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }
    pub fn total_requests(&self) -> usize {
        self.requests.lock().map(|r| r.values().sum()).unwrap_or(0)
    }
}
impl ArrayStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a> {
        async move {
            if let Ok(mut requests) = self.requests.lock() {
                *requests.entry(key.to_string()).or_insert(0) += 1;
            }
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            if self.stalled.contains(key) {
                futures::future::pending::<()>().await;
            }
            if self.failing.contains(key) {
                return Err(ViewerError::fetch(key, "injected failure"));
            }
            Ok(self.entries.get(key).cloned())
        }
        .boxed()
    }
    fn location(&self) -> String {
        format!("memory ({} keys)", self.entries.len())
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    #[tokio::test]
    async fn missing_keys_are_none_and_counted() {
        let mut store = MemoryStore::new();
        store.insert(".zgroup", b"{}".to_vec());
        assert_eq!(store.get(".zgroup").await.unwrap(), Some(b"{}".to_vec()));
        assert_eq!(store.get("nope").await.unwrap(), None);
        assert_eq!(store.request_count(".zgroup"), 1);
        assert_eq!(store.total_requests(), 2);
    }
    #[tokio::test]
    async fn injected_failures_surface_as_fetch_errors() {
        let mut store = MemoryStore::new();
        store.insert("a/0", vec![0u8; 4]);
        store.fail_key("a/0");
        let err = store.get("a/0").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);
    }
}
