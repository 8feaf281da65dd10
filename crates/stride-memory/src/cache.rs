//! Transient TTL key-value caches.
//!
//! The conversation context and the wizard drafts both live behind the
//! same [`KvCache`] abstraction: string keys, string values, per-write
//! TTL. [`MemoryCache`] is the in-process implementation; entries expire
//! lazily on read.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use stride_core::marker::MessageRef;

/// Generic TTL key-value store.
#[async_trait]
pub trait KvCache: Send + Sync {
    /// Insert or replace a value. The TTL restarts on every write.
    async fn put(&self, key: &str, value: String, ttl: Duration);

    /// Fetch a value if present and not expired.
    async fn get(&self, key: &str) -> Option<String>;

    async fn delete(&self, key: &str);
}

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process [`KvCache`] backed by a mutexed map.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every expired entry. Called opportunistically on writes so the
    /// map does not grow without bound.
    fn purge_expired(entries: &mut HashMap<String, Entry>) {
        let now = Instant::now();
        entries.retain(|_, e| e.expires_at > now);
    }
}

#[async_trait]
impl KvCache for MemoryCache {
    async fn put(&self, key: &str, value: String, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Self::purge_expired(&mut entries);
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    async fn delete(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
    }
}

/// Typed, chat-keyed view over a [`KvCache`] for wizard drafts.
///
/// Values that fail to deserialize read back as absent, so a schema change
/// never wedges a chat.
pub struct DraftCache<T> {
    cache: Arc<dyn KvCache>,
    prefix: &'static str,
    ttl: Duration,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> DraftCache<T> {
    pub fn new(cache: Arc<dyn KvCache>, prefix: &'static str, ttl: Duration) -> Self {
        Self {
            cache,
            prefix,
            ttl,
            _marker: std::marker::PhantomData,
        }
    }

    fn key(&self, chat_id: i64) -> String {
        format!("{}{}", self.prefix, chat_id)
    }

    pub async fn get(&self, chat_id: i64) -> Option<T> {
        let raw = self.cache.get(&self.key(chat_id)).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!("Discarding undecodable draft for chat {chat_id}: {err}");
                None
            }
        }
    }

    pub async fn put(&self, chat_id: i64, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.cache.put(&self.key(chat_id), raw, self.ttl).await,
            Err(err) => tracing::error!("Failed to encode draft for chat {chat_id}: {err}"),
        }
    }

    pub async fn delete(&self, chat_id: i64) {
        self.cache.delete(&self.key(chat_id)).await;
    }
}

/// Per-chat record of the bot's last sent message and its marker.
pub struct ContextStore {
    inner: DraftCache<MessageRef>,
}

impl ContextStore {
    pub fn new(cache: Arc<dyn KvCache>, retention: Duration) -> Self {
        Self {
            inner: DraftCache::new(cache, "last-message:", retention),
        }
    }

    pub async fn get(&self, chat_id: i64) -> Option<MessageRef> {
        self.inner.get(chat_id).await
    }

    pub async fn put(&self, chat_id: i64, meta: &MessageRef) {
        self.inner.put(chat_id, meta).await;
    }

    pub async fn delete(&self, chat_id: i64) {
        self.inner.delete(chat_id).await;
    }
}

/// Cache key prefix for in-flight task drafts.
pub const PENDING_TASK_PREFIX: &str = "pending-task:";
/// Cache key prefix for in-flight habit drafts.
pub const PENDING_HABIT_PREFIX: &str = "pending-habit:";

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stride_core::draft::TaskDraft;
    use stride_core::marker::Marker;

    #[tokio::test]
    async fn test_put_get_delete() {
        let cache = MemoryCache::new();
        cache
            .put("k", "v".into(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
        cache.delete("k").await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_is_absent() {
        let cache = MemoryCache::new();
        cache
            .put("k", "v".into(), Duration::from_millis(10))
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_rewrite_restarts_ttl() {
        let cache = MemoryCache::new();
        cache
            .put("k", "v1".into(), Duration::from_millis(20))
            .await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache
            .put("k", "v2".into(), Duration::from_millis(50))
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn test_draft_cache_typed_roundtrip() {
        let cache: Arc<dyn KvCache> = Arc::new(MemoryCache::new());
        let drafts: DraftCache<TaskDraft> =
            DraftCache::new(cache, PENDING_TASK_PREFIX, Duration::from_secs(60));

        assert!(drafts.get(7).await.is_none());
        let draft = TaskDraft::placeholder().with_title("Write tests");
        drafts.put(7, &draft).await;
        assert_eq!(drafts.get(7).await, Some(draft));
        drafts.delete(7).await;
        assert!(drafts.get(7).await.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_draft_reads_as_absent() {
        let cache: Arc<dyn KvCache> = Arc::new(MemoryCache::new());
        cache
            .put("pending-task:7", "{not json".into(), Duration::from_secs(60))
            .await;
        let drafts: DraftCache<TaskDraft> =
            DraftCache::new(cache, PENDING_TASK_PREFIX, Duration::from_secs(60));
        assert!(drafts.get(7).await.is_none());
    }

    #[tokio::test]
    async fn test_context_store_keys_by_chat() {
        let cache: Arc<dyn KvCache> = Arc::new(MemoryCache::new());
        let ctx = ContextStore::new(cache, Duration::from_secs(60));
        let meta = MessageRef {
            message_id: "mid.1".into(),
            seq: 1,
            sent_at: Utc::now(),
            marker: Some(Marker::CreateTask),
        };
        ctx.put(1, &meta).await;
        assert_eq!(ctx.get(1).await, Some(meta));
        assert_eq!(ctx.get(2).await, None);
    }
}
