//! Bounded TTL cache for synthesized speech, keyed by the exact input text.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::RwLock;

use crate::config::SpeechConfig;

struct Entry {
    audio: Bytes,
    inserted_at: Instant,
}

struct CacheState {
    entries: HashMap<String, Entry>,
    ttl: Duration,
    capacity: usize,
}

impl CacheState {
    fn is_fresh(&self, entry: &Entry, now: Instant) -> bool {
        now.duration_since(entry.inserted_at) < self.ttl
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.inserted_at)
            .map(|(text, _)| text.clone());
        if let Some(text) = oldest {
            self.entries.remove(&text);
        }
    }
}

pub struct SpeechCache {
    state: RwLock<CacheState>,
}

impl SpeechCache {
    pub fn new(config: &SpeechConfig) -> Self {
        Self {
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                ttl: config.cache_ttl,
                capacity: config.cache_capacity,
            }),
        }
    }

    pub async fn get(&self, text: &str) -> Option<Bytes> {
        self.get_at(text, Instant::now()).await
    }

    pub async fn insert(&self, text: String, audio: Bytes) {
        self.insert_at(text, audio, Instant::now()).await
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Apply new limits. Entries over the new capacity are evicted oldest
    /// first.
    pub async fn reconfigure(&self, config: &SpeechConfig) {
        let mut state = self.state.write().await;
        state.ttl = config.cache_ttl;
        state.capacity = config.cache_capacity;
        while state.entries.len() > state.capacity {
            state.evict_oldest();
        }
    }

    async fn get_at(&self, text: &str, now: Instant) -> Option<Bytes> {
        let state = self.state.read().await;
        let entry = state.entries.get(text)?;
        state.is_fresh(entry, now).then(|| entry.audio.clone())
    }

    async fn insert_at(&self, text: String, audio: Bytes, now: Instant) {
        let mut state = self.state.write().await;
        if state.capacity == 0 {
            return;
        }
        let ttl = state.ttl;
        state
            .entries
            .retain(|_, entry| now.duration_since(entry.inserted_at) < ttl);
        if !state.entries.contains_key(&text) && state.entries.len() >= state.capacity {
            state.evict_oldest();
        }
        state.entries.insert(
            text,
            Entry {
                audio,
                inserted_at: now,
            },
        );
    }
}
