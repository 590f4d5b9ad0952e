//! Speech synthesis cache configuration.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub cache_ttl: Duration,
    /// Maximum number of cached clips.
    pub cache_capacity: usize,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(172_800),
            cache_capacity: 512,
        }
    }
}
