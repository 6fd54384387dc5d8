use lru::LruCache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Result;
use crate::llm::{CompletionOptions, LlmProvider};

/// Thread-safe LRU cache for model completions
///
/// Keys are hashes of the model name, system prompt and user prompt, so the
/// same question asked of a different model is a miss. A capacity of zero
/// disables caching.
#[derive(Clone)]
pub struct CompletionCache {
    cache: Option<Arc<Mutex<LruCache<String, String>>>>,
}

impl CompletionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: NonZeroUsize::new(capacity).map(|cap| Arc::new(Mutex::new(LruCache::new(cap)))),
        }
    }

    pub fn disabled() -> Self {
        Self { cache: None }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let cache = self.cache.as_ref()?;
        let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(key).cloned()
    }

    /// Store a completion. If the cache is at capacity, the least recently
    /// used entry is evicted.
    pub fn put(&self, key: String, value: String) {
        if let Some(cache) = self.cache.as_ref() {
            let mut cache = cache.lock().unwrap_or_else(PoisonError::into_inner);
            cache.put(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.cache
            .as_ref()
            .map(|c| c.lock().unwrap_or_else(PoisonError::into_inner).len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stable hex key for one completion request.
    pub fn generate_key(&self, model: &str, system_prompt: &str, prompt: &str) -> String {
        let mut hasher = DefaultHasher::new();
        model.hash(&mut hasher);
        system_prompt.hash(&mut hasher);
        prompt.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }
}

/// Complete `prompt` through `provider`, answering from `cache` when the same
/// request was made before. Only successful completions are stored.
pub async fn cached_complete(
    provider: &LlmProvider,
    cache: &CompletionCache,
    system_prompt: &str,
    prompt: &str,
    options: &CompletionOptions,
) -> Result<String> {
    let model = provider.config().map(|c| c.model.as_str()).unwrap_or_default();
    let key = cache.generate_key(model, system_prompt, prompt);

    if let Some(hit) = cache.get(&key) {
        tracing::debug!(model, "Model completion served from cache");
        return Ok(hit);
    }

    let completion = provider
        .complete(prompt, Some(system_prompt), Some(options))
        .await?;
    cache.put(key, completion.clone());
    Ok(completion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_cache_hit_after_put() {
        let cache = CompletionCache::new(10);
        let key = cache.generate_key("m", "sys", "vitamin D");
        cache.put(key.clone(), "cholecalciferol".to_string());
        assert_eq!(cache.get(&key), Some("cholecalciferol".to_string()));
    }

    #[test]
    fn test_cache_miss() {
        let cache = CompletionCache::new(10);
        assert_eq!(cache.get("nonexistent_key"), None);
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let cache = CompletionCache::new(0);
        cache.put("k".to_string(), "v".to_string());
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_key_depends_on_model() {
        let cache = CompletionCache::new(10);
        assert_eq!(
            cache.generate_key("a", "s", "p"),
            cache.generate_key("a", "s", "p")
        );
        assert_ne!(
            cache.generate_key("a", "s", "p"),
            cache.generate_key("b", "s", "p")
        );
    }

    #[test]
    fn test_lru_ordering() {
        let cache = CompletionCache::new(2);
        cache.put("k1".to_string(), "v1".to_string());
        cache.put("k2".to_string(), "v2".to_string());
        let _ = cache.get("k1");
        cache.put("k3".to_string(), "v3".to_string());

        assert_eq!(cache.get("k1"), Some("v1".to_string()));
        assert_eq!(cache.get("k2"), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = CompletionCache::new(100);
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let cache = cache.clone();
                thread::spawn(move || {
                    let key = cache.generate_key("m", "", &format!("concept_{i}"));
                    cache.put(key.clone(), format!("terms_{i}"));
                    assert_eq!(cache.get(&key), Some(format!("terms_{i}")));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
