#![cfg(feature = "cache")]

use crate::PreviewData;
use dashmap::DashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Resolved previews keyed by the URL they were fetched for.
///
/// Holds at most `capacity` entries; inserting a new URL into a full cache
/// evicts an arbitrary existing one.
#[derive(Clone)]
pub struct Cache {
    entries: Arc<DashMap<String, PreviewData>>,
    capacity: usize,
}

impl Cache {
    /// A zero capacity falls back to 100 entries.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).map_or(100, NonZeroUsize::get);
        Self {
            entries: Arc::new(DashMap::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn get(&self, url: &str) -> Option<PreviewData> {
        self.entries.get(url).map(|entry| entry.clone())
    }

    /// Only previews that carry data are remembered, so a transient
    /// failure does not pin an empty result.
    pub fn set(&self, url: String, value: PreviewData) {
        if !value.has_data() {
            return;
        }
        if !self.entries.contains_key(&url) && self.entries.len() >= self.capacity {
            // The iterator's shard lock must be released before removing.
            let victim = self.entries.iter().next().map(|entry| entry.key().clone());
            if let Some(victim) = victim {
                self.entries.remove(&victim);
            }
        }
        self.entries.insert(url, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_previews_are_not_cached() {
        let cache = Cache::new(0);
        cache.set("https://a.test".into(), PreviewData::default());
        assert!(cache.is_empty());

        let data = PreviewData {
            title: Some("A".into()),
            ..Default::default()
        };
        cache.set("https://a.test".into(), data.clone());
        assert_eq!(cache.get("https://a.test"), Some(data));
    }

    #[test]
    fn capacity_bounds_the_number_of_entries() {
        let cache = Cache::new(2);
        for n in 0..5 {
            let data = PreviewData {
                title: Some(format!("page {n}")),
                ..Default::default()
            };
            cache.set(format!("https://{n}.test"), data);
            assert!(cache.len() <= 2);
        }
        assert_eq!(cache.len(), 2);
        assert!(cache.get("https://4.test").is_some());

        // Overwriting an existing key never evicts.
        let data = PreviewData {
            title: Some("again".into()),
            ..Default::default()
        };
        cache.set("https://4.test".into(), data);
        assert_eq!(cache.len(), 2);
    }
}
