use crate::core::geo::TileCoord;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Hit/miss counters for a tile cache layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

/// In-process tile cache using LRU eviction.
///
/// Sits in front of the disk store so a long-running service does not
/// re-read the same tiles for every report. Clones share one cache.
#[derive(Debug, Clone)]
pub struct MemoryTileCache {
    cache: Arc<Mutex<LruCache<TileCoord, Arc<Vec<u8>>>>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl MemoryTileCache {
    /// Creates a cache holding up to `capacity` tiles; `None` when capacity is zero.
    pub fn new(capacity: usize) -> Option<Self> {
        let capacity = NonZeroUsize::new(capacity)?;
        Some(Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Get a tile from the cache
    pub fn get(&self, coord: &TileCoord) -> Option<Arc<Vec<u8>>> {
        let found = self.cache.lock().ok()?.get(coord).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Insert a tile into the cache
    pub fn put(&self, coord: TileCoord, data: Arc<Vec<u8>>) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(coord, data);
        }
    }

    pub fn contains(&self, coord: &TileCoord) -> bool {
        self.cache
            .lock()
            .map(|cache| cache.contains(coord))
            .unwrap_or(false)
    }

    pub fn remove(&self, coord: &TileCoord) -> Option<Arc<Vec<u8>>> {
        self.cache.lock().ok()?.pop(coord)
    }

    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.cache.lock().map(|cache| cache.cap().get()).unwrap_or(0)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_disables_cache() {
        assert!(MemoryTileCache::new(0).is_none());
    }

    #[test]
    fn test_basic_operations() {
        let cache = MemoryTileCache::new(2).unwrap();
        let coord = TileCoord::new(1, 2, 3);

        assert!(cache.is_empty());
        assert!(cache.get(&coord).is_none());

        cache.put(coord, Arc::new(vec![1, 2, 3]));
        assert!(cache.contains(&coord));
        assert_eq!(*cache.get(&coord).unwrap(), vec![1, 2, 3]);

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));

        assert!(cache.remove(&coord).is_some());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_lru_eviction() {
        let cache = MemoryTileCache::new(2).unwrap();
        let coord1 = TileCoord::new(1, 1, 1);
        let coord2 = TileCoord::new(2, 2, 2);
        let coord3 = TileCoord::new(3, 3, 3);

        cache.put(coord1, Arc::new(vec![1]));
        cache.put(coord2, Arc::new(vec![2]));
        cache.put(coord3, Arc::new(vec![3]));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.capacity(), 2);
        assert!(!cache.contains(&coord1));
        assert!(cache.contains(&coord2));
        assert!(cache.contains(&coord3));
    }

    #[test]
    fn test_clones_share_storage() {
        let cache = MemoryTileCache::new(4).unwrap();
        let other = cache.clone();
        other.put(TileCoord::new(0, 0, 0), Arc::new(vec![9]));

        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(other.is_empty());
    }
}
