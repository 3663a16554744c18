use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::math::GridPos;

/// Bounded LRU cache of computed paths, keyed by raw (start, end) pair.
///
/// Lives behind a `Mutex` inside [`super::RoadGraph`]: the graph itself is
/// immutable and shared read-only, so the cache is the single mutable cell
/// and all writes go through that one lock. A rebuilt graph carries a fresh
/// cache, which is what discards stale entries.
pub(super) struct PathCache {
    capacity: usize,
    entries: FxHashMap<(GridPos, GridPos), Vec<GridPos>>,
    order: VecDeque<(GridPos, GridPos)>,
}

impl PathCache {
    pub(super) fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: FxHashMap::default(),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub(super) fn get(&mut self, key: (GridPos, GridPos)) -> Option<Vec<GridPos>> {
        let path = self.entries.get(&key)?.clone();
        // Promote to most-recently-used.
        if let Some(idx) = self.order.iter().position(|k| *k == key) {
            self.order.remove(idx);
            self.order.push_back(key);
        }
        Some(path)
    }

    pub(super) fn insert(&mut self, key: (GridPos, GridPos), path: Vec<GridPos>) {
        if self.entries.insert(key, path).is_some() {
            if let Some(idx) = self.order.iter().position(|k| *k == key) {
                self.order.remove(idx);
            }
        } else if self.entries.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key);
    }

    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: i32) -> (GridPos, GridPos) {
        (GridPos::new(n, 0), GridPos::new(n, 9))
    }

    #[test]
    fn hit_returns_clone_and_promotes() {
        let mut cache = PathCache::new(2);
        cache.insert(key(0), vec![GridPos::new(0, 0)]);
        cache.insert(key(1), vec![GridPos::new(1, 0)]);

        assert_eq!(cache.get(key(0)), Some(vec![GridPos::new(0, 0)]));

        // key(0) was promoted, so key(1) is evicted next.
        cache.insert(key(2), vec![GridPos::new(2, 0)]);
        assert_eq!(cache.get(key(1)), None);
        assert!(cache.get(key(0)).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn capacity_is_bounded() {
        let mut cache = PathCache::new(100);
        for n in 0..250 {
            cache.insert(key(n), vec![GridPos::new(n, 0)]);
        }
        assert_eq!(cache.len(), 100);
        assert!(cache.get(key(249)).is_some());
        assert_eq!(cache.get(key(0)), None);
    }

    #[test]
    fn reinsert_same_key_does_not_grow() {
        let mut cache = PathCache::new(4);
        for _ in 0..10 {
            cache.insert(key(0), vec![GridPos::ZERO]);
        }
        assert_eq!(cache.len(), 1);
    }
}
