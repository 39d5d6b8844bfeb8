//! # Cache LRU
//!
//! Cache de capacidade fixa com despejo do item usado há mais tempo. Os itens
//! nunca expiram por tempo, apenas por pressão de capacidade.
//!
//! Cada acesso recebe um "tick" crescente; um `BTreeMap<tick, chave>` mantém a
//! ordem de uso, então inserção, acesso e despejo custam `O(log n)`.

use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct LruCache<V> {
    capacity: usize,
    tick: u64,
    entries: HashMap<String, (V, u64)>,
    order: BTreeMap<u64, String>,
}

impl<V: Clone> LruCache<V> {
    /// Capacidade zero desliga o cache (nada é guardado).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tick: 0,
            entries: HashMap::new(),
            order: BTreeMap::new(),
        }
    }

    /// Busca e marca a chave como usada recentemente.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let next = self.next_tick();
        let (value, tick) = self.entries.get_mut(key)?;
        let previous = std::mem::replace(tick, next);
        let value = value.clone();
        self.order.remove(&previous);
        self.order.insert(next, key.to_string());
        Some(value)
    }

    /// Busca sem alterar a ordem de uso.
    pub fn peek(&self, key: &str) -> Option<&V> {
        self.entries.get(key).map(|(value, _)| value)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        if self.capacity == 0 {
            return;
        }
        let key = key.into();
        let tick = self.next_tick();
        if let Some((_, previous)) = self.entries.insert(key.clone(), (value, tick)) {
            self.order.remove(&previous);
        }
        self.order.insert(tick, key);

        while self.entries.len() > self.capacity {
            let Some((_, oldest)) = self.order.pop_first() else { break };
            self.entries.remove(&oldest);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_least_recently_used() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1);
        cache.insert("b", 2);
        // "a" passa a ser o mais recente
        assert_eq!(cache.get("a"), Some(1));
        cache.insert("c", 3);

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_reinsert_updates_value_without_growing() {
        let mut cache = LruCache::new(2);
        cache.insert("a", 1);
        cache.insert("a", 5);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.peek("a"), Some(&5));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let mut cache = LruCache::new(0);
        cache.insert("a", 1);
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }
}
