// SPDX-License-Identifier: MIT

use super::ast::Node;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

type CacheKey = (u32, String);

struct Inner {
    entries: HashMap<CacheKey, Arc<Node>>,
    order: VecDeque<CacheKey>,
}

/// Validated ASTs keyed by workflow version and expression text.
///
/// Only expressions that passed validation are stored. The oldest entry is
/// evicted once the capacity is reached.
#[derive(Clone)]
pub struct AstCache {
    inner: Arc<RwLock<Inner>>,
    capacity: usize,
}

impl AstCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            })),
            capacity,
        }
    }

    pub async fn get(&self, version: u32, expression: &str) -> Option<Arc<Node>> {
        let inner = self.inner.read().await;
        inner
            .entries
            .get(&(version, expression.to_string()))
            .cloned()
    }

    pub async fn insert(&self, version: u32, expression: &str, node: Arc<Node>) {
        if self.capacity == 0 {
            return;
        }
        let key = (version, expression.to_string());

        let mut inner = self.inner.write().await;
        if inner.entries.contains_key(&key) {
            return;
        }
        while inner.entries.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
        inner.order.push_back(key.clone());
        inner.entries.insert(key, node);
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every entry for a workflow version, e.g. after it is unpublished
    pub async fn invalidate_version(&self, version: u32) {
        let mut inner = self.inner.write().await;
        inner.entries.retain(|(v, _), _| *v != version);
        inner.order.retain(|(v, _)| *v != version);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ast::Literal;

    fn node(n: f64) -> Arc<Node> {
        Arc::new(Node::Literal(Literal::Number(n)))
    }

    #[tokio::test]
    async fn test_keyed_by_version_and_text() {
        let cache = AstCache::new(8);
        cache.insert(1, "a", node(1.0)).await;
        cache.insert(2, "a", node(2.0)).await;

        assert_eq!(*cache.get(1, "a").await.unwrap(), *node(1.0));
        assert_eq!(*cache.get(2, "a").await.unwrap(), *node(2.0));
        assert!(cache.get(3, "a").await.is_none());
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_evicts_oldest() {
        let cache = AstCache::new(2);
        cache.insert(1, "a", node(1.0)).await;
        cache.insert(1, "b", node(2.0)).await;
        cache.insert(1, "c", node(3.0)).await;

        assert!(cache.get(1, "a").await.is_none());
        assert!(cache.get(1, "b").await.is_some());
        assert!(cache.get(1, "c").await.is_some());
    }

    #[tokio::test]
    async fn test_zero_capacity_stores_nothing() {
        let cache = AstCache::new(0);
        cache.insert(1, "a", node(1.0)).await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalidate_version() {
        let cache = AstCache::new(8);
        cache.insert(1, "a", node(1.0)).await;
        cache.insert(2, "a", node(1.0)).await;
        cache.invalidate_version(1).await;
        assert!(cache.get(1, "a").await.is_none());
        assert_eq!(cache.len().await, 1);
    }
}
