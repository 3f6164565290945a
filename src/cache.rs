use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::store::ArtifactPair;

/// Loaded model/scaler pairs keyed by artifact key.
///
/// A model and its scaler are stored and returned together as one
/// `Arc<ArtifactPair>`, so a reader can never observe a model next to a
/// scaler from another key. Entries are never replaced once inserted.
#[derive(Debug, Default)]
pub struct ArtifactCache {
    pairs: RwLock<HashMap<String, Arc<ArtifactPair>>>,
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<ArtifactPair>> {
        self.pairs.read().get(key).cloned()
    }

    /// Insert `pair` unless the key is already cached; returns the cached
    /// entry either way. On a race the first insert wins.
    pub fn insert(&self, pair: ArtifactPair) -> Arc<ArtifactPair> {
        let mut pairs = self.pairs.write();
        pairs
            .entry(pair.key.clone())
            .or_insert_with(|| Arc::new(pair))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.pairs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.read().is_empty()
    }

    /// Drop every entry. Pairs already handed out stay valid.
    pub fn clear(&self) {
        self.pairs.write().clear();
    }
}
