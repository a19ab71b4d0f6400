//! Extracted-bundle storage.
//!
//! Bundle items carry only a key; the unzipped files live here until the
//! orchestrator resolves them at load time.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

/// Files of one extracted creative bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedBundle {
    /// Relative path -> file contents.
    pub files: HashMap<String, Vec<u8>>,
    /// Relative path of the HTML entry point.
    pub entry_point: String,
}

impl ExtractedBundle {
    pub fn new(files: HashMap<String, Vec<u8>>, entry_point: impl Into<String>) -> Self {
        Self {
            files,
            entry_point: entry_point.into(),
        }
    }

    /// Whether the entry point is one of the bundle's files.
    pub fn has_entry_point(&self) -> bool {
        self.files.contains_key(&self.entry_point)
    }
}

/// Lookup of extracted bundles by reference key.
pub trait BundleLookup: Send + Sync {
    /// Resolve a key; `None` when nothing is stored under it.
    fn lookup(&self, key: &str) -> Option<ExtractedBundle>;
}

/// Thread-safe in-memory bundle store.
#[derive(Debug, Clone, Default)]
pub struct BundleStore {
    bundles: Arc<RwLock<HashMap<String, ExtractedBundle>>>,
}

impl BundleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a bundle under a freshly generated key and return the key.
    pub fn insert(&self, bundle: ExtractedBundle) -> String {
        let key = format!("bundle-{}", uuid::Uuid::new_v4());
        self.insert_with_key(key.clone(), bundle);
        key
    }

    /// Store a bundle under a caller-chosen key, replacing any previous one.
    pub fn insert_with_key(&self, key: impl Into<String>, bundle: ExtractedBundle) {
        let key = key.into();
        tracing::debug!(
            "Storing bundle {} ({} files, entry {})",
            key,
            bundle.files.len(),
            bundle.entry_point
        );
        self.bundles.write().insert(key, bundle);
    }

    /// Remove a bundle.
    pub fn remove(&self, key: &str) -> Option<ExtractedBundle> {
        self.bundles.write().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.bundles.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.bundles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.read().is_empty()
    }

    /// Drop every stored bundle.
    pub fn clear(&self) {
        self.bundles.write().clear();
    }
}

impl BundleLookup for BundleStore {
    fn lookup(&self, key: &str) -> Option<ExtractedBundle> {
        self.bundles.read().get(key).cloned()
    }
}
