// 📚 Badge Registry - one immutable snapshot of the whole corpus
//
// Loader → normalize → Registry. Rebuilt from scratch on every load;
// nothing is cached between loads.

use crate::badge::{normalize, Badge};
use crate::error::Result;
use crate::loader::load_records;
use crate::query::{self, Facets, SearchParams, SortOrder};
use crate::validation::{self, ValidationError};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

// ============================================================================
// REGISTRY
// ============================================================================

/// All normalized badges of one load, newest first.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    badges: Vec<Badge>,
}

impl Registry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load and normalize every record under `root`.
    ///
    /// Any malformed record fails the whole load.
    pub fn load(root: &Path) -> Result<Self> {
        let badges = load_records(root)?
            .into_iter()
            .map(|record| normalize(record.raw, record.path))
            .collect();

        let registry = Self::from_badges(badges);
        info!(root = %root.display(), badges = registry.len(), "registry loaded");
        Ok(registry)
    }

    /// Build from already-normalized badges; applies the default order
    pub fn from_badges(mut badges: Vec<Badge>) -> Self {
        query::sort_badges(&mut badges, SortOrder::Newest);
        Registry { badges }
    }

    /// Read-only view of the sorted corpus
    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    /// Owned copy of the sorted corpus
    pub fn all_badges(&self) -> Vec<Badge> {
        self.badges.clone()
    }

    pub fn get(&self, slug: &str) -> Option<&Badge> {
        self.badges.iter().find(|badge| badge.slug == slug)
    }

    pub fn len(&self) -> usize {
        self.badges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    /// Every invariant violation in the corpus
    pub fn validate(&self) -> Vec<ValidationError> {
        validation::validate_corpus(&self.badges)
    }

    pub fn search(&self, params: &SearchParams) -> Vec<Badge> {
        query::search(&self.badges, params)
    }

    pub fn facets(&self) -> Facets {
        query::facets(&self.badges)
    }

    /// SHA-256 over the sorted (slug, signature) pairs.
    /// Equal fingerprints mean the same published corpus.
    pub fn fingerprint(&self) -> String {
        let mut entries: Vec<(&str, &str)> = self
            .badges
            .iter()
            .map(|badge| (badge.slug.as_str(), badge.digital_signature.as_str()))
            .collect();
        entries.sort();

        let mut hasher = Sha256::new();
        for (slug, signature) in entries {
            hasher.update(slug.as_bytes());
            hasher.update([0u8]);
            hasher.update(signature.as_bytes());
            hasher.update([b'\n']);
        }
        format!("{:x}", hasher.finalize())
    }
}

// ============================================================================
// REGISTRY HANDLE (atomic snapshot replacement)
// ============================================================================

/// Shared owner of the current snapshot.
///
/// Readers take an `Arc<Registry>` and query it without holding the lock.
/// `reload` builds the replacement completely before swapping it in.
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    root: PathBuf,
    current: Arc<RwLock<Arc<Registry>>>,
}

impl RegistryHandle {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let registry = Registry::load(&root)?;
        Ok(Self::with_registry(root, registry))
    }

    pub fn with_registry(root: impl Into<PathBuf>, registry: Registry) -> Self {
        RegistryHandle {
            root: root.into(),
            current: Arc::new(RwLock::new(Arc::new(registry))),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn snapshot(&self) -> Arc<Registry> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            // The guarded value is a single Arc, never left half-written
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Rebuild from the store. On failure the previous snapshot stays current.
    pub fn reload(&self) -> Result<Arc<Registry>> {
        let fresh = match Registry::load(&self.root) {
            Ok(registry) => Arc::new(registry),
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "reload failed, keeping previous snapshot");
                return Err(e);
            }
        };

        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::clone(&fresh);
        Ok(fresh)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badge::RawBadge;
    use serde_json::json;
    use std::fs;

    fn badge(vendor: &str, version: &str, issued_at: &str) -> Badge {
        let raw: RawBadge = serde_json::from_value(json!({
            "vendor": vendor,
            "application": "Portal",
            "version": version,
            "badge_type": "free-oidc-support",
            "status": "certified",
            "issued_at": issued_at,
            "digital_signature": format!("sig-{}-{}", vendor, version)
        }))
        .unwrap();
        normalize(raw, format!("{}/Portal/{}.json", vendor, version))
    }

    fn write_badge(root: &Path, vendor: &str, version: &str, issued_at: &str) {
        let dir = root.join(vendor).join("Portal");
        fs::create_dir_all(&dir).unwrap();
        let record = json!({
            "vendor": vendor,
            "application": "Portal",
            "version": version,
            "badge_type": "free-oidc-support",
            "status": "certified",
            "issued_at": issued_at,
            "digital_signature": "sig"
        });
        fs::write(dir.join(format!("{}.json", version)), record.to_string()).unwrap();
    }

    #[test]
    fn test_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::load(dir.path()).unwrap();

        assert!(registry.all_badges().is_empty());
        assert!(registry.facets().is_empty());
        assert!(registry.validate().is_empty());
        assert!(registry.search(&SearchParams::new()).is_empty());
    }

    #[test]
    fn test_default_order_newest_first() {
        let registry = Registry::from_badges(vec![
            badge("A", "1.0", "2023-01-01"),
            badge("B", "1.0", "2024-07-01"),
            badge("C", "1.0", "2024-02-01"),
        ]);

        let vendors: Vec<&str> = registry.badges().iter().map(|b| b.vendor.as_str()).collect();
        assert_eq!(vendors, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_all_badges_is_a_copy() {
        let registry = Registry::from_badges(vec![badge("A", "1.0", "2024-01-01")]);

        let mut copy = registry.all_badges();
        copy[0].vendor = "Mutated".to_string();
        copy.clear();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.badges()[0].vendor, "A");
    }

    #[test]
    fn test_get_by_slug() {
        let registry = Registry::from_badges(vec![badge("A", "1.0", "2024-01-01")]);

        assert!(registry.get("A/Portal/1.0").is_some());
        assert!(registry.get("A/Portal/2.0").is_none());
    }

    #[test]
    fn test_load_from_store() {
        let dir = tempfile::tempdir().unwrap();
        write_badge(dir.path(), "Acme", "1.0.0", "2024-01-01");
        write_badge(dir.path(), "Acme", "2.0.0", "2024-03-01");

        let registry = Registry::load(dir.path()).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.badges()[0].version, "2.0.0");
        assert_eq!(registry.badges()[0].path, "Acme/Portal/2.0.0.json");
        assert!(registry.validate().is_empty());
    }

    #[test]
    fn test_fingerprint_ignores_order_and_tracks_content() {
        let a = Registry::from_badges(vec![
            badge("A", "1.0", "2024-01-01"),
            badge("B", "1.0", "2024-02-01"),
        ]);
        let b = Registry::from_badges(vec![
            badge("B", "1.0", "2024-02-01"),
            badge("A", "1.0", "2024-01-01"),
        ]);
        let c = Registry::from_badges(vec![badge("A", "1.0", "2024-01-01")]);

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_reload_swaps_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        write_badge(dir.path(), "Acme", "1.0.0", "2024-01-01");

        let handle = RegistryHandle::open(dir.path()).unwrap();
        let before = handle.snapshot();
        assert_eq!(before.len(), 1);

        write_badge(dir.path(), "Acme", "1.1.0", "2024-02-01");
        let after = handle.reload().unwrap();

        assert_eq!(after.len(), 2);
        assert_eq!(handle.snapshot().len(), 2);
        // Readers holding the old snapshot are unaffected
        assert_eq!(before.len(), 1);
    }

    #[test]
    fn test_failed_reload_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        write_badge(dir.path(), "Acme", "1.0.0", "2024-01-01");
        let handle = RegistryHandle::open(dir.path()).unwrap();
        let fingerprint = handle.snapshot().fingerprint();

        fs::write(dir.path().join("Acme/Portal/broken.json"), "{").unwrap();

        assert!(handle.reload().unwrap_err().is_malformed());
        assert_eq!(handle.snapshot().len(), 1);
        assert_eq!(handle.snapshot().fingerprint(), fingerprint);
    }
}
