//! In-memory capture registry
//!
//! Reproduces the hierarchy a capture service maintains per device: projects
//! contain participants, participants contain calibrations, calibrations
//! contain recordings. Every level is created lazily on first visit, exactly
//! like the device's own set-or-create endpoints behave.

use super::{CaptureApi, RecordKey};
use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};

/// Ancestor levels below the endpoint: project / participant / calibration.
/// A longer path would address something below a recording, which does not
/// exist in the capture hierarchy.
const MAX_SCOPE_DEPTH: usize = 3;

#[derive(Debug, Default)]
struct Node {
    children: BTreeMap<RecordKey, Node>,
}

/// In-memory [`CaptureApi`] with get-or-create semantics at every level.
///
/// One instance stands for one device; connections sharing an endpoint share
/// the instance. The single mutex keeps per-key creation atomic when those
/// connections race.
pub struct MemoryRegistry {
    root: Mutex<Node>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            root: Mutex::new(Node::default()),
        }
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureApi for MemoryRegistry {
    async fn projects(&self) -> Result<BTreeSet<RecordKey>> {
        Ok(self.root.lock().children.keys().cloned().collect())
    }

    async fn resolve_or_create(
        &self,
        path: &[RecordKey],
        key: Option<RecordKey>,
    ) -> Result<(RecordKey, BTreeSet<RecordKey>)> {
        if path.len() > MAX_SCOPE_DEPTH {
            bail!("scope {path:?} is deeper than the capture hierarchy");
        }

        let mut root = self.root.lock();
        let mut node = &mut *root;
        for ancestor in path {
            node = node.children.entry(ancestor.clone()).or_default();
        }

        let key = key.unwrap_or_else(|| RecordKey::next_index(node.children.keys()));
        let child = node.children.entry(key.clone()).or_default();
        Ok((key, child.children.keys().cloned().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn name(s: &str) -> RecordKey {
        RecordKey::Name(s.into())
    }

    #[tokio::test]
    async fn test_set_or_create_is_idempotent() {
        let registry = MemoryRegistry::new();

        let (key, children) = registry
            .resolve_or_create(&[], Some(name("P1")))
            .await
            .unwrap();
        assert_eq!(key, name("P1"));
        assert!(children.is_empty());

        // a second visit returns the same children without duplicating
        registry
            .resolve_or_create(&[name("P1")], Some(name("part1")))
            .await
            .unwrap();
        let (_, children) = registry
            .resolve_or_create(&[], Some(name("P1")))
            .await
            .unwrap();
        assert_eq!(children, BTreeSet::from([name("part1")]));

        let projects = registry.projects().await.unwrap();
        assert_eq!(projects.len(), 1);
    }

    #[tokio::test]
    async fn test_auto_index_assignment() {
        let registry = MemoryRegistry::new();
        let scope = [name("P1"), name("part1")];

        let (first, _) = registry.resolve_or_create(&scope, None).await.unwrap();
        assert_eq!(first, RecordKey::Index(0));

        let (second, _) = registry.resolve_or_create(&scope, None).await.unwrap();
        assert_eq!(second, RecordKey::Index(1));

        // names at the same level do not disturb the numbering
        registry
            .resolve_or_create(&scope, Some(name("manual")))
            .await
            .unwrap();
        let (third, _) = registry.resolve_or_create(&scope, None).await.unwrap();
        assert_eq!(third, RecordKey::Index(2));
    }

    #[tokio::test]
    async fn test_path_walk_creates_missing_levels() {
        let registry = MemoryRegistry::new();

        registry
            .resolve_or_create(&[name("P1"), name("part1"), RecordKey::Index(0)], None)
            .await
            .unwrap();

        let projects = registry.projects().await.unwrap();
        assert!(projects.contains(&name("P1")));

        let (_, participants) = registry
            .resolve_or_create(&[], Some(name("P1")))
            .await
            .unwrap();
        assert!(participants.contains(&name("part1")));
    }

    #[tokio::test]
    async fn test_scope_depth_is_bounded() {
        let registry = MemoryRegistry::new();
        let too_deep = [
            name("P1"),
            name("part1"),
            RecordKey::Index(0),
            RecordKey::Index(0),
        ];
        assert!(registry.resolve_or_create(&too_deep, None).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_creation_keeps_all_keys() {
        let registry = Arc::new(MemoryRegistry::new());

        let mut handles = Vec::new();
        for i in 0..16u64 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move {
                registry
                    .resolve_or_create(&[], Some(RecordKey::Index(i)))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.projects().await.unwrap().len(), 16);
    }
}
