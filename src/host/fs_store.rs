//! Filesystem-backed sandboxed asset storage.
//!
//! The host keeps a plugin's sandbox at
//! `<graph>/assets/storages/<plugin-id>/`; keys are paths relative to
//! that directory. Traversal keys may climb toward sibling directories
//! under `assets/`, but never out of the assets root.

use super::AssetStore;
use crate::common::PLUGIN_STORAGE_ROOT;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use path_clean::PathClean;
use std::path::{Path, PathBuf};

pub struct FsAssetStore {
    plugin_root: PathBuf,
    assets_root: PathBuf,
}

impl FsAssetStore {
    /// Storage for `plugin_id` inside `graph_dir`'s assets directory.
    pub fn new(graph_dir: impl AsRef<Path>, plugin_id: &str) -> Self {
        let graph_dir = graph_dir.as_ref();
        Self {
            plugin_root: graph_dir.join(PLUGIN_STORAGE_ROOT).join(plugin_id).clean(),
            assets_root: graph_dir.join("assets").clean(),
        }
    }

    pub fn plugin_root(&self) -> &Path {
        &self.plugin_root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let resolved = self.plugin_root.join(key).clean();
        if !resolved.starts_with(&self.assets_root) {
            bail!("storage key escapes the assets root: {key}");
        }
        Ok(resolved)
    }
}

#[async_trait]
impl AssetStore for FsAssetStore {
    async fn set_item(&self, key: &str, value: &[u8]) -> Result<()> {
        let target = self.resolve(key)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        tokio::fs::write(&target, value)
            .await
            .with_context(|| format!("failed to write {}", target.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_plain_keys_under_the_plugin_root() {
        let graph = tempfile::tempdir().unwrap();
        let store = FsAssetStore::new(graph.path(), "imgpress");

        store.set_item("pic.png", &[9, 9]).await.unwrap();

        let written = graph
            .path()
            .join("assets/storages/imgpress/pic.png");
        assert_eq!(std::fs::read(written).unwrap(), vec![9, 9]);
    }

    #[tokio::test]
    async fn traversal_keys_reach_siblings_inside_assets() {
        let graph = tempfile::tempdir().unwrap();
        let store = FsAssetStore::new(graph.path(), "imgpress");

        store.set_item("../../img/cat.png", &[1]).await.unwrap();

        let written = graph.path().join("assets/img/cat.png");
        assert_eq!(std::fs::read(written).unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn keys_escaping_the_assets_root_are_rejected() {
        let graph = tempfile::tempdir().unwrap();
        let store = FsAssetStore::new(graph.path(), "imgpress");

        let result = store.set_item("../../../outside.png", &[1]).await;
        assert!(result.is_err());
        assert!(!graph.path().join("outside.png").exists());
    }
}
