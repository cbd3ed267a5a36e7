//! In-memory host adapters - enough host to drive the whole pipeline
//! without the real runtime, in tests or headless runs.

use super::{AssetStore, BlockSnapshot, EditorApi, GraphLocator, NoticeLevel, Notifier};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryEditor {
    blocks: DashMap<Uuid, String>,
}

impl MemoryEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, uuid: Uuid, content: impl Into<String>) {
        self.blocks.insert(uuid, content.into());
    }

    pub fn remove(&self, uuid: Uuid) {
        self.blocks.remove(&uuid);
    }

    pub fn content(&self, uuid: Uuid) -> Option<String> {
        self.blocks.get(&uuid).map(|content| content.clone())
    }
}

#[async_trait]
impl EditorApi for MemoryEditor {
    async fn get_block(&self, uuid: Uuid) -> Result<Option<BlockSnapshot>> {
        Ok(self
            .blocks
            .get(&uuid)
            .map(|content| BlockSnapshot::new(uuid, content.clone())))
    }

    async fn update_block(&self, uuid: Uuid, content: &str) -> Result<()> {
        self.blocks.insert(uuid, content.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryAssetStore {
    items: DashMap<String, Vec<u8>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.items.get(key).map(|value| value.clone())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn set_item(&self, key: &str, value: &[u8]) -> Result<()> {
        self.items.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Fixed graph directory, or none to mimic a host without an open graph.
#[derive(Default)]
pub struct StaticGraphLocator {
    dir: Option<PathBuf>,
}

impl StaticGraphLocator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn unavailable() -> Self {
        Self { dir: None }
    }
}

#[async_trait]
impl GraphLocator for StaticGraphLocator {
    async fn current_graph_dir(&self) -> Option<PathBuf> {
        self.dir.clone()
    }
}

/// Records every notification and mirrors it to the log.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(NoticeLevel, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(NoticeLevel, String)> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Info => info!("{message}"),
            NoticeLevel::Warning => warn!("{message}"),
            NoticeLevel::Error => error!("{message}"),
        }
        self.messages
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}
