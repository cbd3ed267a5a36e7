//! Boundary traits for everything the host runtime owns.
//!
//! Includes:
//! - Block read/update (the editor API)
//! - Sandboxed asset storage
//! - Current-graph lookup
//! - Transient user notifications

pub mod fs_store;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

/// One editable block as the host reports it. Only `content` is ever
/// read or written; all other block state stays host-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSnapshot {
    pub uuid: Uuid,
    pub content: String,
}

impl BlockSnapshot {
    pub fn new(uuid: Uuid, content: impl Into<String>) -> Self {
        Self {
            uuid,
            content: content.into(),
        }
    }
}

/// Severity of a transient host notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Host editor access, by block UUID.
#[async_trait]
pub trait EditorApi: Send + Sync {
    async fn get_block(&self, uuid: Uuid) -> Result<Option<BlockSnapshot>>;
    async fn update_block(&self, uuid: Uuid, content: &str) -> Result<()>;
}

/// Sandboxed binary storage keyed by relative path under the plugin's
/// private namespace.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn set_item(&self, key: &str, value: &[u8]) -> Result<()>;
}

/// Supplies the current graph's working directory, if a graph is open.
#[async_trait]
pub trait GraphLocator: Send + Sync {
    async fn current_graph_dir(&self) -> Option<PathBuf>;
}

/// Transient user-visible message toast.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);
}
