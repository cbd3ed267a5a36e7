//! Revocable preview handles for locally-resolved binaries.
//!
//! The host runtime previews remote URLs directly, but graph-local bytes
//! need a short-lived displayable reference. A handle is a minted
//! `preview://` URL owning its bytes; everything registered under a
//! block UUID is revoked exactly once, when that block's workflow ends.

use dashmap::DashMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle {
    pub url: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
pub struct PreviewRegistry {
    handles: DashMap<Uuid, Vec<PreviewHandle>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a preview URL for `bytes` and register it under the owning
    /// block.
    pub fn mint(&self, block_uuid: Uuid, bytes: Vec<u8>, mime: Option<String>) -> String {
        let url = format!("preview://{}", Uuid::new_v4());
        self.handles
            .entry(block_uuid)
            .or_default()
            .push(PreviewHandle {
                url: url.clone(),
                mime,
                bytes,
            });
        url
    }

    /// Look up a live handle for display.
    pub fn resolve(&self, url: &str) -> Option<PreviewHandle> {
        self.handles.iter().find_map(|entry| {
            entry
                .value()
                .iter()
                .find(|handle| handle.url == url)
                .cloned()
        })
    }

    /// Drop every handle registered under `block_uuid`.
    pub fn revoke_all(&self, block_uuid: Uuid) {
        self.handles.remove(&block_uuid);
    }

    pub fn count_for(&self, block_uuid: Uuid) -> usize {
        self.handles
            .get(&block_uuid)
            .map(|handles| handles.len())
            .unwrap_or(0)
    }
}
