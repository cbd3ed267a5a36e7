//! Plugin wiring and the core-side event loop.

use crate::assets::preview::PreviewRegistry;
use crate::channel::{ConfirmationPayload, SettingsBus};
use crate::common::errors::WorkflowError;
use crate::config::PluginConfig;
use crate::host::{AssetStore, BlockSnapshot, EditorApi, GraphLocator, NoticeLevel, Notifier};
use crate::workflow::compressor::{CompressionService, HttpCompressionService};
use crate::workflow::guard::ProcessingLedger;
use crate::workflow::markdown::extract_first_image;
use log::debug;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

/// One plugin instance: host handles, the settings bus shared with the
/// rendered surface, and the per-block workflow state.
pub struct CompressorPlugin {
    pub(crate) config: RwLock<PluginConfig>,
    pub(crate) bus: Arc<SettingsBus>,
    pub(crate) editor: Arc<dyn EditorApi>,
    pub(crate) graph: Arc<dyn GraphLocator>,
    pub(crate) store: Arc<dyn AssetStore>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) service: Arc<dyn CompressionService>,
    pub(crate) ledger: ProcessingLedger,
    pub(crate) previews: PreviewRegistry,
}

impl CompressorPlugin {
    pub fn new(
        config: PluginConfig,
        editor: Arc<dyn EditorApi>,
        graph: Arc<dyn GraphLocator>,
        store: Arc<dyn AssetStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        Self::with_service(
            config,
            editor,
            graph,
            store,
            notifier,
            Arc::new(HttpCompressionService::new()),
        )
    }

    /// Like [`CompressorPlugin::new`] with the compression endpoint seam
    /// injected.
    pub fn with_service(
        config: PluginConfig,
        editor: Arc<dyn EditorApi>,
        graph: Arc<dyn GraphLocator>,
        store: Arc<dyn AssetStore>,
        notifier: Arc<dyn Notifier>,
        service: Arc<dyn CompressionService>,
    ) -> Arc<Self> {
        let bus = Arc::new(SettingsBus::new());
        bus.reset();
        Arc::new(Self {
            config: RwLock::new(config),
            bus,
            editor,
            graph,
            store,
            notifier,
            service,
            ledger: ProcessingLedger::new(),
            previews: PreviewRegistry::new(),
        })
    }

    /// The settings bus shared with the rendered surface.
    pub fn bus(&self) -> Arc<SettingsBus> {
        Arc::clone(&self.bus)
    }

    pub fn config(&self) -> PluginConfig {
        self.config.read().unwrap().clone()
    }

    /// Swap in updated user settings; the host fires this on change.
    pub fn update_config(&self, config: PluginConfig) {
        *self.config.write().unwrap() = config;
    }

    pub(crate) fn server_url(&self) -> Option<String> {
        self.config
            .read()
            .unwrap()
            .server_url()
            .map(str::to_string)
    }

    /// Whether a workflow currently holds this block.
    pub fn is_processing(&self, block_uuid: Uuid) -> bool {
        self.ledger.is_locked(block_uuid)
    }

    /// Live preview handles registered for this block. Zero once its
    /// workflow has ended, on any exit path.
    pub fn active_previews(&self, block_uuid: Uuid) -> usize {
        self.previews.count_for(block_uuid)
    }

    /// Host change-notification entry point: a batch of changed blocks,
    /// processed in delivery order.
    pub async fn handle_block_changes(&self, blocks: &[BlockSnapshot]) {
        for block in blocks {
            self.handle_block_change(block).await;
        }
    }

    /// Inspect one changed block and admit at most one workflow for it.
    pub async fn handle_block_change(&self, block: &BlockSnapshot) {
        if block.content.is_empty() {
            return;
        }
        let Some(image) = extract_first_image(&block.content) else {
            return;
        };

        if self.server_url().is_none() {
            self.notifier
                .notify(NoticeLevel::Warning, &WorkflowError::ConfigMissing.to_string());
            return;
        }

        if !self.ledger.should_process(block.uuid, &image.url) {
            debug!(
                "Skipping block {}: locked or reference already handled",
                block.uuid
            );
            return;
        }

        self.bus.stage_confirmation(ConfirmationPayload {
            block_uuid: block.uuid,
            image_url: image.url,
        });
        self.bus.show_surface();
    }

    /// Core event loop: reacts to surface decisions until the bus closes.
    /// Run it as its own task, alongside the surface's loop.
    pub async fn run(self: Arc<Self>) {
        let mut changes = self.bus.subscribe();
        loop {
            if let Some(proceed) = self.bus.take_proceed() {
                let plugin = Arc::clone(&self);
                tokio::spawn(async move {
                    plugin
                        .proceed_with_compression(proceed.block_uuid, &proceed.image_url)
                        .await;
                });
            }
            if let Some(selection) = self.bus.take_selection() {
                let plugin = Arc::clone(&self);
                tokio::spawn(async move {
                    plugin.finalize_selection(selection).await;
                });
            }
            if let Some(completion) = self.bus.take_completion() {
                self.release_block(completion.block_uuid, completion.last_image_url.as_deref());
                self.bus.hide_surface();
            }

            match changes.recv().await {
                Ok(()) => {}
                Err(RecvError::Lagged(missed)) => {
                    debug!("Core loop lagged {missed} change notifications");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    /// End a block's workflow: unlock it, record or clear the final URL,
    /// and revoke every preview handle minted for it.
    pub(crate) fn release_block(&self, block_uuid: Uuid, final_url: Option<&str>) {
        self.ledger.release(block_uuid, final_url);
        self.previews.revoke_all(block_uuid);
    }
}
