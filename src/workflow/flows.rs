//! Compression workflow steps.
//!
//! One workflow instance per admitted block reference:
//! confirm -> compress -> compare -> select -> persist -> rewrite.
//! Every failure funnels through `fail_workflow`, which notifies the
//! user and leaves the block eligible for the same reference again.

use crate::assets::resolver::resolve_image;
use crate::assets::{codec, path};
use crate::channel::{
    ComparisonPayload, CompletionPayload, CompressedSourceType, ImageChoice, SelectionPayload,
};
use crate::common::errors::WorkflowError;
use crate::host::NoticeLevel;
use crate::plugin::CompressorPlugin;
use crate::storage;
use crate::workflow::compressor::CompressionOutcome;
use crate::workflow::markdown::replace_first_image_url;
use anyhow::Result;
use log::{info, warn};
use uuid::Uuid;

impl CompressorPlugin {
    /// Confirmed by the user: resolve the reference, hand it to the
    /// endpoint, and stage the comparison dialog.
    pub(crate) async fn proceed_with_compression(&self, block_uuid: Uuid, image_url: &str) {
        let Some(server_url) = self.server_url() else {
            // Settings changed between confirmation and proceed.
            self.notifier
                .notify(NoticeLevel::Warning, &WorkflowError::ConfigMissing.to_string());
            self.release_block(block_uuid, None);
            self.bus.clear_loading();
            self.bus.hide_surface();
            return;
        };

        self.notifier
            .notify(NoticeLevel::Info, "Compressing image...");

        if let Err(error) = self
            .compress_and_stage(block_uuid, image_url, &server_url)
            .await
        {
            self.fail_workflow(block_uuid, &format!("Compression failed: {error}"));
        }
    }

    async fn compress_and_stage(
        &self,
        block_uuid: Uuid,
        image_url: &str,
        server_url: &str,
    ) -> Result<()> {
        // Step 1: the block must still exist before any network round-trip
        if self.editor.get_block(block_uuid).await?.is_none() {
            return Err(WorkflowError::BlockGone(block_uuid).into());
        }

        // Step 2: resolve the reference into bytes plus a preview
        let resolved =
            resolve_image(image_url, block_uuid, self.graph.as_ref(), &self.previews).await?;
        let original_size = kib_label(resolved.bytes.len());

        // Step 3: hand the binary to the compression endpoint
        let file_name = path::extract_file_name(image_url);
        let outcome = self
            .service
            .compress(server_url, resolved.bytes.clone(), file_name)
            .await?;

        // Step 4: stage the side-by-side comparison
        let comparison = match outcome {
            CompressionOutcome::RemoteHosted {
                url,
                preview_url,
                size_label,
                mime,
            } => ComparisonPayload {
                block_uuid,
                original_url: image_url.to_string(),
                original_preview_url: resolved.preview_url,
                compressed_url: url,
                compressed_preview_url: preview_url,
                original_size,
                compressed_size: size_label.unwrap_or_else(|| "Unknown".to_string()),
                compressed_source_type: CompressedSourceType::Remote,
                compressed_mime: mime,
            },
            CompressionOutcome::InlineBinary { bytes, mime } => {
                let compressed_size = kib_label(bytes.len());
                let compressed_preview_url =
                    self.previews.mint(block_uuid, bytes.clone(), mime.clone());
                ComparisonPayload {
                    block_uuid,
                    original_url: image_url.to_string(),
                    original_preview_url: resolved.preview_url,
                    compressed_url: codec::encode_data_url(&bytes, mime.as_deref()),
                    compressed_preview_url,
                    original_size,
                    compressed_size,
                    compressed_source_type: CompressedSourceType::DataUrl,
                    compressed_mime: mime,
                }
            }
        };

        self.bus.stage_comparison(comparison);
        self.bus.show_surface();
        Ok(())
    }

    /// The user picked a side in the compare dialog.
    pub(crate) async fn finalize_selection(&self, selection: SelectionPayload) {
        let block_uuid = selection.comparison.block_uuid;
        match self.apply_selection(&selection).await {
            Ok(final_url) => {
                self.bus.stage_completion(CompletionPayload {
                    block_uuid,
                    last_image_url: Some(final_url.clone()),
                });
                if let Err(error) = self.rewrite_block(block_uuid, &final_url).await {
                    warn!("Failed to rewrite block {block_uuid}: {error:?}");
                }
                self.bus.hide_surface();
            }
            Err(error) => {
                self.fail_workflow(block_uuid, &format!("Failed to insert image: {error}"));
            }
        }
    }

    async fn apply_selection(&self, selection: &SelectionPayload) -> Result<String> {
        let comparison = &selection.comparison;
        match selection.choice {
            // Original chosen: nothing to persist, the reference stays as-is.
            ImageChoice::Original => Ok(comparison.original_url.clone()),
            ImageChoice::Compressed => {
                let (bytes, mime) = self.compressed_bytes(comparison).await?;
                let config = self.config();
                let final_url = storage::persist(
                    self.store.as_ref(),
                    &config,
                    &bytes,
                    mime.as_deref(),
                    &comparison.compressed_url,
                    &comparison.original_url,
                )
                .await?;
                info!(
                    "Persisted compressed image for block {} at {final_url}",
                    comparison.block_uuid
                );
                Ok(final_url)
            }
        }
    }

    /// Obtain the compressed bytes for persistence: decoded from the
    /// inline data URL, or downloaded from the hosted result.
    async fn compressed_bytes(
        &self,
        comparison: &ComparisonPayload,
    ) -> Result<(Vec<u8>, Option<String>)> {
        match comparison.compressed_source_type {
            CompressedSourceType::DataUrl => {
                let payload = codec::decode_data_url(&comparison.compressed_url);
                let mime = comparison
                    .compressed_mime
                    .clone()
                    .or_else(|| payload.mime().map(str::to_string));
                Ok((payload.into_bytes(), mime))
            }
            CompressedSourceType::Remote => {
                let response = reqwest::get(&comparison.compressed_url)
                    .await
                    .map_err(|err| WorkflowError::Fetch(err.to_string()))?;
                if !response.status().is_success() {
                    return Err(WorkflowError::Fetch(format!(
                        "failed to download compressed image: {}",
                        response.status()
                    ))
                    .into());
                }
                let header_mime = response
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|err| WorkflowError::Fetch(err.to_string()))?
                    .to_vec();
                let mime = comparison.compressed_mime.clone().or(header_mime);
                Ok((bytes, mime))
            }
        }
    }

    /// Rewrite the block's first image reference. A vanished block is not
    /// an error at this stage.
    async fn rewrite_block(&self, block_uuid: Uuid, final_url: &str) -> Result<()> {
        if let Some(block) = self.editor.get_block(block_uuid).await? {
            if !block.content.is_empty() {
                let new_content = replace_first_image_url(&block.content, final_url);
                self.editor.update_block(block_uuid, &new_content).await?;
            }
        }
        Ok(())
    }

    /// Terminal failure: tell the user, drop the loading marker, and
    /// leave the reference eligible for reprocessing on the next edit.
    pub(crate) fn fail_workflow(&self, block_uuid: Uuid, message: &str) {
        self.notifier.notify(NoticeLevel::Error, message);
        self.release_block(block_uuid, None);
        self.bus.clear_loading();
        self.bus.hide_surface();
    }
}

/// Human display size, matching the host dialog's `12.34 KB` format.
fn kib_label(len: usize) -> String {
    format!("{:.2} KB", len as f64 / 1024.0)
}
