//! Persists a chosen binary into the host's sandboxed asset storage.

use crate::assets::codec::guess_extension_from_mime;
use crate::assets::path::{
    compute_relative_storage_key, file_name_from_url, has_recognizable_extension,
    normalize_asset_path,
};
use crate::common::errors::WorkflowError;
use crate::config::PluginConfig;
use crate::host::AssetStore;
use chrono::Utc;
use log::warn;
use rand::Rng;
use rand::distr::Alphanumeric;

/// Write `bytes` to asset storage and return the graph-relative URL the
/// block text should reference.
///
/// Prefers overwriting the original asset's own location when the
/// original reference resolves to one; a storage refusal there is logged
/// and recovered by falling back to a fresh name under the plugin's
/// namespace. Only both writes failing is an error.
pub async fn persist(
    store: &dyn AssetStore,
    config: &PluginConfig,
    bytes: &[u8],
    mime_hint: Option<&str>,
    source_url: &str,
    original_reference_url: &str,
) -> Result<String, WorkflowError> {
    let ext = guess_extension_from_mime(mime_hint, Some(source_url));
    let normalized_asset_path = normalize_asset_path(original_reference_url);

    if let Some(asset_path) = &normalized_asset_path {
        let preferred_relative = format!("../{asset_path}");
        if let Some(traversal_key) =
            compute_relative_storage_key(&config.plugin_assets_prefix(), asset_path)
        {
            match store.set_item(&traversal_key, bytes).await {
                Ok(()) => return Ok(preferred_relative),
                Err(err) => {
                    warn!("Failed to write compressed image to original asset path: {err:?}");
                }
            }
        }
    }

    let original_file_name =
        file_name_from_url(original_reference_url).or_else(|| file_name_from_url(source_url));
    let fallback_file_name = match original_file_name {
        Some(name) if has_recognizable_extension(&name) => name,
        _ => generated_file_name(&ext),
    };
    let fallback_relative = format!("../{}{}", config.plugin_assets_prefix(), fallback_file_name);

    store
        .set_item(&fallback_file_name, bytes)
        .await
        .map_err(|err| {
            warn!("Fallback asset write failed: {err:?}");
            WorkflowError::StorageWrite
        })?;
    Ok(fallback_relative)
}

/// `<timestamp-ms>_<6 random chars>.<ext>` - unique enough to never
/// collide inside the plugin namespace.
fn generated_file_name(ext: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(6)
        .map(|byte| (byte as char).to_ascii_lowercase())
        .collect();
    format!("{}_{}.{}", Utc::now().timestamp_millis(), suffix, ext)
}
