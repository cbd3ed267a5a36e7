//! Image reference resolution.
//!
//! Dispatches a raw reference to one of three sources: remote HTTP(S)
//! fetch, inline data-URL decode, or a graph-relative asset read from
//! the host's current working directory.

use super::codec;
use super::path::normalize_asset_path;
use super::preview::PreviewRegistry;
use crate::common::errors::WorkflowError;
use crate::host::GraphLocator;
use log::debug;
use path_clean::PathClean;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use uuid::Uuid;

static HTTP_SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^https?:").unwrap());
static DATA_SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^data:").unwrap());

/// Characters a browser's `encodeURI` escapes, minus the URI structure
/// it keeps.
const FILE_URL_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^');

#[derive(Debug)]
pub struct ResolvedImage {
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
    pub preview_url: String,
}

/// Resolve `reference` into binary content plus a preview URL.
///
/// Remote and data references preview as themselves; graph-relative
/// resolutions mint a revocable preview handle registered under
/// `block_uuid` so the workflow can release it later.
pub async fn resolve_image(
    reference: &str,
    block_uuid: Uuid,
    graph: &dyn GraphLocator,
    previews: &PreviewRegistry,
) -> Result<ResolvedImage, WorkflowError> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return Err(WorkflowError::UnsupportedReference(reference.to_string()));
    }

    if DATA_SCHEME_RE.is_match(trimmed) {
        let payload = codec::decode_data_url(trimmed);
        let mime = payload.mime().map(str::to_string);
        return Ok(ResolvedImage {
            bytes: payload.into_bytes(),
            mime,
            preview_url: trimmed.to_string(),
        });
    }

    if HTTP_SCHEME_RE.is_match(trimmed) {
        let response = reqwest::get(trimmed)
            .await
            .map_err(|err| WorkflowError::Fetch(err.to_string()))?;
        if !response.status().is_success() {
            return Err(WorkflowError::Fetch(format!(
                "unexpected status {} from {trimmed}",
                response.status()
            )));
        }
        let mime = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|err| WorkflowError::Fetch(err.to_string()))?
            .to_vec();
        return Ok(ResolvedImage {
            bytes,
            mime,
            preview_url: trimmed.to_string(),
        });
    }

    let asset_path = normalize_asset_path(trimmed)
        .ok_or_else(|| WorkflowError::UnsupportedReference(trimmed.to_string()))?;

    let graph_dir = graph
        .current_graph_dir()
        .await
        .ok_or(WorkflowError::GraphUnavailable)?;
    debug!(
        "Resolving graph asset via {}",
        graph_asset_file_url(&graph_dir, &asset_path)
    );

    let absolute = graph_asset_abs_path(&graph_dir, &asset_path);
    let bytes = tokio::fs::read(&absolute)
        .await
        .map_err(|err| WorkflowError::Fetch(format!("{}: {err}", absolute.display())))?;
    let mime = codec::sniff_mime(&bytes)
        .map(str::to_string)
        .or_else(|| Some(codec::guess_mime_from_path(&asset_path)));
    let preview_url = previews.mint(block_uuid, bytes.clone(), mime.clone());

    Ok(ResolvedImage {
        bytes,
        mime,
        preview_url,
    })
}

/// Absolute on-disk location of a normalized `assets/...` path.
fn graph_asset_abs_path(graph_dir: &Path, asset_path: &str) -> PathBuf {
    let relative = asset_path
        .get(..7)
        .filter(|prefix| prefix.eq_ignore_ascii_case("assets/"))
        .map(|_| &asset_path[7..])
        .unwrap_or(asset_path);
    graph_dir.join("assets").join(relative).clean()
}

/// Percent-encoded `file://` URL for a graph asset, the way the host's
/// rendering surface would address it.
pub fn graph_asset_file_url(graph_dir: &Path, asset_path: &str) -> String {
    let absolute = graph_asset_abs_path(graph_dir, asset_path);
    let normalized = absolute.to_string_lossy().replace('\\', "/");
    let encoded = utf8_percent_encode(&normalized, FILE_URL_ENCODE_SET).to_string();
    if encoded.starts_with('/') {
        format!("file://{encoded}")
    } else {
        format!("file:///{encoded}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::StaticGraphLocator;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[tokio::test]
    async fn data_urls_decode_without_touching_the_graph() {
        let previews = PreviewRegistry::new();
        let graph = StaticGraphLocator::unavailable();
        let reference = codec::encode_data_url(&[1, 2, 3], Some("image/png"));

        let resolved = resolve_image(&reference, Uuid::new_v4(), &graph, &previews)
            .await
            .unwrap();

        assert_eq!(resolved.bytes, vec![1, 2, 3]);
        assert_eq!(resolved.mime.as_deref(), Some("image/png"));
        assert_eq!(resolved.preview_url, reference);
    }

    #[tokio::test]
    async fn graph_assets_read_from_disk_and_mint_a_preview() {
        let graph_dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(graph_dir.path().join("assets/img")).unwrap();
        std::fs::write(graph_dir.path().join("assets/img/cat.png"), PNG_MAGIC).unwrap();

        let previews = PreviewRegistry::new();
        let graph = StaticGraphLocator::new(graph_dir.path());
        let block = Uuid::new_v4();

        let resolved = resolve_image("../assets/img/cat.png", block, &graph, &previews)
            .await
            .unwrap();

        assert_eq!(resolved.bytes, PNG_MAGIC);
        assert_eq!(resolved.mime.as_deref(), Some("image/png"));
        assert!(resolved.preview_url.starts_with("preview://"));
        assert_eq!(previews.count_for(block), 1);
    }

    #[tokio::test]
    async fn missing_graph_directory_is_its_own_failure() {
        let previews = PreviewRegistry::new();
        let graph = StaticGraphLocator::unavailable();

        let err = resolve_image("assets/img/cat.png", Uuid::new_v4(), &graph, &previews)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::GraphUnavailable));
    }

    #[tokio::test]
    async fn unresolvable_references_are_unsupported() {
        let previews = PreviewRegistry::new();
        let graph = StaticGraphLocator::new("/tmp");

        for reference in ["notes/pic.png", "", "   "] {
            let err = resolve_image(reference, Uuid::new_v4(), &graph, &previews)
                .await
                .unwrap_err();
            assert!(
                matches!(err, WorkflowError::UnsupportedReference(_)),
                "reference: {reference:?}"
            );
        }
    }

    #[tokio::test]
    async fn missing_asset_file_is_a_fetch_failure() {
        let graph_dir = tempfile::tempdir().unwrap();
        let previews = PreviewRegistry::new();
        let graph = StaticGraphLocator::new(graph_dir.path());

        let err = resolve_image("assets/img/gone.png", Uuid::new_v4(), &graph, &previews)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Fetch(_)));
        assert_eq!(previews.count_for(Uuid::nil()), 0);
    }

    #[test]
    fn file_urls_are_percent_encoded() {
        let url = graph_asset_file_url(Path::new("/home/u/my graph"), "assets/img/a b.png");
        assert_eq!(url, "file:///home/u/my%20graph/assets/img/a%20b.png");
    }
}
