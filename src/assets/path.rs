//! Pure normalization for heterogeneous image references.
//!
//! Includes:
//! - Pseudo-scheme stripping and `assets/` anchoring
//! - Relative storage-key computation between asset directories
//! - File-name extraction

use crate::common::FALLBACK_FILE_NAME;
use regex::Regex;
use std::sync::LazyLock;

static PSEUDO_SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:ls-asset|assets)://").unwrap());
static FILE_SCHEME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^file://").unwrap());
static ASSETS_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|/)assets/").unwrap());
static LEADING_PARENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\.\./)+").unwrap());
static LEADING_DOT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\./").unwrap());
static LEADING_SLASH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^/+").unwrap());
static TRAILING_EXT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\.[a-z0-9]+$").unwrap());

// ────────────────────────────────────────────────────────────────
// Asset path normalization
// ────────────────────────────────────────────────────────────────

/// Normalize any image reference into a graph-relative `assets/...` path.
///
/// Strips the host's pseudo schemes (`ls-asset://`, `assets://`,
/// `file://`), anchors at the first `assets/` segment, then drops leading
/// `../`, `./` and `/` runs. Returns `None` when no `assets/`-rooted path
/// remains. Idempotent.
pub fn normalize_asset_path(input: &str) -> Option<String> {
    let mut normalized = input.trim().to_string();
    if normalized.is_empty() {
        return None;
    }

    normalized = PSEUDO_SCHEME_RE.replace(&normalized, "").into_owned();
    normalized = FILE_SCHEME_RE.replace(&normalized, "").into_owned();

    if let Some(found) = ASSETS_SEGMENT_RE.find(&normalized) {
        normalized = normalized[found.start()..].to_string();
    }

    normalized = LEADING_PARENT_RE.replace(&normalized, "").into_owned();
    normalized = LEADING_DOT_RE.replace(&normalized, "").into_owned();
    normalized = LEADING_SLASH_RE.replace(&normalized, "").into_owned();

    let rooted = normalized
        .get(..7)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("assets/"));
    if rooted { Some(normalized) } else { None }
}

/// Shortest `../`-relative path from the plugin's storage prefix to a
/// normalized asset path: one `..` per source segment left after the
/// longest common case-insensitive prefix, then the remaining target
/// segments. `None` when the target has no segments.
pub fn compute_relative_storage_key(
    plugin_assets_prefix: &str,
    target_asset_path: &str,
) -> Option<String> {
    let from = segments(plugin_assets_prefix);
    let to = segments(target_asset_path);
    if to.is_empty() {
        return None;
    }

    let mut idx = 0;
    while idx < from.len() && idx < to.len() {
        if !from[idx].eq_ignore_ascii_case(to[idx]) {
            break;
        }
        idx += 1;
    }

    let mut relative: Vec<&str> = vec![".."; from.len() - idx];
    relative.extend(&to[idx..]);
    if relative.is_empty() {
        return None;
    }
    Some(relative.join("/"))
}

fn segments(path: &str) -> Vec<&str> {
    path.trim_end_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect()
}

// ────────────────────────────────────────────────────────────────
// File names
// ────────────────────────────────────────────────────────────────

/// Last path segment of a URL or path, query and fragment ignored.
/// Falls back to a fixed literal when nothing usable remains.
pub fn extract_file_name(path_or_url: &str) -> String {
    file_name_from_url(path_or_url).unwrap_or_else(|| FALLBACK_FILE_NAME.to_string())
}

/// Like [`extract_file_name`] but refuses data URIs and empty input, for
/// callers that need a real name rather than the fallback.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim();
    let is_data_uri = trimmed
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"));
    if trimmed.is_empty() || is_data_uri {
        return None;
    }
    let clean = trimmed.split(['?', '#']).next()?;
    let candidate = clean.rsplit(['/', '\\']).next()?.trim();
    (!candidate.is_empty()).then(|| candidate.to_string())
}

/// Whether `name` ends in a plain `.ext` suffix worth keeping.
pub fn has_recognizable_extension(name: &str) -> bool {
    TRAILING_EXT_RE.is_match(name)
}
