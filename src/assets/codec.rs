//! Binary payload <-> data-URL/base64 conversions and MIME guessing.
//!
//! Includes:
//! - Data-URL decoding as an explicit two-branch parse (never an error)
//! - Data-URL / base64 encoding
//! - MIME and extension guessing from names, URLs, or magic bytes

use crate::common::DEFAULT_EXTENSION;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use regex::Regex;
use std::sync::LazyLock;

const EXTENSION_FROM_MIME: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
    ("image/svg+xml", "svg"),
    ("image/bmp", "bmp"),
];

const MIME_FROM_EXTENSION: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("bmp", "image/bmp"),
];

static DATA_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^data:(.*?);base64,(.*)$").unwrap());

// ────────────────────────────────────────────────────────────────
// Data-URL decoding
// ────────────────────────────────────────────────────────────────

/// Result of decoding a `data:` URL: either the grammar matched, or the
/// whole input was treated as the payload itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataUrlPayload {
    Parsed { mime: Option<String>, bytes: Vec<u8> },
    Raw { bytes: Vec<u8> },
}

impl DataUrlPayload {
    pub fn mime(&self) -> Option<&str> {
        match self {
            Self::Parsed { mime, .. } => mime.as_deref(),
            Self::Raw { .. } => None,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Parsed { bytes, .. } | Self::Raw { bytes } => bytes,
        }
    }
}

/// Decode a `data:<mime>;base64,<payload>` string.
///
/// A missing MIME yields untyped bytes. Input that does not match the
/// grammar falls back to interpreting the whole string as the payload:
/// base64 if it decodes, its literal bytes otherwise.
pub fn decode_data_url(input: &str) -> DataUrlPayload {
    if let Some(captures) = DATA_URL_RE.captures(input) {
        let mime = captures
            .get(1)
            .map(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .map(str::to_string);
        let payload = captures.get(2).map_or("", |m| m.as_str());
        let bytes = BASE64
            .decode(payload)
            .unwrap_or_else(|_| payload.as_bytes().to_vec());
        return DataUrlPayload::Parsed { mime, bytes };
    }
    let bytes = BASE64
        .decode(input)
        .unwrap_or_else(|_| input.as_bytes().to_vec());
    DataUrlPayload::Raw { bytes }
}

// ────────────────────────────────────────────────────────────────
// Encoding
// ────────────────────────────────────────────────────────────────

/// Inline data-URL form of a binary payload.
pub fn encode_data_url(bytes: &[u8], mime: Option<&str>) -> String {
    format!(
        "data:{};base64,{}",
        mime.unwrap_or("application/octet-stream"),
        BASE64.encode(bytes)
    )
}

/// Bare base64 - the stripped form of the data-URL payload.
pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

// ────────────────────────────────────────────────────────────────
// MIME / extension guessing
// ────────────────────────────────────────────────────────────────

/// Extension for a MIME type, falling back to the reference's trailing
/// extension, then to the crate default.
pub fn guess_extension_from_mime(mime: Option<&str>, fallback_name_or_url: Option<&str>) -> String {
    if let Some(mime) = mime {
        if let Some((_, ext)) = EXTENSION_FROM_MIME
            .iter()
            .find(|(known, _)| mime.eq_ignore_ascii_case(known))
        {
            return (*ext).to_string();
        }
    }
    if let Some(fallback) = fallback_name_or_url {
        let clean = fallback.split(['?', '#']).next().unwrap_or("");
        if let Some((_, ext)) = clean.rsplit_once('.') {
            if !ext.is_empty() && !ext.contains('/') {
                return ext.to_ascii_lowercase();
            }
        }
    }
    DEFAULT_EXTENSION.to_string()
}

/// MIME for a path based on its extension; octet-stream when unknown.
pub fn guess_mime_from_path(path: &str) -> String {
    let clean = path.to_ascii_lowercase();
    let clean = clean.split(['?', '#']).next().unwrap_or("");
    let ext = clean.rsplit_once('.').map(|(_, ext)| ext).unwrap_or(clean);
    MIME_FROM_EXTENSION
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| (*mime).to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// MIME guessed from a URL's trailing extension; `None` when there is no
/// extension to read.
pub fn guess_mime_from_url(url: &str) -> Option<String> {
    let target = url.trim();
    if target.is_empty() || !target.contains('.') {
        return None;
    }
    Some(guess_mime_from_path(target))
}

/// Sniff an image MIME from magic bytes. `None` when the content is not
/// a recognized image format.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    Some(format.to_mime_type())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn data_url_round_trips_bytes_and_mime() {
        let payloads: &[&[u8]] = &[b"", b"\x00\x01\x02", b"hello world", PNG_MAGIC];
        for payload in payloads {
            for mime in ["image/png", "image/webp", "application/octet-stream"] {
                let encoded = encode_data_url(payload, Some(mime));
                match decode_data_url(&encoded) {
                    DataUrlPayload::Parsed { mime: decoded_mime, bytes } => {
                        assert_eq!(bytes.as_slice(), *payload);
                        assert_eq!(decoded_mime.as_deref(), Some(mime));
                    }
                    DataUrlPayload::Raw { .. } => panic!("round trip lost the grammar"),
                }
            }
        }
    }

    #[test]
    fn missing_mime_decodes_as_untyped_bytes() {
        let decoded = decode_data_url("data:;base64,AQID");
        assert_eq!(decoded.mime(), None);
        assert_eq!(decoded.into_bytes(), vec![1, 2, 3]);
    }

    #[test]
    fn non_matching_input_falls_back_to_the_raw_payload() {
        // Valid base64 without the data: grammar decodes as base64.
        let decoded = decode_data_url("AQID");
        assert_eq!(decoded, DataUrlPayload::Raw { bytes: vec![1, 2, 3] });

        // Anything else keeps its literal bytes; never an error.
        let decoded = decode_data_url("not base64!!");
        assert_eq!(
            decoded,
            DataUrlPayload::Raw {
                bytes: b"not base64!!".to_vec()
            }
        );
    }

    #[test]
    fn base64_encoding_is_the_stripped_payload() {
        let encoded = encode_data_url(b"\x01\x02\x03", Some("image/png"));
        let stripped = encode_base64(b"\x01\x02\x03");
        assert!(encoded.ends_with(&stripped));
        assert_eq!(stripped, "AQID");
    }

    #[test]
    fn extension_guessing_prefers_the_mime_table() {
        assert_eq!(guess_extension_from_mime(Some("image/jpeg"), None), "jpg");
        assert_eq!(
            guess_extension_from_mime(Some("image/x-unknown"), Some("https://h/pic.WEBP?v=2")),
            "webp"
        );
        assert_eq!(
            guess_extension_from_mime(None, Some("https://cdn.example/noext")),
            "png"
        );
        assert_eq!(guess_extension_from_mime(None, None), "png");
    }

    #[test]
    fn mime_guessing_from_paths_and_urls() {
        assert_eq!(guess_mime_from_path("assets/img/cat.PNG"), "image/png");
        assert_eq!(
            guess_mime_from_path("archive.tar"),
            "application/octet-stream"
        );
        assert_eq!(
            guess_mime_from_url("https://cdn/x.webp").as_deref(),
            Some("image/webp")
        );
        assert_eq!(guess_mime_from_url("https://cdn/x"), None);
        assert_eq!(guess_mime_from_url(""), None);
    }

    #[test]
    fn sniffing_recognizes_magic_bytes() {
        assert_eq!(sniff_mime(PNG_MAGIC), Some("image/png"));
        assert_eq!(sniff_mime(b"plain text"), None);
    }
}
