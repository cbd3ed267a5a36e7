//! Remote compression endpoint client.
//!
//! The endpoint is opaque: it accepts a multipart image and answers with
//! either a JSON descriptor pointing at a hosted result, or the
//! compressed binary itself. Interpretation of the body is a pure
//! function so both shapes stay testable without a server.

use crate::assets::codec;
use crate::common::errors::WorkflowError;
use async_trait::async_trait;
use serde::Deserialize;

/// JSON descriptor shape for a remote-hosted compression result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteDescriptor {
    compressed_url: String,
    compressed_preview_url: Option<String>,
    size: Option<String>,
    mime: Option<String>,
}

/// How the endpoint answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionOutcome {
    /// The service hosts the result; we only got told where.
    RemoteHosted {
        url: String,
        preview_url: String,
        size_label: Option<String>,
        mime: Option<String>,
    },
    /// The response body was the compressed image itself.
    InlineBinary {
        bytes: Vec<u8>,
        mime: Option<String>,
    },
}

/// Seam over the remote compression HTTP service.
#[async_trait]
pub trait CompressionService: Send + Sync {
    async fn compress(
        &self,
        server_url: &str,
        image: Vec<u8>,
        file_name: String,
    ) -> Result<CompressionOutcome, WorkflowError>;
}

/// Production client: POSTs the image as multipart form data under the
/// `image` field.
#[derive(Default)]
pub struct HttpCompressionService {
    client: reqwest::Client,
}

impl HttpCompressionService {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompressionService for HttpCompressionService {
    async fn compress(
        &self,
        server_url: &str,
        image: Vec<u8>,
        file_name: String,
    ) -> Result<CompressionOutcome, WorkflowError> {
        let part = reqwest::multipart::Part::bytes(image).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("image", part);

        let response = self
            .client
            .post(server_url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| WorkflowError::Fetch(err.to_string()))?;
        if !response.status().is_success() {
            return Err(WorkflowError::Fetch(format!(
                "compression endpoint returned {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|err| WorkflowError::Fetch(err.to_string()))?;

        interpret_response(&body, content_type.as_deref())
    }
}

/// Interpret the endpoint's body. A JSON object carrying `compressedUrl`
/// means remote-hosted; anything else is the compressed binary itself.
/// Neither branch is an error - only an empty binary is.
pub fn interpret_response(
    body: &[u8],
    content_type: Option<&str>,
) -> Result<CompressionOutcome, WorkflowError> {
    if let Ok(descriptor) = serde_json::from_slice::<RemoteDescriptor>(body) {
        if !descriptor.compressed_url.is_empty() {
            let mime = descriptor
                .mime
                .clone()
                .or_else(|| codec::guess_mime_from_url(&descriptor.compressed_url));
            let preview_url = descriptor
                .compressed_preview_url
                .unwrap_or_else(|| descriptor.compressed_url.clone());
            return Ok(CompressionOutcome::RemoteHosted {
                url: descriptor.compressed_url,
                preview_url,
                size_label: descriptor.size,
                mime,
            });
        }
    }

    if body.is_empty() {
        return Err(WorkflowError::EmptyResult);
    }
    let mime = content_type
        .map(str::to_string)
        .or_else(|| codec::sniff_mime(body).map(str::to_string));
    Ok(CompressionOutcome::InlineBinary {
        bytes: body.to_vec(),
        mime,
    })
}
