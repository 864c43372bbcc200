//! Image encoding for inline message parts.
//!
//! Every [`EncodedImage`] carries an `image/*` MIME type. When the source
//! does not reveal one, [`FALLBACK_MIME_TYPE`] is used.

use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::{ParleyError, Result};
use crate::types::Part;
use crate::util::timeout::within;

pub const FALLBACK_MIME_TYPE: &str = "image/jpeg";

/// Default deadline for downloading an image.
pub const IMAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Base64 image payload paired with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub data: String,
    pub mime_type: String,
}

impl EncodedImage {
    /// Decode the payload back to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| ParleyError::Decode(format!("invalid base64 image data: {e}")))
    }

    /// Inline part for this image, or `None` if data or MIME type is empty.
    pub fn to_part(&self) -> Option<Part> {
        if self.data.is_empty() || self.mime_type.is_empty() {
            return None;
        }
        Some(Part::inline_data(&self.mime_type, &self.data))
    }
}

/// Turns remote or local images into [`EncodedImage`]s.
#[derive(Debug, Clone)]
pub struct MediaEncoder {
    client: reqwest::Client,
    timeout: Duration,
}

impl MediaEncoder {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: IMAGE_FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Download an image and encode it.
    ///
    /// The MIME type comes from `Content-Type` when that names an image,
    /// then from the URL path's extension.
    pub async fn encode_from_url(&self, url: &str) -> Result<EncodedImage> {
        let url = Url::parse(url)?;
        info!(%url, "downloading image");

        let image = within(self.timeout, "image download", async {
            let resp = self.client.get(url.clone()).send().await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(ParleyError::http(status.as_u16(), body));
            }
            let content_type = resp
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let bytes = resp.bytes().await?;
            let mime_type = resolve_mime_type(content_type.as_deref(), url.path());
            Ok(encode(&bytes, mime_type))
        })
        .await?;

        debug!(mime_type = %image.mime_type, encoded_len = image.data.len(), "image encoded");
        Ok(image)
    }

    /// Encode bytes whose type is already known, e.g. a user-selected file.
    pub fn encode_from_bytes(bytes: &[u8], declared_mime_type: &str) -> EncodedImage {
        encode(bytes, declared_image_mime(declared_mime_type))
    }

    /// Read and encode a local image file.
    ///
    /// Without a declared type the MIME type is guessed from the extension.
    pub async fn encode_from_path(
        path: impl AsRef<Path>,
        declared_mime_type: Option<&str>,
    ) -> Result<EncodedImage> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let mime_type = declared_mime_type
            .and_then(image_essence)
            .or_else(|| guess_image_mime(&path.to_string_lossy()))
            .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string());
        debug!(path = %path.display(), %mime_type, "encoding local image");
        Ok(encode(&bytes, mime_type))
    }
}

fn encode(bytes: &[u8], mime_type: String) -> EncodedImage {
    EncodedImage {
        data: STANDARD.encode(bytes),
        mime_type,
    }
}

/// Pick the MIME type for a downloaded image.
pub fn resolve_mime_type(content_type: Option<&str>, path: &str) -> String {
    content_type
        .and_then(image_essence)
        .or_else(|| guess_image_mime(path))
        .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string())
}

/// MIME type an image declared as `declared` is sent with.
pub fn declared_image_mime(declared: &str) -> String {
    image_essence(declared).unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string())
}

/// Image MIME type implied by a path's extension.
pub fn guess_image_mime(path: &str) -> Option<String> {
    mime_guess::from_path(path)
        .first_raw()
        .filter(|mime| mime.starts_with("image/"))
        .map(str::to_string)
}

/// `image/png; q=1` -> `image/png`; non-image types are rejected.
fn image_essence(content_type: &str) -> Option<String> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.strip_prefix("image/") {
        Some(subtype) if !subtype.is_empty() => Some(essence),
        _ => None,
    }
}
