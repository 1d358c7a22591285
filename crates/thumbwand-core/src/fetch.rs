use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::data_url::{EncodedImage, DEFAULT_MIME};
use crate::error::FetchError;

/// Anything that can hand back a remote image as base64.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch_base64(&self, url: &str) -> Result<EncodedImage, FetchError>;
}

/// Fetches images through a CORS relay (`{relay}/raw?url=...`), since the
/// thumbnail host does not let a webview read the bytes directly.
pub struct RelayFetcher {
    client: Client,
    relay_url: String,
}

impl RelayFetcher {
    pub fn new(relay_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            relay_url: relay_url.into(),
        }
    }

    pub fn proxied_url(&self, target: &str) -> Result<Url, FetchError> {
        let base = format!("{}/raw", self.relay_url.trim_end_matches('/'));
        Ok(Url::parse_with_params(&base, &[("url", target)])?)
    }
}

#[async_trait]
impl ImageSource for RelayFetcher {
    async fn fetch_base64(&self, url: &str) -> Result<EncodedImage, FetchError> {
        let proxied = self.proxied_url(url)?;
        debug!(%proxied, "fetching image through relay");

        let response = self.client.get(proxied).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .filter(|value| value.starts_with("image/"))
            .unwrap_or_else(|| DEFAULT_MIME.to_string());

        let bytes = response.bytes().await?;
        debug!(len = bytes.len(), %mime_type, "image fetched");
        Ok(EncodedImage::from_bytes(mime_type, &bytes))
    }
}
