use base64::engine::general_purpose::STANDARD as BASE64;
use base64::{DecodeError, Engine as _};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIME: &str = "image/jpeg";

/// Builds a `data:{mime};base64,...` URI from raw bytes.
pub fn encode(mime_type: &str, bytes: &[u8]) -> String {
    embed(mime_type, &BASE64.encode(bytes))
}

/// Wraps an already encoded payload in a data URI.
pub fn embed(mime_type: &str, data: &str) -> String {
    format!("data:{};base64,{}", mime_type, data)
}

/// Everything after the first comma, i.e. the data URI without its
/// scheme and mime prefix.
pub fn strip_prefix(data_url: &str) -> Option<&str> {
    data_url.split_once(',').map(|(_, data)| data)
}

pub fn decode(data: &str) -> Result<Vec<u8>, DecodeError> {
    BASE64.decode(data)
}

/// A base64 image payload and the mime type it was served with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

impl EncodedImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        let mime_type = mime_type.into();
        let url = encode(&mime_type, bytes);
        let data = strip_prefix(&url).unwrap_or_default().to_string();
        Self { mime_type, data }
    }

    pub fn to_data_url(&self) -> String {
        embed(&self.mime_type, &self.data)
    }

    pub fn bytes(&self) -> Result<Vec<u8>, DecodeError> {
        decode(&self.data)
    }
}
