use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::auth::AuthGate;
use crate::config::Settings;
use crate::data_url::{EncodedImage, DEFAULT_MIME};
use crate::error::EditError;

/// Turns a source image plus an instruction into an edited image.
#[async_trait]
pub trait ImageEditor: Send + Sync {
    async fn edit(&self, image: &EncodedImage, prompt: &str) -> Result<EncodedImage, EditError>;
}

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest<'a> {
    contents: RequestContent<'a>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum RequestPart<'a> {
    InlineData(InlineDataRef<'a>),
    Text(&'a str),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataRef<'a> {
    mime_type: &'a str,
    data: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    /// One inline image part followed by the instruction text.
    pub fn new(image: &'a EncodedImage, prompt: &'a str) -> Self {
        Self {
            contents: RequestContent {
                parts: vec![
                    RequestPart::InlineData(InlineDataRef {
                        mime_type: &image.mime_type,
                        data: &image.data,
                    }),
                    RequestPart::Text(prompt),
                ],
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub data: String,
}

impl GenerateContentResponse {
    /// First inline image of the first candidate.
    pub fn first_image(&self) -> Option<EncodedImage> {
        let content = self.candidates.first()?.content.as_ref()?;
        content
            .parts
            .iter()
            .filter_map(|part| part.inline_data.as_ref())
            .find(|inline| !inline.data.is_empty())
            .map(|inline| {
                let mime_type = if inline.mime_type.is_empty() {
                    DEFAULT_MIME
                } else {
                    inline.mime_type.as_str()
                };
                EncodedImage::new(mime_type, inline.data.as_str())
            })
    }

    fn text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|candidate| candidate.content.as_ref())
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Gemini `generateContent` client. The API key is looked up through the
/// [`AuthGate`] for every request and never kept here.
pub struct GeminiEditor {
    client: Client,
    api_base: String,
    model: String,
    auth: Arc<AuthGate>,
}

impl GeminiEditor {
    pub fn new(settings: &Settings, auth: Arc<AuthGate>) -> Self {
        Self {
            client: Client::new(),
            api_base: settings.api_base.clone(),
            model: settings.model.clone(),
            auth,
        }
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ImageEditor for GeminiEditor {
    async fn edit(&self, image: &EncodedImage, prompt: &str) -> Result<EncodedImage, EditError> {
        let api_key = self.auth.api_key().ok_or(EditError::MissingApiKey)?;
        let request = GenerateContentRequest::new(image, prompt);
        debug!(model = %self.model, prompt_len = prompt.len(), "sending edit request");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "Gemini API error");
            return Err(EditError::Api { status, body });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        parsed.first_image().ok_or_else(|| {
            warn!(text = %parsed.text(), "model returned no image");
            EditError::NoImage
        })
    }
}
