use base64::DecodeError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::auth::{AuthGate, CredentialHost};
use crate::config::Settings;
use crate::data_url::{self, EncodedImage};
use crate::fetch::{ImageSource, RelayFetcher};
use crate::gemini::{GeminiEditor, ImageEditor};
use crate::youtube::{extract_video_id, thumbnail_url, ThumbnailQuality};

pub const INVALID_URL_MESSAGE: &str = "Invalid YouTube URL. Please double-check the link.";
pub const FETCH_FAILED_MESSAGE: &str =
    "Could not fetch thumbnail. The video might not have a high-res thumbnail or is restricted.";
pub const GENERATE_FAILED_MESSAGE: &str =
    "Failed to edit image. Please try a different prompt or check the console.";

pub const DOWNLOAD_FILE_NAME: &str = "edited-thumbnail.jpg";
const DOWNLOAD_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthStatus {
    #[default]
    CheckingAuth,
    Authenticated,
    Unauthenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorStatus {
    #[default]
    Idle,
    Fetching,
    Generating,
    Error,
}

/// Everything the shell needs to render the editor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    pub url: String,
    pub prompt: String,
    pub video_id: Option<String>,
    pub original_image: Option<EncodedImage>,
    pub generated_image: Option<EncodedImage>,
    pub status: EditorStatus,
    /// Empty unless `status` is [`EditorStatus::Error`].
    pub error_message: String,
}

impl EditorState {
    fn fail(&mut self, message: &str) {
        self.status = EditorStatus::Error;
        self.error_message = message.to_string();
    }
}

/// A generated image ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Download {
    pub file_name: String,
    pub data_url: String,
    #[serde(skip)]
    data: String,
}

impl Download {
    pub fn bytes(&self) -> Result<Vec<u8>, DecodeError> {
        data_url::decode(&self.data)
    }
}

#[derive(Default)]
struct Inner {
    state: EditorState,
    /// Bumped when a fetch starts. A fetch completion carrying an older
    /// ticket is dropped.
    fetch_epoch: u64,
    /// Bumped when a generate starts and when a fetch starts, since an edit
    /// belongs to the thumbnail it was made from.
    generate_epoch: u64,
    fetching: bool,
    generating: bool,
}

impl Inner {
    fn start_fetch(&mut self) -> u64 {
        self.fetch_epoch += 1;
        self.generate_epoch += 1;
        self.fetching = true;
        self.generating = false;
        self.fetch_epoch
    }

    fn start_generate(&mut self) -> u64 {
        self.generate_epoch += 1;
        self.generating = true;
        self.generate_epoch
    }

    /// Status once one operation has settled and the other may still be
    /// running.
    fn settled_status(&self) -> EditorStatus {
        if self.fetching {
            EditorStatus::Fetching
        } else if self.generating {
            EditorStatus::Generating
        } else {
            EditorStatus::Idle
        }
    }
}

/// Drives fetch → edit → download. Each operation runs to completion and
/// returns the resulting snapshot; every change is also published to
/// [`Editor::subscribe`] receivers.
pub struct Editor {
    images: Arc<dyn ImageSource>,
    edits: Arc<dyn ImageEditor>,
    auth: Arc<AuthGate>,
    quality: ThumbnailQuality,
    inner: Mutex<Inner>,
    auth_status: Mutex<AuthStatus>,
    changes: watch::Sender<EditorState>,
}

impl Editor {
    pub fn new(
        images: Arc<dyn ImageSource>,
        edits: Arc<dyn ImageEditor>,
        auth: Arc<AuthGate>,
    ) -> Self {
        let (changes, _) = watch::channel(EditorState::default());
        Self {
            images,
            edits,
            auth,
            quality: ThumbnailQuality::default(),
            inner: Mutex::new(Inner::default()),
            auth_status: Mutex::new(AuthStatus::CheckingAuth),
            changes,
        }
    }

    /// Wires the relay fetcher and Gemini client described by `settings`.
    pub fn from_settings(settings: &Settings, host: Option<Arc<dyn CredentialHost>>) -> Self {
        let auth = Arc::new(AuthGate::new(host, settings.api_key_env.clone()));
        let images = Arc::new(RelayFetcher::new(settings.relay_url.clone()));
        let edits = Arc::new(GeminiEditor::new(settings, auth.clone()));
        Self::new(images, edits, auth).with_quality(settings.thumbnail_quality)
    }

    pub fn with_quality(mut self, quality: ThumbnailQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<EditorState> {
        self.changes.subscribe()
    }

    pub fn state(&self) -> EditorState {
        self.inner.lock().state.clone()
    }

    pub fn auth_status(&self) -> AuthStatus {
        *self.auth_status.lock()
    }

    pub fn set_url(&self, url: &str) {
        self.update(|state| state.url = url.to_string());
    }

    pub fn set_prompt(&self, prompt: &str) {
        self.update(|state| state.prompt = prompt.to_string());
    }

    pub async fn check_auth(&self) -> AuthStatus {
        *self.auth_status.lock() = AuthStatus::CheckingAuth;
        let resolved = match self.auth.check().await {
            Ok(true) => AuthStatus::Authenticated,
            Ok(false) => AuthStatus::Unauthenticated,
            Err(e) => {
                error!(error = %e, "Auth check failed");
                AuthStatus::Unauthenticated
            }
        };
        *self.auth_status.lock() = resolved;
        resolved
    }

    /// Runs the credential selection flow, retrying it once if it fails, and
    /// re-checks auth whatever the outcome.
    pub async fn login(&self) -> AuthStatus {
        if let Err(e) = self.auth.select().await {
            warn!(error = %e, "Login failed, retrying key selection");
            if let Err(e) = self.auth.select().await {
                error!(error = %e, "Key selection failed again");
            }
        }
        self.check_auth().await
    }

    pub async fn fetch(&self, url: &str) -> EditorState {
        let (ticket, video_id) = {
            let mut inner = self.inner.lock();
            if inner.fetching {
                debug!("fetch already in flight");
                return inner.state.clone();
            }
            let ticket = inner.start_fetch();
            let state = &mut inner.state;
            state.url = url.to_string();
            state.error_message.clear();
            state.generated_image = None;
            state.video_id = extract_video_id(url);

            let Some(video_id) = state.video_id.clone() else {
                warn!(url, "no video id in submitted url");
                state.fail(INVALID_URL_MESSAGE);
                inner.fetching = false;
                return self.publish(&inner);
            };
            state.status = EditorStatus::Fetching;
            self.publish(&inner);
            (ticket, video_id)
        };

        let thumbnail = thumbnail_url(&video_id, self.quality);
        info!(%video_id, %thumbnail, "fetching thumbnail");
        let result = self.images.fetch_base64(&thumbnail).await;

        let mut inner = self.inner.lock();
        if inner.fetch_epoch != ticket {
            debug!(%video_id, "discarding stale thumbnail");
            return inner.state.clone();
        }
        inner.fetching = false;
        match result {
            Ok(image) => {
                let status = inner.settled_status();
                inner.state.original_image = Some(image);
                inner.state.status = status;
            }
            Err(e) => {
                error!(error = %e, %thumbnail, "thumbnail fetch failed");
                inner.state.fail(FETCH_FAILED_MESSAGE);
            }
        }
        self.publish(&inner)
    }

    /// Does nothing until a thumbnail is loaded and the prompt has text.
    pub async fn generate(&self, prompt: &str) -> EditorState {
        let (ticket, original, prompt) = {
            let mut inner = self.inner.lock();
            inner.state.prompt = prompt.to_string();
            if inner.generating {
                debug!("generation already in flight");
                return self.publish(&inner);
            }
            let original = match &inner.state.original_image {
                Some(original) if !prompt.trim().is_empty() => original.clone(),
                _ => return self.publish(&inner),
            };
            let ticket = inner.start_generate();
            let state = &mut inner.state;
            state.error_message.clear();
            state.generated_image = None;
            state.status = EditorStatus::Generating;
            self.publish(&inner);
            (ticket, original, prompt.to_string())
        };

        info!(prompt_len = prompt.len(), "generating edit");
        let result = self.edits.edit(&original, &prompt).await;

        let mut inner = self.inner.lock();
        if inner.generate_epoch != ticket {
            debug!("discarding stale edit");
            return inner.state.clone();
        }
        inner.generating = false;
        match result {
            Ok(image) => {
                let status = inner.settled_status();
                inner.state.generated_image = Some(image);
                inner.state.status = status;
            }
            Err(e) => {
                error!(error = %e, "edit failed");
                inner.state.fail(GENERATE_FAILED_MESSAGE);
            }
        }
        self.publish(&inner)
    }

    pub fn download(&self) -> Option<Download> {
        let inner = self.inner.lock();
        let generated = inner.state.generated_image.as_ref()?;
        Some(Download {
            file_name: DOWNLOAD_FILE_NAME.to_string(),
            data_url: data_url::embed(DOWNLOAD_MIME, &generated.data),
            data: generated.data.clone(),
        })
    }

    fn update(&self, apply: impl FnOnce(&mut EditorState)) {
        let mut inner = self.inner.lock();
        apply(&mut inner.state);
        self.publish(&inner);
    }

    fn publish(&self, inner: &Inner) -> EditorState {
        let snapshot = inner.state.clone();
        self.changes.send_replace(snapshot.clone());
        snapshot
    }
}
