//! Fakes for the injected seams.

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::auth::CredentialHost;
use crate::data_url::EncodedImage;
use crate::error::{EditError, FetchError};
use crate::fetch::ImageSource;
use crate::gemini::ImageEditor;

pub(crate) fn jpeg(data: &str) -> EncodedImage {
    EncodedImage::new("image/jpeg", data)
}

pub(crate) struct FakeHost {
    pub failures_left: AtomicUsize,
    pub attempts: AtomicUsize,
    pub selected: AtomicBool,
    pub broken: bool,
    pub key: String,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            failures_left: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
            selected: AtomicBool::new(false),
            broken: false,
            key: "host-key".to_string(),
        }
    }
}

impl FakeHost {
    pub fn selected(key: &str) -> Self {
        Self {
            selected: AtomicBool::new(true),
            key: key.to_string(),
            ..Self::default()
        }
    }

    pub fn failing(times: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(times),
            ..Self::default()
        }
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl CredentialHost for FakeHost {
    async fn has_selected_key(&self) -> anyhow::Result<bool> {
        if self.broken {
            return Err(anyhow!("credential host unavailable"));
        }
        Ok(self.selected.load(Ordering::SeqCst))
    }

    async fn open_select_key(&self) -> anyhow::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failing {
            return Err(anyhow!("Requested entity was not found."));
        }
        self.selected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn selected_key(&self) -> Option<String> {
        self.selected
            .load(Ordering::SeqCst)
            .then(|| self.key.clone())
    }
}

/// Serves the current image for every URL, or fails with `status` when set.
/// While a gate is held each call parks until the gate is notified.
pub(crate) struct FakeSource {
    pub requests: Mutex<Vec<String>>,
    pub image: Mutex<EncodedImage>,
    pub status: Option<StatusCode>,
    pub gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeSource {
    pub fn serving(image: EncodedImage) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            image: Mutex::new(image),
            status: None,
            gate: Mutex::new(None),
        }
    }

    pub fn failing(status: StatusCode) -> Self {
        Self {
            status: Some(status),
            ..Self::serving(jpeg(""))
        }
    }

    pub fn serve(&self, image: EncodedImage) {
        *self.image.lock() = image;
    }

    pub fn hold(&self, gate: Arc<Notify>) {
        *self.gate.lock() = Some(gate);
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ImageSource for FakeSource {
    async fn fetch_base64(&self, url: &str) -> Result<EncodedImage, FetchError> {
        self.requests.lock().push(url.to_string());
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.status {
            Some(status) => Err(FetchError::Status { status }),
            None => Ok(self.image.lock().clone()),
        }
    }
}

/// Answers with `reply`, or with [`EditError::NoImage`] when it is `None`.
/// When a gate is set each call parks until the gate is notified.
pub(crate) struct FakeEditor {
    pub calls: Mutex<Vec<(EncodedImage, String)>>,
    pub reply: Option<EncodedImage>,
    pub gate: Option<Arc<Notify>>,
}

impl FakeEditor {
    pub fn replying(reply: Option<EncodedImage>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reply,
            gate: None,
        }
    }

    pub fn gated(reply: EncodedImage, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::replying(Some(reply))
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ImageEditor for FakeEditor {
    async fn edit(&self, image: &EncodedImage, prompt: &str) -> Result<EncodedImage, EditError> {
        self.calls.lock().push((image.clone(), prompt.to_string()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.reply.clone().ok_or(EditError::NoImage)
    }
}
