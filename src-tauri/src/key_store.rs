use anyhow::{bail, Context};
use async_trait::async_trait;
use parking_lot::RwLock;
use rfd::AsyncFileDialog;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thumbwand_core::CredentialHost;
use tracing::{info, warn};

#[derive(Debug, Serialize, Deserialize, Default)]
struct StoredCredentials {
    api_key: Option<String>,
}

/// Desktop credential host: the user picks a file holding their Gemini API
/// key and the key is kept in `credentials.json` for later sessions.
pub struct KeyFileHost {
    path: PathBuf,
    key: RwLock<Option<String>>,
}

impl KeyFileHost {
    pub fn open(path: PathBuf) -> Self {
        let key = match load_key(&path) {
            Ok(key) => key,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable credentials file");
                None
            }
        };
        Self {
            path,
            key: RwLock::new(key),
        }
    }

    /// Takes the first non-blank line of `contents` as the key.
    pub fn store_key(&self, contents: &str) -> anyhow::Result<()> {
        let Some(key) = contents.lines().map(str::trim).find(|line| !line.is_empty()) else {
            bail!("selected key file is empty");
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let stored = StoredCredentials {
            api_key: Some(key.to_string()),
        };
        fs::write(&self.path, serde_json::to_string(&stored)?)
            .with_context(|| format!("failed to write {}", self.path.display()))?;

        *self.key.write() = Some(key.to_string());
        Ok(())
    }
}

fn load_key(path: &Path) -> anyhow::Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let stored: StoredCredentials = serde_json::from_str(&content)?;
    Ok(stored.api_key.filter(|key| !key.trim().is_empty()))
}

#[async_trait]
impl CredentialHost for KeyFileHost {
    async fn has_selected_key(&self) -> anyhow::Result<bool> {
        Ok(self.key.read().is_some())
    }

    async fn open_select_key(&self) -> anyhow::Result<()> {
        let picked = AsyncFileDialog::new()
            .set_title("Select your Gemini API key file")
            .add_filter("Key files", &["txt", "key"])
            .pick_file()
            .await;

        let Some(handle) = picked else {
            info!("key selection cancelled");
            return Ok(());
        };

        let contents = String::from_utf8(handle.read().await).context("key file is not valid UTF-8")?;
        self.store_key(&contents)?;
        info!(path = %handle.path().display(), "API key selected");
        Ok(())
    }

    fn selected_key(&self) -> Option<String> {
        self.key.read().clone()
    }
}
