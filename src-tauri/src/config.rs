use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use thumbwand_core::Editor;

const APP_DIR_NAME: &str = "thumbwand";

/// Where settings and the selected key live. Falls back to the temp dir on
/// platforms without a config directory.
pub fn app_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(env::temp_dir)
        .join(APP_DIR_NAME)
}

pub fn settings_path() -> PathBuf {
    app_dir().join("settings.json")
}

pub fn credentials_path() -> PathBuf {
    app_dir().join("credentials.json")
}

/// Shared across Tauri commands.
pub struct AppState {
    pub editor: Arc<Editor>,
}

impl AppState {
    pub fn new(editor: Arc<Editor>) -> Self {
        Self { editor }
    }
}
