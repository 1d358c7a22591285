//! Thumbwand desktop shell: exposes the editor to the webview as Tauri
//! commands and mirrors its state as `editor_state` events.

mod commands;
mod config;
mod key_store;

use std::sync::Arc;
use tauri::Emitter;
use thumbwand_core::{CredentialHost, Editor, Settings};
use tracing::{error, info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::config::AppState;
use crate::key_store::KeyFileHost;

const DEFAULT_LOG_FILTER: &str = "warn,thumbwand=info,thumbwand_lib=info,thumbwand_core=info";

/// `RUST_LOG` directives when they parse, the app default otherwise.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn init_tracing() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(log_filter(directives.as_deref())))
        .init();
}

fn load_settings() -> Settings {
    let path = config::settings_path();
    match Settings::load(&path) {
        Ok(settings) => {
            if !path.exists() {
                if let Err(e) = settings.save(&path) {
                    warn!(path = %path.display(), error = %e, "could not write default settings");
                }
            }
            settings
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "falling back to default settings");
            Settings::default()
        }
    }
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_tracing();

    let settings = load_settings();
    let host: Arc<dyn CredentialHost> = Arc::new(KeyFileHost::open(config::credentials_path()));
    let editor = Arc::new(Editor::from_settings(&settings, Some(host)));
    info!(model = %settings.model, relay = %settings.relay_url, "Thumbwand starting");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .manage(AppState::new(editor.clone()))
        .setup(move |app| {
            // Forward every editor change to the webview.
            let handle = app.handle().clone();
            let mut changes = editor.subscribe();
            tauri::async_runtime::spawn(async move {
                while changes.changed().await.is_ok() {
                    let snapshot = changes.borrow_and_update().clone();
                    handle.emit("editor_state", snapshot).unwrap_or_else(|e| {
                        error!("Emit error: {}", e);
                    });
                }
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::check_auth,
            commands::login,
            commands::editor_state,
            commands::set_url,
            commands::set_prompt,
            commands::fetch_thumbnail,
            commands::generate_edit,
            commands::download_image
        ])
        .run(tauri::generate_context!())
        .expect("error while running Tauri application");
}
