use rfd::AsyncFileDialog;
use tauri::{AppHandle, Emitter, State};
use thumbwand_core::{AuthStatus, EditorState};
use tracing::{error, info};

use crate::config::AppState;

fn emit_auth(app: &AppHandle, status: AuthStatus) {
    app.emit("auth_status", status).unwrap_or_else(|e| {
        error!("Emit error: {}", e);
    });
}

#[tauri::command]
pub async fn check_auth(app: AppHandle, state: State<'_, AppState>) -> Result<AuthStatus, String> {
    let status = state.editor.check_auth().await;
    emit_auth(&app, status);
    Ok(status)
}

#[tauri::command]
pub async fn login(app: AppHandle, state: State<'_, AppState>) -> Result<AuthStatus, String> {
    let status = state.editor.login().await;
    emit_auth(&app, status);
    Ok(status)
}

#[tauri::command]
pub fn editor_state(state: State<'_, AppState>) -> EditorState {
    state.editor.state()
}

#[tauri::command]
pub fn set_url(url: String, state: State<'_, AppState>) {
    state.editor.set_url(&url);
}

#[tauri::command]
pub fn set_prompt(prompt: String, state: State<'_, AppState>) {
    state.editor.set_prompt(&prompt);
}

#[tauri::command]
pub async fn fetch_thumbnail(url: String, state: State<'_, AppState>) -> Result<EditorState, String> {
    Ok(state.editor.fetch(&url).await)
}

#[tauri::command]
pub async fn generate_edit(prompt: String, state: State<'_, AppState>) -> Result<EditorState, String> {
    Ok(state.editor.generate(&prompt).await)
}

/// Asks where to save the edited image. Returns the written path, or an
/// empty string when there is nothing to save or the dialog was cancelled.
#[tauri::command]
pub async fn download_image(state: State<'_, AppState>) -> Result<String, String> {
    let Some(download) = state.editor.download() else {
        return Ok(String::new());
    };
    let bytes = download.bytes().map_err(|e| e.to_string())?;

    let target = AsyncFileDialog::new()
        .set_file_name(download.file_name.as_str())
        .add_filter("JPEG image", &["jpg", "jpeg"])
        .save_file()
        .await;

    match target {
        Some(handle) => {
            tokio::fs::write(handle.path(), &bytes)
                .await
                .map_err(|e| format!("Failed to save image: {}", e))?;
            info!(path = %handle.path().display(), "edited image saved");
            Ok(handle.path().display().to_string())
        }
        None => Ok(String::new()),
    }
}
