//! Core of Thumbwand: pulls a YouTube thumbnail through a CORS relay, hands it
//! to Gemini together with an edit instruction and keeps the editor state the
//! desktop shell renders.

pub mod auth;
pub mod config;
pub mod data_url;
pub mod editor;
pub mod error;
pub mod fetch;
pub mod gemini;
pub mod youtube;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{AuthGate, CredentialHost};
pub use config::Settings;
pub use data_url::EncodedImage;
pub use editor::{AuthStatus, Download, Editor, EditorState, EditorStatus};
pub use error::{ConfigError, EditError, FetchError};
pub use fetch::{ImageSource, RelayFetcher};
pub use gemini::{GeminiEditor, ImageEditor};
pub use youtube::{extract_video_id, thumbnail_url, ThumbnailQuality};
