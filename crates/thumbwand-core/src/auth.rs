use async_trait::async_trait;
use std::env;
use std::sync::Arc;
use tracing::warn;

/// Host-side credential capability: reports whether an API key has been
/// chosen and runs the interactive flow that chooses one.
#[async_trait]
pub trait CredentialHost: Send + Sync {
    async fn has_selected_key(&self) -> anyhow::Result<bool>;

    async fn open_select_key(&self) -> anyhow::Result<()>;

    fn selected_key(&self) -> Option<String>;
}

/// Decides whether the session can talk to Gemini. Prefers the injected host
/// and falls back to an environment variable when there is none.
pub struct AuthGate {
    host: Option<Arc<dyn CredentialHost>>,
    api_key_env: String,
}

impl AuthGate {
    pub fn new(host: Option<Arc<dyn CredentialHost>>, api_key_env: impl Into<String>) -> Self {
        Self {
            host,
            api_key_env: api_key_env.into(),
        }
    }

    pub fn env_only(api_key_env: impl Into<String>) -> Self {
        Self::new(None, api_key_env)
    }

    pub async fn check(&self) -> anyhow::Result<bool> {
        match &self.host {
            Some(host) => host.has_selected_key().await,
            None => Ok(self.env_key().is_some()),
        }
    }

    pub async fn select(&self) -> anyhow::Result<()> {
        match &self.host {
            Some(host) => host.open_select_key().await,
            None => {
                warn!(
                    env = %self.api_key_env,
                    "no credential host available, set the API key in the environment"
                );
                Ok(())
            }
        }
    }

    /// Resolved on every call so a freshly selected key takes effect
    /// immediately.
    pub fn api_key(&self) -> Option<String> {
        self.host
            .as_ref()
            .and_then(|host| host.selected_key())
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.env_key())
    }

    fn env_key(&self) -> Option<String> {
        env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}
