//! Process-wide application context, built once at startup.

use std::sync::Arc;

use anyhow::{Context, Result};
use codebuddy_capture::{
    CaptureLoop, CaptureSettings, CaptureWorker, SystemFrameSource, SystemWindowInspector,
};
use codebuddy_config::AppConfig;
use codebuddy_core::CompletionClient;
use codebuddy_providers::{EnvCredentials, HttpModelClient, ProviderRegistry};
use codebuddy_session::{ActiveSession, SessionError, SessionStore};
use tracing::{info, warn};

use crate::inquiry::QaSettings;
use crate::terminal_output::{note_error, note_success, note_warn};

pub struct AppContext {
    pub config: AppConfig,
    pub sessions: Arc<SessionStore>,
    pub model: Arc<dyn CompletionClient>,
}

impl AppContext {
    /// Wire the real provider client and session store from `config`.
    pub fn new(config: AppConfig) -> Result<Self> {
        let registry = ProviderRegistry::with_custom(
            config.custom_providers.clone(),
            config.allow_model_shadowing,
        )
        .context("Invalid provider configuration")?;

        for (field, model) in [("visionModel", &config.vision_model), ("qaModel", &config.qa_model)] {
            if let Err(e) = registry.resolve(model) {
                warn!(field, model = %model, "Configured model has no provider");
                note_warn(&format!("{field}: {e}"));
            }
        }

        let client = HttpModelClient::new(
            Arc::new(registry),
            Arc::new(EnvCredentials),
            config.request_timeout(),
        )
        .context("Failed to build HTTP client")?;

        let sessions = SessionStore::open(&config.sessions_dir).with_context(|| {
            format!(
                "Cannot use sessions directory {}",
                config.sessions_dir.display()
            )
        })?;

        Ok(Self::with_parts(config, Arc::new(sessions), Arc::new(client)))
    }

    pub fn with_parts(
        config: AppConfig,
        sessions: Arc<SessionStore>,
        model: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            config,
            sessions,
            model,
        }
    }

    /// Create the first session, optionally continuing the most recent one.
    ///
    /// A previous session that cannot be continued is reported and a fresh
    /// session is used instead.
    pub async fn start_session(&self, continue_previous: bool) -> Result<Arc<ActiveSession>> {
        let previous = if continue_previous {
            match self.sessions.most_recent_session().await {
                Ok(Some(session)) => Some(session),
                Ok(None) => {
                    note_warn("No previous session to continue. Starting a new session.");
                    None
                }
                Err(SessionError::EmptySession { id }) => {
                    warn!(session = %id, "Previous session has no log; not continuing");
                    note_error("Failed to continue from previous session. Starting new session.");
                    None
                }
                Err(e) => return Err(e).context("Failed to list sessions"),
            }
        } else {
            None
        };

        let Some(previous) = previous else {
            return self
                .sessions
                .create_session(None)
                .await
                .context("Failed to create session");
        };

        match self.sessions.create_session(Some(&previous)).await {
            Ok(active) => {
                info!(session = %active.id(), from = %previous.id, "Continuing previous session");
                note_success("Continuing from previous session");
                Ok(active)
            }
            Err(e) => {
                warn!(error = %e, from = %previous.id, "Continuation failed");
                note_error("Failed to continue from previous session. Starting new session.");
                self.sessions
                    .create_session(None)
                    .await
                    .context("Failed to create session")
            }
        }
    }

    /// Capture loop against the real screen.
    pub fn capture_loop(&self) -> CaptureLoop {
        let settings = CaptureSettings {
            interval: self.config.capture_interval(),
            vision_model: self.config.vision_model.clone(),
            max_tokens: self.config.vision_max_tokens,
            skip_own_window: self.config.skip_own_window,
        };
        let frames = SystemFrameSource {
            max_width: self.config.max_image_width,
            max_height: self.config.max_image_height,
        };
        CaptureLoop::new(CaptureWorker::new(
            Arc::clone(&self.sessions),
            Arc::new(frames),
            Arc::new(SystemWindowInspector),
            Arc::clone(&self.model),
            settings,
        ))
    }

    pub fn qa_settings(&self) -> QaSettings {
        QaSettings {
            model: self.config.qa_model.clone(),
            max_tokens: self.config.qa_max_tokens,
        }
    }
}
