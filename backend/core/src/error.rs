use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of a single model completion call.
///
/// A response field that cannot be located is not an error: it comes back as
/// `None` on the [`Completion`](crate::Completion).
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("no provider serves model '{model}'")]
    UnknownModel { model: String },

    #[error("provider {provider} returned HTTP {status}: {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("request to provider {provider} failed: {source}")]
    Transport {
        provider: String,
        #[source]
        source: BoxError,
    },

    #[error("provider {provider} returned a body that is not JSON: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("provider {provider} has an invalid header '{name}'")]
    InvalidHeader { provider: String, name: String },
}

impl ModelError {
    /// True for the non-2xx and transport failures reported by the provider side.
    pub fn is_provider_failure(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Transport { .. })
    }
}

/// Failure of a platform capture collaborator.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("screen capture is not supported on {0}")]
    Unsupported(String),

    #[error("capture command '{command}' failed: {message}")]
    Command { command: String, message: String },

    #[error("captured image could not be processed: {0}")]
    Image(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
