use async_trait::async_trait;

use crate::error::{CaptureError, ModelError};
use crate::types::{Completion, CompletionRequest, Frame, WindowId};

/// Anything that can answer a chat-completion request for a named model.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Perform one completion call. No retries are attempted.
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ModelError>;
}

/// Grabs the current screen contents.
pub trait FrameSource: Send + Sync {
    fn capture_frame(&self) -> Result<Frame, CaptureError>;
}

/// Reports which window currently has focus.
pub trait WindowInspector: Send + Sync {
    /// Human-readable label, e.g. `"Code: main.rs"`.
    fn active_window_label(&self) -> String;

    /// Comparable token identifying the focused window.
    fn active_window_identity(&self) -> WindowId;
}

/// Looks up provider credentials by name. Absent means "send no auth header".
pub trait CredentialSource: Send + Sync {
    fn credential(&self, key: &str) -> Option<String>;
}
