pub mod error;
pub mod traits;
pub mod types;

pub use error::{CaptureError, ModelError};
pub use traits::{CompletionClient, CredentialSource, FrameSource, WindowInspector};
pub use types::{
    ChatMessage, Completion, CompletionRequest, ContentPart, Frame, FrameFormat, ImageStyle,
    MessageContent, Provider, ResponsePaths, Role, SystemPlacement, WindowId,
};
