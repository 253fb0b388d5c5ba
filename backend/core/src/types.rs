use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Chat messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One piece of a multi-part message.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text(String),
    /// Base64-encoded image bytes with their MIME type.
    Image { media_type: String, data: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: MessageContent::Text(text.into()),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }
}

/// Request for one chat completion.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Where this ends up on the wire depends on the provider's [`SystemPlacement`].
    pub system: Option<String>,
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            system: None,
            max_tokens: None,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Provider-independent view of a completion response.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: Option<String>,
    pub model: Option<String>,
    /// Raw usage object as the provider reported it; `Null` if absent.
    pub usage: serde_json::Value,
}

impl Completion {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            model: None,
            usage: serde_json::Value::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// Provider descriptors
// ---------------------------------------------------------------------------

/// Where a provider expects the system instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SystemPlacement {
    /// Prepended to `messages` as a `{role: system}` entry.
    #[default]
    Message,
    /// Sent as a separate top-level `system` field.
    TopLevel,
}

/// How image content parts are encoded on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageStyle {
    /// `{"type":"image_url","image_url":{"url":"data:<mime>;base64,<data>"}}`
    #[default]
    DataUrl,
    /// `{"type":"image","source":{"type":"base64","media_type":..,"data":..}}`
    Base64Source,
}

/// Dot-separated paths locating the normalized fields in a raw response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponsePaths {
    pub content: String,
    pub model: String,
    pub usage: String,
}

impl Default for ResponsePaths {
    fn default() -> Self {
        Self {
            content: "choices.0.message.content".to_string(),
            model: "model".to_string(),
            usage: "usage".to_string(),
        }
    }
}

/// Declarative description of one HTTP model provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub name: String,
    /// Environment variable holding the API key. `None` for keyless endpoints.
    #[serde(default)]
    pub credential_env: Option<String>,
    pub base_url: String,
    #[serde(default = "default_completion_path")]
    pub completion_path: String,
    #[serde(default = "default_auth_header")]
    pub auth_header: String,
    /// `{key}` is replaced with the credential.
    #[serde(default = "default_auth_template")]
    pub auth_template: String,
    #[serde(default)]
    pub system_placement: SystemPlacement,
    #[serde(default)]
    pub image_style: ImageStyle,
    #[serde(default)]
    pub response_paths: ResponsePaths,
    #[serde(default)]
    pub extra_headers: BTreeMap<String, String>,
    /// Sent when the caller gives no `max_tokens`.
    #[serde(default)]
    pub default_max_tokens: Option<u32>,
    pub models: Vec<String>,
}

fn default_completion_path() -> String {
    "/v1/chat/completions".to_string()
}

fn default_auth_header() -> String {
    "Authorization".to_string()
}

fn default_auth_template() -> String {
    "Bearer {key}".to_string()
}

impl Provider {
    pub fn serves(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }

    /// Full URL the completion request is POSTed to.
    pub fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.completion_path.starts_with('/') {
            format!("{base}{}", self.completion_path)
        } else {
            format!("{base}/{}", self.completion_path)
        }
    }

    pub fn auth_value(&self, key: &str) -> String {
        self.auth_template.replace("{key}", key)
    }
}

// ---------------------------------------------------------------------------
// Capture collaborators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    Png,
    Jpeg,
}

impl FrameFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            FrameFormat::Png => "image/png",
            FrameFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FrameFormat::Png => "png",
            FrameFormat::Jpeg => "jpg",
        }
    }
}

/// One captured screen image.
#[derive(Debug, Clone)]
pub struct Frame {
    pub bytes: Vec<u8>,
    pub format: FrameFormat,
}

/// Identity of a focused window, comparable across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowId {
    Known(String),
    /// The platform cannot tell windows apart.
    Unsupported,
}

impl WindowId {
    /// Two identities name the same window only when both are known and equal.
    pub fn same_window(&self, other: &WindowId) -> bool {
        matches!((self, other), (WindowId::Known(a), WindowId::Known(b)) if a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_descriptor_defaults() {
        let provider: Provider = serde_json::from_value(serde_json::json!({
            "name": "local",
            "baseUrl": "http://localhost:8000/",
            "models": ["tiny"]
        }))
        .unwrap();

        assert_eq!(provider.endpoint(), "http://localhost:8000/v1/chat/completions");
        assert_eq!(provider.auth_header, "Authorization");
        assert_eq!(provider.auth_value("abc"), "Bearer abc");
        assert_eq!(provider.system_placement, SystemPlacement::Message);
        assert_eq!(provider.response_paths.content, "choices.0.message.content");
        assert!(provider.serves("tiny"));
        assert!(!provider.serves("huge"));
    }

    #[test]
    fn placement_parses_kebab_case() {
        let placement: SystemPlacement = serde_json::from_str("\"top-level\"").unwrap();
        assert_eq!(placement, SystemPlacement::TopLevel);
    }

    #[test]
    fn unsupported_windows_never_match() {
        let known = WindowId::Known("42".into());
        assert!(known.same_window(&WindowId::Known("42".into())));
        assert!(!known.same_window(&WindowId::Known("7".into())));
        assert!(!WindowId::Unsupported.same_window(&WindowId::Unsupported));
    }
}
