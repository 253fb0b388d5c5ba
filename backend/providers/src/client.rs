use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use codebuddy_core::{
    CompletionClient, Completion, CompletionRequest, ContentPart, CredentialSource, ImageStyle,
    MessageContent, ModelError, Provider, Role, SystemPlacement,
};
use codebuddy_logging::redact_sensitive_data;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::field_path::{extract_or_null, extract_string};
use crate::registry::ProviderRegistry;

/// Upper bound on a single provider call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Completion client that talks to any provider in the registry over HTTP.
///
/// One code path serves every provider: the request shape, auth header and
/// response field locations all come from the provider descriptor.
pub struct HttpModelClient {
    http: Client,
    registry: Arc<ProviderRegistry>,
    credentials: Arc<dyn CredentialSource>,
}

impl HttpModelClient {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        credentials: Arc<dyn CredentialSource>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            registry,
            credentials,
        })
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    fn headers(&self, provider: &Provider) -> Result<HeaderMap, ModelError> {
        let invalid = |name: &str| ModelError::InvalidHeader {
            provider: provider.name.clone(),
            name: name.to_string(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        for (name, value) in &provider.extra_headers {
            let header = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid(name))?;
            let value = HeaderValue::from_str(value).map_err(|_| invalid(name))?;
            headers.insert(header, value);
        }

        // No credential means no auth header; the provider reports the failure.
        if let Some(env_key) = &provider.credential_env {
            match self.credentials.credential(env_key) {
                Some(key) => {
                    let name = &provider.auth_header;
                    let header =
                        HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid(name))?;
                    let mut value =
                        HeaderValue::from_str(&provider.auth_value(&key)).map_err(|_| invalid(name))?;
                    value.set_sensitive(true);
                    headers.insert(header, value);
                }
                None => debug!(
                    provider = %provider.name,
                    env = %env_key,
                    "Credential not set; sending request without auth header"
                ),
            }
        }

        Ok(headers)
    }
}

#[async_trait]
impl CompletionClient for HttpModelClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ModelError> {
        let provider = self.registry.resolve(&request.model)?;
        let headers = self.headers(provider)?;
        let payload = build_payload(provider, &request);
        let start = Instant::now();

        debug!(
            provider = %provider.name,
            model = %request.model,
            messages = request.messages.len(),
            "Sending completion request"
        );

        let transport = |source: reqwest::Error| ModelError::Transport {
            provider: provider.name.clone(),
            source: Box::new(source),
        };

        let response = self
            .http
            .post(provider.endpoint())
            .headers(headers)
            .json(&payload)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().await.map_err(transport)?;

        if !status.is_success() {
            let body = redact_sensitive_data(&body);
            warn!(
                provider = %provider.name,
                status = status.as_u16(),
                body = %body,
                "Provider returned an error status"
            );
            return Err(ModelError::Http {
                provider: provider.name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let raw: Value = serde_json::from_str(&body).map_err(|e| ModelError::InvalidResponse {
            provider: provider.name.clone(),
            message: e.to_string(),
        })?;

        let completion = normalize_response(provider, &raw);
        debug!(
            provider = %provider.name,
            latency_ms = start.elapsed().as_millis() as u64,
            has_content = completion.content.is_some(),
            "Completion received"
        );
        Ok(completion)
    }
}

/// Build the JSON body for `request` in the provider's wire shape.
pub fn build_payload(provider: &Provider, request: &CompletionRequest) -> Value {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    let mut top_level_system: Vec<String> = Vec::new();

    if let Some(system) = &request.system {
        match provider.system_placement {
            SystemPlacement::Message => {
                messages.push(json!({"role": "system", "content": system}));
            }
            SystemPlacement::TopLevel => top_level_system.push(system.clone()),
        }
    }

    for message in &request.messages {
        // Top-level providers reject a system role inside `messages`.
        if message.role == Role::System && provider.system_placement == SystemPlacement::TopLevel {
            if let MessageContent::Text(text) = &message.content {
                top_level_system.push(text.clone());
                continue;
            }
        }
        messages.push(json!({
            "role": message.role.as_str(),
            "content": render_content(&message.content, provider.image_style),
        }));
    }

    let mut payload = json!({
        "model": request.model,
        "messages": messages,
    });
    if let Some(max_tokens) = request.max_tokens.or(provider.default_max_tokens) {
        payload["max_tokens"] = json!(max_tokens);
    }
    if !top_level_system.is_empty() {
        payload["system"] = json!(top_level_system.join("\n\n"));
    }
    payload
}

fn render_content(content: &MessageContent, style: ImageStyle) -> Value {
    match content {
        MessageContent::Text(text) => json!(text),
        MessageContent::Parts(parts) => Value::Array(
            parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text(text) => json!({"type": "text", "text": text}),
                    ContentPart::Image { media_type, data } => match style {
                        ImageStyle::DataUrl => json!({
                            "type": "image_url",
                            "image_url": {"url": format!("data:{media_type};base64,{data}")},
                        }),
                        ImageStyle::Base64Source => json!({
                            "type": "image",
                            "source": {"type": "base64", "media_type": media_type, "data": data},
                        }),
                    },
                })
                .collect(),
        ),
    }
}

/// Pull `{content, model, usage}` out of a raw response using the provider's field paths.
pub fn normalize_response(provider: &Provider, raw: &Value) -> Completion {
    let paths = &provider.response_paths;
    let completion = Completion {
        content: extract_string(raw, &paths.content),
        model: extract_string(raw, &paths.model),
        usage: extract_or_null(raw, &paths.usage),
    };
    if completion.content.is_none() {
        warn!(
            provider = %provider.name,
            path = %paths.content,
            "Response content path did not resolve"
        );
    }
    completion
}

#[cfg(test)]
mod tests {
    use super::*;
    use codebuddy_core::ChatMessage;

    fn provider(name: &str) -> Provider {
        ProviderRegistry::builtin().get(name).cloned().unwrap()
    }

    #[test]
    fn system_message_is_prepended_for_message_placement() {
        let request = CompletionRequest::new("gpt-4o", vec![ChatMessage::user("hi")])
            .with_system("be brief")
            .with_max_tokens(10);
        let payload = build_payload(&provider("openai"), &request);

        assert_eq!(payload["messages"][0], json!({"role": "system", "content": "be brief"}));
        assert_eq!(payload["messages"][1], json!({"role": "user", "content": "hi"}));
        assert_eq!(payload["max_tokens"], json!(10));
        assert!(payload.get("system").is_none());
    }

    #[test]
    fn system_message_is_top_level_for_anthropic() {
        let request = CompletionRequest::new(
            "claude-3-5-sonnet-20241022",
            vec![ChatMessage::system("extra"), ChatMessage::user("hi")],
        )
        .with_system("be brief");
        let payload = build_payload(&provider("anthropic"), &request);

        assert_eq!(payload["system"], json!("be brief\n\nextra"));
        assert_eq!(payload["messages"].as_array().unwrap().len(), 1);
        assert_eq!(payload["messages"][0]["role"], json!("user"));
        // falls back to the provider default
        assert_eq!(payload["max_tokens"], json!(1024));
    }

    #[test]
    fn max_tokens_omitted_without_default() {
        let request = CompletionRequest::new("gpt-4o", vec![ChatMessage::user("hi")]);
        let payload = build_payload(&provider("openai"), &request);
        assert!(payload.get("max_tokens").is_none());
    }

    #[test]
    fn images_follow_provider_style() {
        let parts = vec![
            ContentPart::Text("look".into()),
            ContentPart::Image {
                media_type: "image/png".into(),
                data: "AAAA".into(),
            },
        ];
        let request = CompletionRequest::new("gpt-4o", vec![ChatMessage::user_parts(parts.clone())]);

        let openai = build_payload(&provider("openai"), &request);
        assert_eq!(
            openai["messages"][0]["content"][1]["image_url"]["url"],
            json!("data:image/png;base64,AAAA")
        );

        let anthropic = build_payload(&provider("anthropic"), &request);
        assert_eq!(
            anthropic["messages"][0]["content"][1]["source"],
            json!({"type": "base64", "media_type": "image/png", "data": "AAAA"})
        );
        assert_eq!(anthropic["messages"][0]["content"][0], json!({"type": "text", "text": "look"}));
    }

    #[test]
    fn normalizes_structurally_different_responses() {
        let openai = normalize_response(
            &provider("openai"),
            &json!({
                "model": "gpt-4o-2024-08-06",
                "choices": [{"message": {"role": "assistant", "content": "A"}}],
                "usage": {"total_tokens": 3}
            }),
        );
        assert_eq!(openai.content.as_deref(), Some("A"));
        assert_eq!(openai.model.as_deref(), Some("gpt-4o-2024-08-06"));
        assert_eq!(openai.usage, json!({"total_tokens": 3}));

        let anthropic = normalize_response(
            &provider("anthropic"),
            &json!({"content": [{"type": "text", "text": "B"}], "model": "claude"}),
        );
        assert_eq!(anthropic.content.as_deref(), Some("B"));
        assert_eq!(anthropic.usage, Value::Null);
    }
}
