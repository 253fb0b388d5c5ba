//! Providers known out of the box.

use std::collections::BTreeMap;

use codebuddy_core::{ImageStyle, Provider, ResponsePaths, SystemPlacement};

fn openai_compatible(name: &str, credential_env: Option<&str>, base_url: &str, models: &[&str]) -> Provider {
    Provider {
        name: name.to_string(),
        credential_env: credential_env.map(str::to_string),
        base_url: base_url.to_string(),
        completion_path: "/v1/chat/completions".to_string(),
        auth_header: "Authorization".to_string(),
        auth_template: "Bearer {key}".to_string(),
        system_placement: SystemPlacement::Message,
        image_style: ImageStyle::DataUrl,
        response_paths: ResponsePaths::default(),
        extra_headers: BTreeMap::new(),
        default_max_tokens: None,
        models: models.iter().map(|m| m.to_string()).collect(),
    }
}

fn anthropic() -> Provider {
    Provider {
        name: "anthropic".to_string(),
        credential_env: Some("ANTHROPIC_API_KEY".to_string()),
        base_url: "https://api.anthropic.com".to_string(),
        completion_path: "/v1/messages".to_string(),
        auth_header: "x-api-key".to_string(),
        auth_template: "{key}".to_string(),
        system_placement: SystemPlacement::TopLevel,
        image_style: ImageStyle::Base64Source,
        response_paths: ResponsePaths {
            content: "content.0.text".to_string(),
            model: "model".to_string(),
            usage: "usage".to_string(),
        },
        extra_headers: BTreeMap::from([(
            "anthropic-version".to_string(),
            "2023-06-01".to_string(),
        )]),
        // The messages API rejects requests without max_tokens.
        default_max_tokens: Some(1024),
        models: [
            "claude-3-5-sonnet-20241022",
            "claude-3-5-haiku-20241022",
            "claude-3-opus-20240229",
            "claude-3-haiku-20240307",
        ]
        .iter()
        .map(|m| m.to_string())
        .collect(),
    }
}

/// The built-in provider table, in resolution order.
pub fn builtin_providers() -> Vec<Provider> {
    vec![
        openai_compatible(
            "openai",
            Some("OPENAI_API_KEY"),
            "https://api.openai.com",
            &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-4.1", "gpt-4.1-mini"],
        ),
        anthropic(),
        openai_compatible(
            "groq",
            Some("GROQ_API_KEY"),
            "https://api.groq.com/openai",
            &[
                "llama-3.2-90b-vision-preview",
                "llama-3.2-11b-vision-preview",
                "llama-3.1-70b-versatile",
            ],
        ),
        openai_compatible(
            "openrouter",
            Some("OPENROUTER_API_KEY"),
            "https://openrouter.ai/api",
            &["openai/gpt-4o", "anthropic/claude-3.5-sonnet", "google/gemini-flash-1.5"],
        ),
        openai_compatible(
            "ollama",
            None,
            "http://localhost:11434",
            &["llama3.2-vision", "llava", "llama3.1"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_models_are_disjoint() {
        let mut seen = HashSet::new();
        for provider in builtin_providers() {
            for model in &provider.models {
                assert!(seen.insert(model.clone()), "{model} listed twice");
            }
        }
    }

    #[test]
    fn anthropic_uses_top_level_system() {
        let anthropic = builtin_providers()
            .into_iter()
            .find(|p| p.name == "anthropic")
            .unwrap();
        assert_eq!(anthropic.system_placement, SystemPlacement::TopLevel);
        assert_eq!(anthropic.endpoint(), "https://api.anthropic.com/v1/messages");
        assert_eq!(anthropic.auth_value("k"), "k");
    }
}
