//! `codebuddy models`: providers, their models and credential status.

use anyhow::{Context, Result};
use codebuddy_config::AppConfig;
use codebuddy_core::CredentialSource;
use codebuddy_providers::{EnvCredentials, ProviderRegistry};

use crate::terminal_output::{paint_if, render_table, supports_color, Column, GREEN, RED};

pub fn run(config: &AppConfig) -> Result<()> {
    let registry = ProviderRegistry::with_custom(
        config.custom_providers.clone(),
        config.allow_model_shadowing,
    )
    .context("Invalid provider configuration")?;

    println!("\nConfigured providers and models\n");
    let rows = rows(&registry, &EnvCredentials, config, supports_color());
    print!("{}", render_table(&columns(), &rows));
    Ok(())
}

fn columns() -> Vec<Column> {
    vec![
        Column::left("Provider"),
        Column::left("Model"),
        Column::left("Credential"),
        Column::left("Used for"),
    ]
}

fn rows(
    registry: &ProviderRegistry,
    credentials: &dyn CredentialSource,
    config: &AppConfig,
    color: bool,
) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    for provider in registry.providers() {
        let credential = match &provider.credential_env {
            None => "not required".to_string(),
            Some(key) if credentials.credential(key).is_some() => {
                paint_if(color, GREEN, &format!("{key} set"))
            }
            Some(key) => paint_if(color, RED, &format!("{key} missing")),
        };
        for model in &provider.models {
            let mut roles = Vec::new();
            if *model == config.vision_model {
                roles.push("vision");
            }
            if *model == config.qa_model {
                roles.push("questions");
            }
            rows.push(vec![
                provider.name.clone(),
                model.clone(),
                credential.clone(),
                roles.join(", "),
            ]);
        }
    }
    rows
}
