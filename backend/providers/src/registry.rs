use std::collections::HashSet;

use codebuddy_core::{ModelError, Provider};
use thiserror::Error;
use tracing::warn;

use crate::builtin::builtin_providers;

/// Rejected provider table.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("model '{model}' is served by both '{first}' and '{second}'")]
    ModelCollision {
        model: String,
        first: String,
        second: String,
    },

    #[error("provider '{0}' is defined more than once")]
    DuplicateProvider(String),
}

/// Immutable table of providers, resolved by model name.
///
/// Resolution walks providers in order and the first one listing the model
/// wins. Built-ins always come before custom providers.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Provider>,
}

impl ProviderRegistry {
    /// Wrap a provider list as-is, without collision checks.
    pub fn new(providers: Vec<Provider>) -> Self {
        Self { providers }
    }

    pub fn builtin() -> Self {
        Self::new(builtin_providers())
    }

    /// Built-ins followed by `custom`.
    ///
    /// Unless `allow_shadowing` is set, a provider name or model name that
    /// appears twice is a configuration error. With shadowing allowed the
    /// collision is logged and the earlier provider keeps the model.
    pub fn with_custom(custom: Vec<Provider>, allow_shadowing: bool) -> Result<Self, RegistryError> {
        let mut providers = builtin_providers();
        providers.extend(custom);

        if let Err(err) = check_disjoint(&providers) {
            if !allow_shadowing {
                return Err(err);
            }
            warn!(error = %err, "Provider collision; earlier definition wins");
        }

        Ok(Self::new(providers))
    }

    /// Find the provider serving `model`.
    pub fn resolve(&self, model: &str) -> Result<&Provider, ModelError> {
        self.providers
            .iter()
            .find(|p| p.serves(model))
            .ok_or_else(|| ModelError::UnknownModel {
                model: model.to_string(),
            })
    }

    pub fn get(&self, name: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.name == name)
    }

    pub fn providers(&self) -> &[Provider] {
        &self.providers
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn check_disjoint(providers: &[Provider]) -> Result<(), RegistryError> {
    let mut names = HashSet::new();
    for provider in providers {
        if !names.insert(provider.name.as_str()) {
            return Err(RegistryError::DuplicateProvider(provider.name.clone()));
        }
    }

    for (i, provider) in providers.iter().enumerate() {
        for model in &provider.models {
            if let Some(first) = providers[..i].iter().find(|p| p.serves(model)) {
                return Err(RegistryError::ModelCollision {
                    model: model.clone(),
                    first: first.name.clone(),
                    second: provider.name.clone(),
                });
            }
        }
    }
    Ok(())
}
