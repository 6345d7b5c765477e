pub mod gemini;
pub mod openai;

pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::error::{KeyCopError, Result};
use crate::core::traits::KeyProvider;

/// Registration table from uppercased credential-type identifier to its
/// provider. Built once at startup from an explicit list; read-only
/// afterwards.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn KeyProvider>>,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<Arc<dyn KeyProvider>>) -> Self {
        let providers = providers
            .into_iter()
            .map(|p| (p.key_type().to_uppercase(), p))
            .collect();
        Self { providers }
    }

    /// The providers this build ships with.
    pub fn with_default_providers() -> Self {
        Self::new(vec![
            Arc::new(OpenAIProvider::new()),
            Arc::new(GeminiProvider::new()),
        ])
    }

    /// Resolve a credential type. An unregistered type is a configuration
    /// error, not a transient failure.
    pub fn resolve(&self, key_type: &str) -> Result<Arc<dyn KeyProvider>> {
        self.providers
            .get(&key_type.to_uppercase())
            .cloned()
            .ok_or_else(|| KeyCopError::UnsupportedProvider(key_type.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn KeyProvider>> {
        self.providers.values()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
