use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration for a text generation provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// "gemini" or "openai"
    pub provider_type: String,

    /// Base URL for API requests
    pub api_base: Option<String>,

    /// API key for authentication
    pub api_key: String,

    /// Default model to use with this provider
    pub default_model: String,

    /// Additional provider-specific configuration options
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl ProviderConfig {
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            provider_type: "gemini".to_string(),
            api_base: None,
            api_key: api_key.into(),
            default_model: "gemini-2.0-flash-exp".to_string(),
            options: HashMap::new(),
        }
    }
}
