use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::models::ProviderConfig;
use crate::traits::TextGenerator;

/// OpenAI-compatible chat completion provider
pub struct OpenAIProvider {
    config: ProviderConfig,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let client = Client::new();
        Self { config, client }
    }
}

#[async_trait]
impl TextGenerator for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let api_base = self.config.api_base.clone().unwrap_or_else(|| {
            "https://api.openai.com/v1".to_string()
        });

        let mut messages = Vec::new();
        if let Some(system_prompt) = self.config.options.get("system_prompt") {
            messages.push(json!({ "role": "system", "content": system_prompt }));
        }
        messages.push(json!({ "role": "user", "content": prompt }));

        tracing::debug!("Making API call to {}/chat/completions", api_base);
        let response = self.client
            .post(format!("{}/chat/completions", api_base))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&json!({
                "model": self.config.default_model,
                "messages": messages,
                "max_tokens": 300,
                "temperature": 0.7,
            }))
            .send()
            .await?
            .error_for_status()?;

        let data = response.json::<serde_json::Value>().await?;
        let text = data["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format"))?
            .trim()
            .to_string();

        if text.is_empty() {
            return Err(anyhow::anyhow!("Empty completion"));
        }
        Ok(text)
    }
}

/// Google Gemini `generateContent` provider
pub struct GeminiProvider {
    config: ProviderConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        let client = Client::new();
        Self { config, client }
    }

    async fn call(&self, prompt: &str, json_mode: bool) -> anyhow::Result<String> {
        let api_base = self.config.api_base.clone().unwrap_or_else(|| {
            "https://generativelanguage.googleapis.com/v1beta".to_string()
        });

        let mut body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });
        if json_mode {
            body["generationConfig"] = json!({ "responseMimeType": "application/json" });
        }

        tracing::debug!("Making API call to {}/models/{}:generateContent", api_base, self.config.default_model);
        let response = self.client
            .post(format!("{}/models/{}:generateContent", api_base, self.config.default_model))
            .query(&[("key", self.config.api_key.as_str())])
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let data = response.json::<serde_json::Value>().await?;
        let parts = data["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| anyhow::anyhow!("Invalid response format"))?;

        let text: String = parts
            .iter()
            .filter_map(|p| p["text"].as_str())
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(anyhow::anyhow!("Empty completion"));
        }
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        self.call(prompt, false).await
    }

    async fn generate_json(&self, prompt: &str) -> anyhow::Result<serde_json::Value> {
        let text = self.call(prompt, true).await?;
        Ok(serde_json::from_str(crate::traits::strip_code_fence(&text))?)
    }
}

/// Builds the configured provider. An empty key means "no provider".
pub fn build_provider(config: &ProviderConfig) -> Option<Arc<dyn TextGenerator>> {
    if config.api_key.trim().is_empty() {
        return None;
    }
    match config.provider_type.to_ascii_lowercase().as_str() {
        "gemini" => Some(Arc::new(GeminiProvider::new(config.clone()))),
        "openai" => Some(Arc::new(OpenAIProvider::new(config.clone()))),
        other => {
            tracing::warn!("Unknown text provider '{}'; encouragement will use fallbacks", other);
            None
        }
    }
}
