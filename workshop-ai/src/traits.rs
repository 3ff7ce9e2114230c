use async_trait::async_trait;

/// A best-effort text generation backend. Callers must treat every error as
/// "unavailable" and carry on with a fallback.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;

    /// Same as `generate` but asks the backend for a JSON document.
    async fn generate_json(&self, prompt: &str) -> anyhow::Result<serde_json::Value> {
        let text = self.generate(prompt).await?;
        Ok(serde_json::from_str(strip_code_fence(&text))?)
    }
}

/// Models like to wrap JSON in ```json fences; peel them off.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
