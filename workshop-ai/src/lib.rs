pub mod models;
pub mod prompts;
pub mod provider;
pub mod traits;

// Re-export public APIs
pub use models::ProviderConfig;
pub use provider::{build_provider, GeminiProvider, OpenAIProvider};
pub use traits::TextGenerator;
