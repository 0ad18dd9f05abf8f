use std::net::SocketAddr;

use thiserror::Error;

/// Default Azure OpenAI REST API version.
pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

/// Connection settings for one Azure OpenAI deployment.
///
/// Collaborator clients receive this explicitly; no ambient environment
/// lookups happen inside the pipeline.
#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    pub api_key: String,
    pub endpoint: String,
    pub deployment_name: String,
    pub api_version: String,
}

impl AzureOpenAiConfig {
    pub fn new(api_key: &str, endpoint: &str, deployment_name: &str, api_version: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            deployment_name: deployment_name.to_string(),
            api_version: api_version.to_string(),
        }
    }

    /// URL for one of this deployment's operations, e.g. `embeddings`
    /// or `chat/completions`.
    pub(crate) fn operation_url(&self, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}?api-version={}",
            self.endpoint, self.deployment_name, operation, self.api_version
        )
    }
}

/// Full service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Deployment used to embed passages and section queries.
    pub embedding: AzureOpenAiConfig,
    /// Chat deployment for abstractive section summaries. When absent,
    /// sections carry the raw concatenated passages.
    pub chat: Option<AzureOpenAiConfig>,
    pub bind_addr: SocketAddr,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid bind address: {0}")]
    InvalidBindAddr(String),
}

impl AppConfig {
    /// Read configuration from the environment. This is the only place
    /// environment variables are consulted; everything downstream gets an
    /// explicit config object.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = require("AZURE_OPENAI_API_KEY")?;
        let endpoint = require("AZURE_OPENAI_ENDPOINT")?;
        let api_version = std::env::var("AZURE_OPENAI_API_VERSION")
            .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string());

        let embedding_deployment = require("AZURE_OPENAI_EMBEDDING_DEPLOYMENT")?;
        let embedding =
            AzureOpenAiConfig::new(&api_key, &endpoint, &embedding_deployment, &api_version);

        let chat = std::env::var("AZURE_OPENAI_CHAT_DEPLOYMENT")
            .ok()
            .map(|d| AzureOpenAiConfig::new(&api_key, &endpoint, &d, &api_version));

        let bind_addr = std::env::var("ICFGEN_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let bind_addr = bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_addr))?;

        Ok(Self {
            embedding,
            chat,
            bind_addr,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_url_includes_deployment_and_version() {
        let config = AzureOpenAiConfig::new(
            "key",
            "https://example.openai.azure.com",
            "text-embedding-ada-002",
            "2024-02-15-preview",
        );
        assert_eq!(
            config.operation_url("embeddings"),
            "https://example.openai.azure.com/openai/deployments/text-embedding-ada-002/embeddings?api-version=2024-02-15-preview"
        );
    }

    #[test]
    fn endpoint_trailing_slash_trimmed() {
        let config = AzureOpenAiConfig::new("key", "https://example.openai.azure.com/", "d", "v");
        assert_eq!(config.endpoint, "https://example.openai.azure.com");
    }

    #[test]
    fn chat_completions_url() {
        let config = AzureOpenAiConfig::new("key", "https://e.openai.azure.com", "gpt-4o", "v1");
        assert!(config
            .operation_url("chat/completions")
            .contains("/openai/deployments/gpt-4o/chat/completions?api-version=v1"));
    }
}
