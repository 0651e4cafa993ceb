//! Configuration for OpenRouterProvider.

use assistant_core::ProviderError;
use std::env;

/// Default API URL.
pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1";

/// Default model.
pub const DEFAULT_MODEL: &str = "google/gemini-2.0-flash-001";

/// Configuration for OpenRouterProvider.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// OpenRouter API URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// Maximum tokens for response.
    pub max_tokens: Option<u32>,

    /// Temperature for generation (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// HTTP-Referer header value for OpenRouter attribution.
    pub referer: Option<String>,

    /// X-Title header value for OpenRouter attribution.
    pub app_title: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: Some(1024),
            temperature: Some(0.7),
            referer: None,
            app_title: None,
            timeout_secs: 60,
        }
    }
}

impl OpenRouterConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `OPENROUTER_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `OPENROUTER_API_URL` - API URL (default: https://openrouter.ai/api/v1)
    /// - `OPENROUTER_MODEL` - Model name (default: google/gemini-2.0-flash-001)
    /// - `OPENROUTER_MAX_TOKENS` - Max tokens (default: 1024)
    /// - `OPENROUTER_TEMPERATURE` - Temperature (default: 0.7)
    /// - `OPENROUTER_HTTP_REFERER` - HTTP-Referer attribution header
    /// - `OPENROUTER_APP_TITLE` - X-Title attribution header
    /// - `OPENROUTER_TIMEOUT_SECS` - Request timeout (default: 60)
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = env::var("OPENROUTER_API_KEY")
            .map_err(|_| ProviderError::Configuration("OPENROUTER_API_KEY not set".to_string()))?;

        let api_url =
            env::var("OPENROUTER_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let model = env::var("OPENROUTER_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let max_tokens = env::var("OPENROUTER_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(Some(1024));

        let temperature = env::var("OPENROUTER_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(Some(0.7));

        let referer = env::var("OPENROUTER_HTTP_REFERER").ok();
        let app_title = env::var("OPENROUTER_APP_TITLE").ok();

        let timeout_secs = env::var("OPENROUTER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Ok(Self {
            api_url,
            api_key,
            model,
            max_tokens,
            temperature,
            referer,
            app_title,
            timeout_secs,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> OpenRouterConfigBuilder {
        OpenRouterConfigBuilder::default()
    }
}

/// Builder for OpenRouterConfig.
#[derive(Debug, Default)]
pub struct OpenRouterConfigBuilder {
    config: OpenRouterConfig,
}

impl OpenRouterConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the max tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    /// Set the temperature.
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.temperature = Some(temp);
        self
    }

    /// Set the HTTP-Referer attribution header.
    pub fn referer(mut self, referer: impl Into<String>) -> Self {
        self.config.referer = Some(referer.into());
        self
    }

    /// Set the X-Title attribution header.
    pub fn app_title(mut self, title: impl Into<String>) -> Self {
        self.config.app_title = Some(title.into());
        self
    }

    /// Set the request timeout in seconds.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OpenRouterConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenRouterConfig::default();

        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.api_key.is_empty());
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, Some(1024));
        assert_eq!(config.temperature, Some(0.7));
        assert!(config.referer.is_none());
        assert!(config.app_title.is_none());
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn test_builder_all_options() {
        let config = OpenRouterConfig::builder()
            .api_key("my-key")
            .api_url("https://custom.api.com")
            .model("anthropic/claude-3.5-sonnet")
            .max_tokens(512)
            .temperature(0.5)
            .referer("https://example.com")
            .app_title("Task Assistant")
            .timeout_secs(30)
            .build();

        assert_eq!(config.api_key, "my-key");
        assert_eq!(config.api_url, "https://custom.api.com");
        assert_eq!(config.model, "anthropic/claude-3.5-sonnet");
        assert_eq!(config.max_tokens, Some(512));
        assert_eq!(config.temperature, Some(0.5));
        assert_eq!(config.referer.as_deref(), Some("https://example.com"));
        assert_eq!(config.app_title.as_deref(), Some("Task Assistant"));
        assert_eq!(config.timeout_secs, 30);
    }

    // Environment-based tests are combined into a single test to avoid
    // race conditions when tests run in parallel (env vars are process-global).
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_all_openrouter_vars() {
            std::env::remove_var("OPENROUTER_API_KEY");
            std::env::remove_var("OPENROUTER_API_URL");
            std::env::remove_var("OPENROUTER_MODEL");
            std::env::remove_var("OPENROUTER_MAX_TOKENS");
            std::env::remove_var("OPENROUTER_TEMPERATURE");
            std::env::remove_var("OPENROUTER_HTTP_REFERER");
            std::env::remove_var("OPENROUTER_APP_TITLE");
            std::env::remove_var("OPENROUTER_TIMEOUT_SECS");
        }

        // Scenario 1: Missing API key should error
        clear_all_openrouter_vars();
        let result = OpenRouterConfig::from_env();
        assert!(result.is_err());
        match result.unwrap_err() {
            ProviderError::Configuration(msg) => {
                assert!(msg.contains("OPENROUTER_API_KEY"));
            }
            _ => panic!("Expected Configuration error"),
        }

        // Scenario 2: Only API key set, defaults used
        clear_all_openrouter_vars();
        std::env::set_var("OPENROUTER_API_KEY", "test-env-key");

        let config = OpenRouterConfig::from_env().unwrap();
        assert_eq!(config.api_key, "test-env-key");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, Some(1024));
        assert_eq!(config.temperature, Some(0.7));

        // Scenario 3: All vars set
        clear_all_openrouter_vars();
        std::env::set_var("OPENROUTER_API_KEY", "full-test-key");
        std::env::set_var("OPENROUTER_API_URL", "https://test.api.com");
        std::env::set_var("OPENROUTER_MODEL", "openai/gpt-4o-mini");
        std::env::set_var("OPENROUTER_MAX_TOKENS", "2048");
        std::env::set_var("OPENROUTER_TEMPERATURE", "0.9");
        std::env::set_var("OPENROUTER_HTTP_REFERER", "https://tasks.example.com");
        std::env::set_var("OPENROUTER_APP_TITLE", "Tasks");
        std::env::set_var("OPENROUTER_TIMEOUT_SECS", "15");

        let config = OpenRouterConfig::from_env().unwrap();
        assert_eq!(config.api_key, "full-test-key");
        assert_eq!(config.api_url, "https://test.api.com");
        assert_eq!(config.model, "openai/gpt-4o-mini");
        assert_eq!(config.max_tokens, Some(2048));
        assert_eq!(config.temperature, Some(0.9));
        assert_eq!(config.referer.as_deref(), Some("https://tasks.example.com"));
        assert_eq!(config.app_title.as_deref(), Some("Tasks"));
        assert_eq!(config.timeout_secs, 15);

        // Cleanup
        clear_all_openrouter_vars();
    }
}
