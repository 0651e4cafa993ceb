//! OpenRouterProvider implementation.

use assistant_core::{
    async_trait, ChatMessage, ChatOutcome, ChatProvider, ProviderError, ToolCallRequest,
    ToolChoice, ToolSchema,
};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{
    ApiError, ChatCompletionRequest, ChatCompletionResponse, WireFunction, WireFunctionCall,
    WireMessage, WireTool, WireToolCall,
};
use crate::config::OpenRouterConfig;

/// A chat provider backed by the OpenRouter chat-completions API.
pub struct OpenRouterProvider {
    client: Client,
    config: OpenRouterConfig,
}

impl OpenRouterProvider {
    /// Create a new provider with the given configuration.
    pub fn new(config: OpenRouterConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ProviderError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        info!("OpenRouterProvider initialized with model: {}", config.model);

        Ok(Self { client, config })
    }

    /// Create a provider from environment variables.
    ///
    /// See [`OpenRouterConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, ProviderError> {
        let config = OpenRouterConfig::from_env()?;
        Self::new(config)
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenRouterConfig {
        &self.config
    }

    fn to_wire_message(message: &ChatMessage) -> WireMessage {
        let tool_calls = if message.tool_calls.is_empty() {
            None
        } else {
            Some(
                message
                    .tool_calls
                    .iter()
                    .map(|call| WireToolCall {
                        id: call.id.clone(),
                        call_type: "function".to_string(),
                        function: WireFunctionCall {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    })
                    .collect(),
            )
        };

        WireMessage {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            tool_calls,
            tool_call_id: message.tool_call_id.clone(),
        }
    }

    fn to_wire_tools(tools: &[ToolSchema]) -> Option<Vec<WireTool>> {
        if tools.is_empty() {
            return None;
        }
        Some(
            tools
                .iter()
                .map(|tool| WireTool {
                    tool_type: "function".to_string(),
                    function: WireFunction {
                        name: tool.name.clone(),
                        description: tool.description.clone(),
                        parameters: tool.parameters.clone(),
                    },
                })
                .collect(),
        )
    }
}

#[async_trait]
impl ChatProvider for OpenRouterProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSchema],
        tool_choice: ToolChoice,
    ) -> Result<ChatOutcome, ProviderError> {
        let url = format!("{}/chat/completions", self.config.api_url);

        let wire_tools = match tool_choice {
            ToolChoice::Auto => Self::to_wire_tools(tools),
            // Some routed models reject tool_choice "none" alongside a
            // tool list; omit the tools entirely
            ToolChoice::None => None,
        };
        let wire_choice = wire_tools.as_ref().map(|_| tool_choice.as_str().to_string());

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(Self::to_wire_message).collect(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            tools: wire_tools,
            tool_choice: wire_choice,
        };

        debug!("Sending request to OpenRouter: {} messages", messages.len());

        let mut builder = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json");

        if let Some(ref referer) = self.config.referer {
            builder = builder.header("HTTP-Referer", referer.clone());
        }
        if let Some(ref title) = self.config.app_title {
            builder = builder.header("X-Title", title.clone());
        }

        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // Try to parse as API error
            if let Ok(api_error) = serde_json::from_str::<ApiError>(&error_text) {
                return Err(ProviderError::Api {
                    status: status.as_u16(),
                    message: api_error.error.message,
                });
            }

            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(format!("Failed to parse response: {}", e)))?;

        let choice = completion
            .choices
            .first()
            .ok_or_else(|| ProviderError::MalformedResponse("no choices in response".to_string()))?;

        let text = choice.message.content.clone().filter(|c| !c.is_empty());
        let tool_calls: Vec<ToolCallRequest> = choice
            .message
            .tool_calls
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|call| {
                ToolCallRequest::new(
                    call.id.clone(),
                    call.function.name.clone(),
                    call.function.arguments.clone(),
                )
            })
            .collect();

        if text.is_none() && tool_calls.is_empty() {
            warn!("OpenRouter returned neither text nor tool calls");
        }

        if let Some(usage) = completion.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(ChatOutcome { text, tool_calls })
    }

    fn name(&self) -> &str {
        "OpenRouterProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_message_conversion() {
        let msg = ChatMessage::assistant_tool_calls(vec![ToolCallRequest::new(
            "call-1",
            "get_all_tasks",
            "{}",
        )]);
        let wire = OpenRouterProvider::to_wire_message(&msg);

        assert_eq!(wire.role, "assistant");
        assert!(wire.content.is_none());
        let calls = wire.tool_calls.unwrap();
        assert_eq!(calls[0].function.name, "get_all_tasks");
    }

    #[test]
    fn test_wire_tools_empty() {
        assert!(OpenRouterProvider::to_wire_tools(&[]).is_none());

        let schema = ToolSchema::new("add_task", "Add a task", json!({"type": "object"}));
        let wired = OpenRouterProvider::to_wire_tools(&[schema]).unwrap();
        assert_eq!(wired.len(), 1);
        assert_eq!(wired[0].tool_type, "function");
    }

    #[test]
    fn test_provider_construction() {
        let config = OpenRouterConfig::builder().api_key("test-key").build();
        let provider = OpenRouterProvider::new(config).unwrap();
        assert_eq!(provider.name(), "OpenRouterProvider");
    }
}
